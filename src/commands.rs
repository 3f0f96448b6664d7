// commands.rs

use crate::config::AppConfig;
use crate::insights::InsightsService;
use crate::model::{InfluenceType, InsightsError, MomentumLevel};
use crate::storage::InsightsSource;
use serde::Serialize;
use std::str::FromStr;
use tracing::info;

pub const MAX_LIMIT: usize = 200;

pub const HELP: &str = "Available commands:
  trends [momentum]              all active projects by velocity score
  trend <project_id>             one project's trend
  people [type] [limit]          key people by influence score
  person <github_handle>         one contributor's merged profile
  corporate [min_projects] [limit]
                                 companies by strategic score
  company <name>                 one company (case-insensitive)
  digest                         trends, people and corporate in one report";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Trends { momentum: Option<MomentumLevel> },
    Trend { project_id: i64 },
    People { influence_type: Option<InfluenceType>, limit: usize },
    Person { github_handle: String },
    Corporate { min_projects: usize, limit: usize },
    Company { name: String },
    Digest,
    Help,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),
    #[error("invalid {name}: {value}")]
    InvalidArgument { name: &'static str, value: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Insights(InsightsError),
    #[error("cannot render output: {0}")]
    Render(#[from] serde_json::Error),
    #[error("cannot write report: {0}")]
    Report(#[from] std::io::Error),
}

impl From<InsightsError> for CommandError {
    fn from(err: InsightsError) -> Self {
        match err {
            InsightsError::NotFound(what) => CommandError::NotFound(what),
            other => CommandError::Insights(other),
        }
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, CommandError> {
    raw.parse().map_err(|_| CommandError::InvalidArgument {
        name,
        value: raw.to_string(),
    })
}

fn parse_limit(raw: Option<&str>, default: usize) -> Result<usize, CommandError> {
    let limit = match raw {
        Some(raw) => parse_value("limit", raw)?,
        None => default,
    };
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(CommandError::InvalidArgument { name: "limit", value: limit.to_string() })
    }
}

fn parse_min_projects(raw: Option<&str>, default: usize) -> Result<usize, CommandError> {
    let min = match raw {
        Some(raw) => parse_value("min_projects", raw)?,
        None => default,
    };
    if min >= 1 {
        Ok(min)
    } else {
        Err(CommandError::InvalidArgument { name: "min_projects", value: min.to_string() })
    }
}

/// Parses a command line such as `people bridge 20`. A leading `/` is accepted.
pub fn parse_command(args: &[String], config: &AppConfig) -> Result<Command, CommandError> {
    let mut words = args.iter().map(String::as_str);
    let Some(name) = words.next() else {
        return Ok(Command::Digest);
    };
    let rest: Vec<&str> = words.collect();
    let arg = |i: usize| rest.get(i).copied();

    let command = match name.trim_start_matches('/') {
        "trends" => Command::Trends {
            momentum: arg(0).map(|m| parse_value("momentum", m)).transpose()?,
        },
        "trend" => {
            let raw = arg(0).ok_or_else(|| CommandError::Usage("trend needs a project id".into()))?;
            Command::Trend { project_id: parse_value("project id", raw)? }
        }
        "people" => {
            // The type is optional, so a lone number is the limit.
            let (influence_type, limit_arg) = match arg(0) {
                Some(first) if first.parse::<usize>().is_ok() => (None, Some(first)),
                Some(first) => (Some(parse_value("influence type", first)?), arg(1)),
                None => (None, None),
            };
            Command::People {
                influence_type,
                limit: parse_limit(limit_arg, config.people_limit)?,
            }
        }
        "person" => Command::Person {
            github_handle: arg(0)
                .ok_or_else(|| CommandError::Usage("person needs a github handle".into()))?
                .to_string(),
        },
        "corporate" => Command::Corporate {
            min_projects: parse_min_projects(arg(0), config.min_projects)?,
            limit: parse_limit(arg(1), config.corporate_limit)?,
        },
        "company" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("company needs a name".into()));
            }
            Command::Company { name: rest.join(" ") }
        }
        "digest" => Command::Digest,
        "help" => Command::Help,
        other => return Err(CommandError::Usage(format!("unknown command: {}", other))),
    };
    Ok(command)
}

fn render<T: Serialize>(value: &T) -> Result<String, CommandError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Runs a command and returns its JSON output.
pub async fn handle_command<S: InsightsSource>(
    command: &Command,
    service: &InsightsService<S>,
    config: &AppConfig,
) -> Result<String, CommandError> {
    info!("Handling command: {:?}", command);
    match command {
        Command::Trends { momentum } => render(&service.trends(*momentum).await?),
        Command::Trend { project_id } => render(&service.trend(*project_id).await?),
        Command::People { influence_type, limit } => render(&service.people(*influence_type, *limit).await?),
        Command::Person { github_handle } => render(&service.person(github_handle).await?),
        Command::Corporate { min_projects, limit } => render(&service.corporate(*min_projects, *limit).await?),
        Command::Company { name } => render(&service.company(name).await?),
        Command::Digest => {
            let digest = service
                .digest(config.people_limit, config.min_projects, config.corporate_limit)
                .await?;
            let output = render(&digest)?;
            if let Some(path) = &config.report_path {
                if let Some(folder) = path.parent() {
                    std::fs::create_dir_all(folder)?;
                }
                std::fs::write(path, &output)?;
                info!("Saved digest report: {}", path.display());
            }
            Ok(output)
        }
        Command::Help => Ok(HELP.to_string()),
    }
}
