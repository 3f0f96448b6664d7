use eco_insights::commands::{handle_command, parse_command, CommandError, HELP};
use eco_insights::config::{load_config, AppConfig, SourceConfig};
use eco_insights::insights::InsightsService;
use eco_insights::storage::{InsightsSource, MemorySource, SqliteStorage};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

const DEFAULT_CONFIG: &str = "config.json";

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays clean JSON
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::var("ECO_INSIGHTS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();

    let result = match &config.source {
        SourceConfig::Sqlite { path } => {
            info!("Opening SQLite source: {}", path);
            match SqliteStorage::new(path) {
                Ok(storage) => run(Arc::new(Mutex::new(storage)), &args, &config).await,
                Err(e) => {
                    error!("Failed to open storage: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        SourceConfig::Json { path } => {
            info!("Loading JSON export: {}", path.display());
            match MemorySource::load(path) {
                Ok(source) => run(source, &args, &config).await,
                Err(e) => {
                    error!("Failed to load dataset: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(CommandError::Usage(msg)) => {
            eprintln!("{}\n\n{}", msg, HELP);
            ExitCode::from(2)
        }
        Err(e @ CommandError::NotFound(_)) => {
            error!("{}", e);
            ExitCode::from(4)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run<S: InsightsSource>(source: S, args: &[String], config: &AppConfig) -> Result<String, CommandError> {
    let command = parse_command(args, config)?;
    let service = InsightsService::new(source);
    handle_command(&command, &service, config).await
}
