use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// SQLite database maintained by the collector.
    Sqlite { path: String },
    /// JSON export with `projects`, `contributors` and `snapshots` arrays.
    Json { path: PathBuf },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    /// Where the digest command writes its JSON report, if anywhere.
    #[serde(default)]
    pub report_path: Option<PathBuf>,
    #[serde(default = "default_limit")]
    pub people_limit: usize,
    #[serde(default = "default_limit")]
    pub corporate_limit: usize,
    #[serde(default = "default_min_projects")]
    pub min_projects: usize,
}

fn default_limit() -> usize {
    50
}

fn default_min_projects() -> usize {
    1
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
