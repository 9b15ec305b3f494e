use crate::error::ConfigError;
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "todo", version, about = "Terminal client for a todo REST service")]
pub struct Config {
    /// Root URL of the todo service
    #[arg(long, env = "TODO_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Log file (defaults to todo-client.log in the temp directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.api_url.clone(),
            reason,
        };
        let url = Url::parse(&self.api_url).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{}'", other))),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("todo-client.log"))
    }
}
