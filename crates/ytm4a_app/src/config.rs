use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ytm4a_engine::ProcessorSettings;

use crate::cli::Cli;

pub const DEFAULT_STORE_FILENAME: &str = "ytm4a_storage.json";

/// Contents of the optional `ytm4a.ron` file. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store_path: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_response_bytes: Option<u64>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

/// A missing file is the default configuration, not an error.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Command line over configuration file over built-in defaults.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub store_path: PathBuf,
    pub processor: ProcessorSettings,
    pub log_file: Option<PathBuf>,
}

impl ResolvedSettings {
    pub fn resolve(cli: &Cli, config: &AppConfig) -> Self {
        let defaults = ProcessorSettings::default();
        let store_path = cli
            .store
            .clone()
            .or_else(|| config.store_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILENAME));
        let processor = ProcessorSettings {
            endpoint: cli
                .endpoint
                .clone()
                .or_else(|| config.endpoint.clone())
                .unwrap_or(defaults.endpoint),
            connect_timeout: config.connect_timeout_secs.map(Duration::from_secs),
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
            max_response_bytes: config
                .max_response_bytes
                .unwrap_or(defaults.max_response_bytes),
        };
        Self {
            store_path,
            processor,
            log_file: config.log_file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = load_config(&temp.path().join("ytm4a.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_fills_remaining_fields_with_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ytm4a.ron");
        fs::write(
            &path,
            r#"(endpoint: Some("http://10.0.0.5:5555/process"), request_timeout_secs: Some(900))"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("http://10.0.0.5:5555/process"));
        assert_eq!(config.request_timeout_secs, Some(900));
        assert_eq!(config.store_path, None);
    }

    #[test]
    fn malformed_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ytm4a.ron");
        fs::write(&path, "(endpoint: 42").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn command_line_overrides_file() {
        let cli = Cli::try_parse_from([
            "ytm4a",
            "--endpoint",
            "http://cli/process",
            "--store",
            "cli.json",
            "list",
        ])
        .unwrap();
        let config = AppConfig {
            store_path: Some(PathBuf::from("file.json")),
            endpoint: Some("http://file/process".to_string()),
            connect_timeout_secs: Some(3),
            ..AppConfig::default()
        };

        let settings = ResolvedSettings::resolve(&cli, &config);
        assert_eq!(settings.store_path, PathBuf::from("cli.json"));
        assert_eq!(settings.processor.endpoint, "http://cli/process");
        assert_eq!(settings.processor.connect_timeout, Some(Duration::from_secs(3)));
        assert_eq!(settings.processor.request_timeout, None);
    }
}
