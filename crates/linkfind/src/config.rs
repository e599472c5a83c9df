//! Command-line configuration.
//!
//! Every option can also be given through the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LINKFIND_SCHEMA` | (required) | Schema document (JSON) |
//! | `LINKFIND_REQUEST` | (required) | Search request document (JSON) |
//! | `LINKFIND_KEYWORD` | | Keyword overriding the request's |
//! | `LINKFIND_SEQUENTIAL` | false | Run items one after another |
//! | `LINKFIND_MAX_CONCURRENCY` | | Concurrent items in parallel mode |
//! | `LINKFIND_ENGINE_CONFIG` | | Engine configuration file (TOML or JSON) |
//! | `LINKFIND_LOG_LEVEL` | warn | Log level |

use std::path::PathBuf;

use clap::Parser;
use linkfind_engine::EngineConfig;
use linkfind_engine::error::ConfigError;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Command-line configuration for `linkfind`.
#[derive(Debug, Clone, Parser)]
#[command(name = "linkfind")]
#[command(about = "Keyword search over a relationship graph of tables and layers")]
pub struct CliConfig {
    /// Schema document (JSON).
    #[arg(short, long, env = "LINKFIND_SCHEMA")]
    pub schema: PathBuf,

    /// Search request document (JSON).
    #[arg(short, long, env = "LINKFIND_REQUEST")]
    pub request: PathBuf,

    /// Keyword overriding the one in the request.
    #[arg(short, long, env = "LINKFIND_KEYWORD")]
    pub keyword: Option<String>,

    /// Run items one after another instead of concurrently.
    #[arg(long, env = "LINKFIND_SEQUENTIAL")]
    pub sequential: bool,

    /// Maximum number of items searched concurrently.
    #[arg(long, env = "LINKFIND_MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Engine configuration file (TOML or JSON).
    #[arg(long, env = "LINKFIND_ENGINE_CONFIG")]
    pub engine_config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "LINKFIND_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl CliConfig {
    /// Builds the engine configuration: the configuration file if one is
    /// given, then the command-line overrides.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let mut config = match &self.engine_config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };

        if self.sequential {
            config.parallel = false;
        }
        if let Some(max_concurrency) = self.max_concurrency {
            config.max_concurrency = max_concurrency;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.schema.is_file() {
            errors.push(format!("Schema file {} does not exist", self.schema.display()));
        }

        if !self.request.is_file() {
            errors.push(format!("Request file {} does not exist", self.request.display()));
        }

        if let Some(path) = &self.engine_config {
            if !path.is_file() {
                errors.push(format!("Engine config file {} does not exist", path.display()));
            }
        }

        if self.max_concurrency == Some(0) {
            errors.push("Max concurrency cannot be 0".to_string());
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!("Unknown log level '{}'", self.log_level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let config = CliConfig::try_parse_from([
            "linkfind",
            "--schema",
            "schema.json",
            "--request",
            "request.json",
            "--keyword",
            "X1",
            "--sequential",
            "--max-concurrency",
            "3",
        ])
        .unwrap();

        assert_eq!(config.schema, PathBuf::from("schema.json"));
        assert_eq!(config.keyword.as_deref(), Some("X1"));
        assert!(config.sequential);
        assert_eq!(config.log_level, "warn");

        let engine = config.engine_config().unwrap();
        assert!(!engine.parallel);
        assert_eq!(engine.max_concurrency, 3);
    }

    #[test]
    fn test_schema_and_request_are_required() {
        assert!(CliConfig::try_parse_from(["linkfind", "--schema", "s.json"]).is_err());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let config = CliConfig::try_parse_from([
            "linkfind",
            "--schema",
            "/nonexistent/schema.json",
            "--request",
            "/nonexistent/request.json",
            "--max-concurrency",
            "0",
            "--log-level",
            "loud",
        ])
        .unwrap();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("log level")));
    }

    #[test]
    fn test_validate_accepts_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.json");
        let request = dir.path().join("request.json");
        std::fs::write(&schema, "{}").unwrap();
        std::fs::write(&request, "{}").unwrap();

        let config = CliConfig::try_parse_from([
            "linkfind".into(),
            "--schema".into(),
            schema.into_os_string(),
            "--request".into(),
            request.into_os_string(),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }
}
