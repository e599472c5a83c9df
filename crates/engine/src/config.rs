//! Engine configuration.
//!
//! # Example
//!
//! ```
//! use linkfind_engine::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     parallel = false
//!     max_relationship_depth = 4
//!     "#,
//! )
//! .unwrap();
//!
//! assert!(!config.parallel);
//! assert_eq!(config.max_concurrency, 8);
//! assert_eq!(config.max_relationship_depth, 4);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning for [`SearchEngine`](crate::SearchEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Run top-level (item, class) units concurrently.
    pub parallel: bool,

    /// Maximum number of units running at once in parallel mode.
    pub max_concurrency: usize,

    /// Deepest relationship tree a request may configure.
    pub max_relationship_depth: usize,

    /// Capacity of the progress event channel.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_concurrency: 8,
            max_relationship_depth: 16,
            event_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// The default configuration with sequential fan-out.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Default::default()
        }
    }

    /// Parses TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a `.toml` or `.json` file (TOML for any other extension).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                message: "max_concurrency must be at least 1".to_string(),
            });
        }
        if self.max_relationship_depth == 0 {
            return Err(ConfigError::Invalid {
                message: "max_relationship_depth must be at least 1".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid {
                message: "event_capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.parallel);
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.max_relationship_depth, 16);
        assert_eq!(config.event_capacity, 256);
        assert!(config.validate().is_ok());
        assert!(!EngineConfig::sequential().parallel);
    }

    #[test]
    fn test_json_with_partial_fields() {
        let config = EngineConfig::from_json_str(r#"{"max_concurrency": 2}"#).unwrap();
        assert_eq!(config.max_concurrency, 2);
        assert!(config.parallel);
    }

    #[test]
    fn test_out_of_range_is_invalid() {
        let err = EngineConfig::from_toml_str("max_concurrency = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_parse_error() {
        let err = EngineConfig::from_toml_str("parallel = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("engine.toml");
        let mut file = std::fs::File::create(&toml_path).unwrap();
        writeln!(file, "parallel = false").unwrap();
        assert!(!EngineConfig::load(&toml_path).unwrap().parallel);

        let json_path = dir.path().join("engine.json");
        std::fs::write(&json_path, r#"{"event_capacity": 4}"#).unwrap();
        assert_eq!(EngineConfig::load(&json_path).unwrap().event_capacity, 4);

        let missing = EngineConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
