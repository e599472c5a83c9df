//! Error types for the search engine.
//!
//! Only two kinds of failure reach a caller: invalid input (the request or
//! configuration cannot be searched) and collaborator failures (the schema
//! graph could not scan or fetch rows). Schema resolution misses, threshold
//! stops and cancellation are not errors; they end in a valid, possibly
//! partial, response.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid request or inventory
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Schema graph (data source) failures
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised when a request cannot be searched as given.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A top-level item has neither a name nor a model name to resolve by.
    #[error("item #{index} in package '{package}' has no name")]
    MissingItemName { package: String, index: usize },

    /// A relationship spec has an empty relationship name.
    #[error("relationship under '{parent}' has no relationship name")]
    MissingRelationshipName { parent: String },

    /// A relationship tree is deeper than the configured limit.
    #[error("relationship tree of '{item}' is {depth} levels deep, maximum is {max}")]
    RelationshipTooDeep {
        item: String,
        depth: usize,
        max: usize,
    },

    /// The search timeout is zero.
    #[error("search timeout must be greater than zero")]
    ZeroTimeout,

    /// The persisted request document could not be read.
    #[error("malformed search request: {message}")]
    MalformedRequest { message: String },
}

/// Errors originating from the schema graph collaborator.
#[derive(Error, Debug)]
pub enum BackendError {
    /// A class referenced by the caller does not exist in the data source.
    #[error("unknown class '{class}' in {backend_name}")]
    UnknownClass { backend_name: String, class: String },

    /// Scanning a class for matching rows failed.
    #[error("scan of '{class}' failed: {message}")]
    ScanFailed { class: String, message: String },

    /// Fetching related rows through a relationship failed.
    #[error("fetching rows related to {class}/{object_id} through '{relationship}' failed: {message}")]
    RelatedFetchFailed {
        class: String,
        object_id: i64,
        relationship: String,
        message: String,
    },

    /// A filter cannot be evaluated by this data source.
    #[error("filter cannot be evaluated: {message}")]
    InvalidFilter { message: String },

    /// A schema document is structurally invalid.
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Errors related to engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {message}")]
    Read { path: String, message: String },

    /// The configuration text could not be parsed.
    #[error("failed to parse configuration: {message}")]
    Parse { message: String },

    /// A configuration value is out of range.
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// Implement conversions from common error types

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Internal {
            backend_name: "unknown".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse {
            message: err.to_string(),
        }
    }
}
