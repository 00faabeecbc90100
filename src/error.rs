use crate::format::Format;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for logshape
#[derive(Error, Debug)]
pub enum LogshapeError {
    /// Caller handed us something we cannot build from (e.g. an empty cluster)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A log's chunk count disagrees with the format's segment count
    #[error("Structural mismatch: expected {expected} chunks, got {actual}")]
    StructuralMismatch { expected: usize, actual: usize },

    /// Format construction stopped part way through the cluster.
    /// The partially merged format is kept so the caller can decide what to do with it.
    #[error("Format construction failed at log {log_index}: {source}")]
    IncompleteFormat {
        log_index: usize,
        #[source]
        source: Box<LogshapeError>,
        partial: Box<Format>,
    },

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },
}

impl LogshapeError {
    /// Partially merged format carried by an `IncompleteFormat` error, if any
    pub fn partial_format(&self) -> Option<&Format> {
        match self {
            Self::IncompleteFormat { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for logshape operations
pub type Result<T> = std::result::Result<T, LogshapeError>;
