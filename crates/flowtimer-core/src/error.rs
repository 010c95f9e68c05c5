//! Core error types for flowtimer-core.
//!
//! Only definition validation and configuration I/O can fail. A running
//! timer never surfaces errors: anomalies inside the event loop are absorbed
//! by the engine.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for flowtimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer definition rejected at bind time
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Timer definition validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A definition needs at least one step
    #[error("Timer definition '{definition_id}' has no steps")]
    EmptySteps { definition_id: String },

    /// Step durations are whole seconds, at least one
    #[error("Step '{step_id}' has invalid duration {duration}s (must be >= 1)")]
    InvalidDuration { step_id: String, duration: i64 },

    /// Repetitions must be >= 1, or -1 for infinite
    #[error("Invalid repetition count {0} (must be >= 1, or -1 for infinite)")]
    InvalidRepetitions(i64),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
