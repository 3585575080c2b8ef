//! Core error types for cogassess-core.
//!
//! Each concern has its own thiserror enum; [`CoreError`] composes them so
//! callers that don't care about the source can use the crate-wide [`Result`].

use std::path::PathBuf;
use thiserror::Error;

use crate::task::TaskKind;

/// Core error type for cogassess-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Countdown errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Task runner errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CAPTCHA verification errors
    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Countdown errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimerError {
    /// `start` was called while a countdown is still running.
    #[error("countdown already running with {remaining_secs}s left; stop it first")]
    AlreadyRunning { remaining_secs: u32 },
}

/// Task runner errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TaskError {
    /// Blank answers are rejected without touching runner state.
    #[error("answer is empty")]
    EmptyAnswer,

    /// The runner was asked for an item that does not exist.
    #[error("item index {index} out of range for {kind} task ({len} items)")]
    ItemOutOfRange {
        kind: TaskKind,
        index: usize,
        len: usize,
    },

    /// `start` was called on a runner that already left `NotStarted`.
    #[error("{kind} task already started")]
    AlreadyStarted { kind: TaskKind },

    /// The task has no items at all.
    #[error("{kind} task has no items")]
    NoItems { kind: TaskKind },

    #[error("unknown task '{0}' (expected math, stroop or captcha)")]
    UnknownKind(String),

    #[error(transparent)]
    Timer(#[from] TimerError),
}

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    /// Stored record could not be decoded
    #[error("Corrupt record under '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// Data directory could not be located or created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[source] std::io::Error),
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

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// CAPTCHA verification errors.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("verification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("verification endpoint returned status {0}")]
    Status(u16),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
