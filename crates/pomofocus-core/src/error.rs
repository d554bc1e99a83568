//! Core error types for pomofocus-core.
//!
//! The timer state machine itself never fails: out-of-domain calls are
//! no-ops. Errors only arise at the boundaries (storage, configuration,
//! user input validation and the task breakdown collaborator).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomofocus-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Assistant error: {0}")]
    Assistant(#[from] AssistantError),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Could not determine or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Slot contents could not be encoded
    #[error("Failed to encode slot '{slot}': {message}")]
    Encode { slot: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Key does not exist in the settings tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors for user input entering the core.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty after trimming
    #[error("Title must not be blank")]
    BlankTitle,

    /// Estimated pomodoros must be positive
    #[error("Estimated pomodoros must be at least 1 (got {0})")]
    NonPositiveEstimate(i64),

    /// Template needs a name and at least one task
    #[error("Template must have a name and at least one task")]
    EmptyTemplate,

    /// No task with the given id
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Task breakdown collaborator errors.
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Prompt is blank
    #[error("Prompt must not be blank")]
    EmptyPrompt,

    /// Response did not have the expected `{"tasks": [...]}` shape
    #[error("Invalid response structure from assistant: {0}")]
    InvalidResponse(String),

    /// Collaborator reported a failure
    #[error("Failed to generate tasks: {0}")]
    Failed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
