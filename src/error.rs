//! Error types for configuration, connections, queries and turns.
//!
//! LLM backend errors live in [`crate::llm::LlmError`]. None of these are
//! retried; the chat loop turns each into display text.

use thiserror::Error;

/// Malformed environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown LLM provider '{0}' (expected 'openai' or 'ollama')")]
    UnknownProvider(String),

    #[error("{var} must be a number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} is not a valid URL ('{value}'): {reason}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Failure to open a database handle.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error(transparent)]
    Driver(#[from] sqlx::Error),
}

/// Schema introspection or query execution failure.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Query(#[from] sqlx::Error),

    #[error("{0}")]
    Other(String),
}

/// Why a turn was abandoned.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("not connected to a database; use /connect first")]
    NotConnected,

    #[error("failed to read schema: {0}")]
    Schema(#[source] DbError),

    #[error("SQL generation failed: {0}")]
    Generation(String),

    #[error("query failed: {source}")]
    Execution {
        sql: String,
        #[source]
        source: DbError,
    },
}
