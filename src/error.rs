// src/error.rs

//! Library error types.
//!
//! - [`ValidationError`]: a score record update was rejected.
//! - [`RunError`]: a command could not be launched at all.
//!
//! A child that crashes or times out is *not* an error; that outcome is
//! carried in the returned `RunResult`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Invalid visibility setting `{0}'")]
    InvalidVisibility(String),

    #[error("Invalid format `{0}'")]
    InvalidFormat(String),

    #[error("points must be a finite number, got {0}")]
    InvalidPoints(f64),

    #[error("score {score} not in range [{low}, {high}]")]
    ScoreOutOfRange { score: f64, low: f64, high: f64 },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to create user {user} (exit status {status:?})")]
    Provision { user: String, status: Option<i32> },

    #[error("User {0} does not exist")]
    UnknownUser(String),

    #[error("Command is empty")]
    EmptyCommand,

    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while supervising child: {0}")]
    Io(#[from] std::io::Error),
}
