//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error enumeration covering every failure an agent run can surface.
///
/// A process that starts and then exits non-zero, or is killed by the run
/// timeout, is not an error: it still produces a
/// [`RunResult`](crate::models::run::RunResult).
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or adapter validation failure.
    Config(String),
    /// The agent process could not be started at all.
    Launch(String),
    /// Stream or process I/O failure after a successful launch.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Launch(msg) => write!(f, "launch: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
