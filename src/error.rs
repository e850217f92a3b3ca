use std::io;
use thiserror::Error;

// Import module-level errors for AppError
use crate::ai::client::AiError;
use crate::config::settings::ConfigError;
use crate::git::discovery::DiscoveryError;
use crate::worker::DispatchError;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository")]
    NotARepository,

    #[error("Git command failed: {0}")]
    CommandFailed(String),

    #[error("Merge conflict detected:\n{0}")]
    Conflict(String),

    #[error("Git command timed out after {seconds}s: {command}")]
    Timeout { command: String, seconds: u64 },

    #[error("Staged diff too large ({size} bytes, limit {limit}), refusing to commit")]
    DiffTooLarge { size: usize, limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Top-level application error that wraps all module-specific errors
///
/// This provides a unified error type for application-level code while preserving
/// the specific error context from each module. All module errors automatically
/// convert to AppError via the `From` trait.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Background task '{0}' terminated without a result")]
    TaskAborted(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
