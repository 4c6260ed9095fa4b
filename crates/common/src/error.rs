//! Unified error type for season-sync.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection failure or a retryable HTTP status.
    #[error("Transient HTTP failure for {url}: {message}")]
    Transient { url: String, message: String },

    /// HTTP failure that retrying will not fix (e.g. 404).
    #[error("HTTP request failed for {url}: {message}")]
    Fatal { url: String, message: String },

    /// The response body did not have the expected shape.
    #[error("Parse error for {source_url}: {message}")]
    Parse { source_url: String, message: String },

    #[error("Refusing to overwrite cache entry at {}", .0.display())]
    CacheConflict(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Task failed: {0}")]
    Task(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether another attempt at the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient { .. })
    }

    /// Whether the request itself failed, as opposed to returning
    /// something we could not understand. Such units are recorded as
    /// trouble instead of aborting the season.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Error::Transient { .. } | Error::Fatal { .. })
    }

    pub fn parse(source_url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            source_url: source_url.into(),
            message: message.into(),
        }
    }
}
