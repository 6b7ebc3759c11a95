//! Error types for lumber.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lumber.
#[derive(Debug, Error)]
pub enum Error {
    /// Docker error.
    #[error("docker error: {0}")]
    Docker(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// A log line exceeded the maximum supported length.
    #[error("log line longer than {limit} bytes")]
    LineTooLong {
        /// The maximum line length in bytes.
        limit: usize,
    },

    /// A descriptor carries a color name that is not in the palette.
    /// This indicates a logic error in color allocation, not an
    /// external condition.
    #[error("unknown prefix color '{0}'")]
    UnknownColor(String),

    /// The container is not in the watch registry.
    #[error("container not watched: {0}")]
    NotWatched(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
