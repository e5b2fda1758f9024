//! Error types for vod-dl

use thiserror::Error;

/// Result type alias for vod-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vod-dl
///
/// Used throughout the library and by [`UrlResolver`](crate::fetch::UrlResolver)
/// and [`MediaFetcher`](crate::fetch::MediaFetcher) implementations. Job
/// errors never reach the submitting HTTP caller; they end up on the finished
/// record, in the tracing log, and on the event channel.
#[derive(Debug, Error)]
pub enum Error {
    /// URL could not be resolved to a canonical content id
    #[error("resolve error: {0}")]
    Resolve(String),

    /// Media fetch failed
    #[error("download error: {0}")]
    Download(String),

    /// Submission body failed schema validation
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "jobs.max_concurrent")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Outbound HTTP error (webhook delivery)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServer(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}
