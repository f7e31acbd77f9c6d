use thiserror::Error;

/// Failures raised by a document adapter.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    #[error("node handle is no longer attached to the document")]
    Stale,

    #[error("document unavailable: {0}")]
    Unavailable(String),

    #[error("failed to load frame: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("document query failed: {0}")]
    Document(#[from] DocumentError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to write dump: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize scan: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = FeedError> = std::result::Result<T, E>;
