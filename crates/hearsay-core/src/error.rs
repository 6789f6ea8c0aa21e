use thiserror::Error;

/// Top-level error type for hearsay.
#[derive(Debug, Error)]
pub enum HearsayError {
    /// Error from the chat-network session.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Persistent store error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Error talking to the remote inference service.
    #[error("inference error: {0}")]
    Inference(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
