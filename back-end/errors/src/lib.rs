use thiserror::Error;

/// Process-level failures surfaced by bootstrap, the network manager and the
/// runner. Component errors (gossip, query, search) have their own enums and
/// are converted at the boundary that needs them.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
