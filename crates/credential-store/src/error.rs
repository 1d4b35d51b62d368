//! Error types for credential storage

/// Errors from a secret backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("secure storage error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("credential file parse error: {0}")]
    Parse(String),
}

/// Result alias for credential storage operations.
pub type Result<T> = std::result::Result<T, Error>;
