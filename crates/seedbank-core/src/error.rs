use thiserror::Error;

/// Core error type shared across Seedbank crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A selection method name was not recognized.
    #[error("unknown selection method: {0}")]
    UnknownMethod(String),
    /// Catch-all for malformed caller input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience alias for results returned by Seedbank crates.
pub type Result<T> = std::result::Result<T, Error>;
