use thiserror::Error;

/// Unified error type for the lookup path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Data corruption detected (merge failure, undecodable value, bad cache payload).
    #[error("Corruption: {0}")]
    Corruption(String),
    /// Unexpected end of encoded data.
    #[error("Unexpected end of data")]
    Eof,
    /// A configuration value could not be accepted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
