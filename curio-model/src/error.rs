//! Error types for the model crate.
//!
//! Entry and collection mutators report failure as `false`/`None`; these
//! errors only surface from parsing and storage helpers.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while parsing or storing collection data.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Malformed XML input.
    #[error("xml error: {0}")]
    Xml(String),

    /// Collection type name or code not recognized.
    #[error("unknown collection type: {0}")]
    UnknownCollectionType(String),

    /// Import format identifier not recognized.
    #[error("unknown import format: {0}")]
    UnknownFormat(String),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
