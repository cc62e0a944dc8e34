//! Error types for the catalog crate.
//!
//! Loading a catalog file and querying a document store both report
//! through [`CatalogError`]. Store queries only ever produce
//! `Unavailable`; the remaining variants come from loading.

use thiserror::Error;

/// Errors that can occur while loading or querying the artwork catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be found or opened
    #[error("Failed to open catalog file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading the file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A document in the catalog file couldn't be parsed
    #[error("Parse error at document {position} in {file}: {reason}")]
    ParseError {
        file: String,
        position: usize,
        reason: String,
    },

    /// A document field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Two documents share the same identifier
    #[error("Duplicate artwork id: {id}")]
    DuplicateId { id: String },

    /// The backing document store could not answer
    #[error("Document store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
