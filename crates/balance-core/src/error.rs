//! Error types for balance-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in balance-core
#[derive(Debug, Error)]
pub enum Error {
    /// Network failure or non-success response from an external source
    #[error("failed to fetch '{url}': {message}")]
    Fetch { url: String, message: String },

    /// Malformed Lua source in the table publication
    #[error("Lua parse error at {line}:{column}: {message}")]
    LuaParse {
        line: usize,
        column: usize,
        message: String,
    },

    /// The Lua source parsed but does not have the expected shape
    #[error("unexpected table structure: {0}")]
    TableShape(String),

    /// A marker delimiting the embedded script was not found
    #[error("marker '{0}' not found in table publication")]
    MarkerNotFound(String),

    /// The wiki publication yielded no patch sections
    #[error("no patch sections found in wiki publication")]
    NoSections,

    /// No unit with this id in the dataset
    #[error("unit not found: {0}")]
    UnitNotFound(u32),

    /// Invalid CSS selector
    #[error("invalid selector: {0}")]
    Selector(String),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to atomically replace a file
    #[error("failed to write file '{path}': {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
