//! Error types for ingestion and chat

use thiserror::Error;

/// Result type alias for social-insights operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the ingestion pipeline and the chat client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source file has an extension no reader handles
    #[error("Unsupported source file type: {0}")]
    UnsupportedSource(String),

    /// Source file could not be decoded
    #[error("Failed to parse source '{filename}': {message}")]
    SourceParse { filename: String, message: String },

    /// A required column header is absent from the source
    #[error("Source is missing required column '{0}'")]
    MissingColumn(String),

    /// A field could not be coerced to its target type
    #[error("Row {row}: cannot convert {column} value '{value}'")]
    Coercion {
        row: usize,
        column: String,
        value: String,
    },

    /// Table store error
    #[error("Table store error: {0}")]
    Store(String),

    /// Workflow API error
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// Expected field missing from a remote response
    #[error("Response is missing field '{0}'")]
    MissingField(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a source parse error
    pub fn source_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a coercion error for a 1-based spreadsheet row
    pub fn coercion(row: usize, column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Coercion {
            row,
            column: column.into(),
            value: value.into(),
        }
    }

    /// Create a table store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a workflow error
    pub fn workflow(message: impl Into<String>) -> Self {
        Self::Workflow(message.into())
    }
}
