//! Error types for the pinball bot crate

use thiserror::Error;

/// Main error type for the pinball bot crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("unknown action identifier '{uid}'")]
    UnknownAction { uid: String },

    #[error("policy row {line} has {got} columns but the header declares {expected}")]
    CorruptPolicyRow {
        line: u64,
        expected: usize,
        got: usize,
    },

    #[error("policy file is missing the '{column}' column")]
    MissingPolicyColumn { column: String },

    #[error("cannot parse '{value}' as {expected} in row {line}")]
    ParseValue {
        value: String,
        expected: String,
        line: u64,
    },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
