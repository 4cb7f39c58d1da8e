//! Error types for the smartcab crate

use thiserror::Error;

use crate::types::State;

/// Main error type for the smartcab crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("state {state} is outside the value table's key space")]
    UnknownState { state: State },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("invalid {kind} '{input}'. Expected one of: {expected}")]
    ParseToken {
        kind: String,
        input: String,
        expected: String,
    },

    #[error("no trip in progress; reset must be called before update")]
    NoTripInProgress,

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }
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
