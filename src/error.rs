use miette::Diagnostic;
use thiserror::Error;

use crate::analysis::MergeError;

/// Result type for sf-lvars operations
pub type Result<T> = std::result::Result<T, Error>;

/// Custom error types for superfluous variable handling
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum Error {
    #[error("I/O error: {0}")]
    #[diagnostic(code(sf_lvars::io_error))]
    Io(String),

    #[error("Corrupt registry node '{node}': {message}")]
    #[diagnostic(
        code(sf_lvars::corrupt_store),
        help("run `sf-lvars reset` to wipe the saved records")
    )]
    CorruptStore { node: String, message: String },

    #[error("Serialization failed: {message}")]
    #[diagnostic(code(sf_lvars::serialization_error))]
    Serialization { message: String },

    #[error("Merge failed: {0}")]
    #[diagnostic(code(sf_lvars::merge_error))]
    Merge(#[from] MergeError),

    #[error("Invalid arguments: {message}")]
    #[diagnostic(code(sf_lvars::invalid_args))]
    InvalidArgs { message: String },
}

impl Error {
    /// Create a corrupt store error
    pub fn corrupt_store(node: impl Into<String>, message: impl Into<String>) -> Self {
        Error::CorruptStore {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Error::InvalidArgs {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<scroll::Error> for Error {
    fn from(err: scroll::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
        }
    }
}
