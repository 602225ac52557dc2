//! Error types shared by the converter and the solver runner.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Everything that can go wrong while converting an instance or running the solver.
#[derive(Debug, Error)]
pub enum MinPolError {
    #[error("file not found: '{}'", path.display())]
    FileNotFound { path: PathBuf },

    /// The document does not have the shape its declared dimensions require
    #[error("malformed instance at line {line}: {message}")]
    MalformedStructure { line: usize, message: String },

    /// A token could not be read as the numeric type of its field
    #[error("cannot parse {field} at line {line} ('{token}'): {reason}")]
    MalformedValue {
        field: &'static str,
        line: usize,
        token: String,
        reason: String,
    },

    #[error("'{program}' was not found on the search path")]
    ExternalToolNotFound { program: String },

    #[error("'{program}' did not finish within {}s and was killed", timeout.as_secs_f64())]
    ExternalToolTimeout { program: String, timeout: Duration },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MinPolResult<T> = Result<T, MinPolError>;

impl MinPolError {
    pub(crate) fn structure(line: usize, message: impl Into<String>) -> Self {
        MinPolError::MalformedStructure { line, message: message.into() }
    }

    pub(crate) fn value(field: &'static str, line: usize, token: &str, reason: impl ToString) -> Self {
        MinPolError::MalformedValue {
            field,
            line,
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }
}
