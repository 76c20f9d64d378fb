//! Error types for the Loadbook core library.

use std::path::PathBuf;

/// Top-level error enum for the Loadbook core library.
#[derive(Debug, thiserror::Error)]
pub enum LoadbookError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid test id: {0}")]
    InvalidTestId(String),

    #[error("Malformed record at {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "python")]
impl From<LoadbookError> for pyo3::PyErr {
    fn from(err: LoadbookError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
        match &err {
            LoadbookError::Validation(_) | LoadbookError::InvalidTestId(_) => {
                PyValueError::new_err(err.to_string())
            }
            LoadbookError::Io(_) => PyIOError::new_err(err.to_string()),
            LoadbookError::Json(_) => PyValueError::new_err(err.to_string()),
            LoadbookError::Malformed { .. } | LoadbookError::Yaml(_) => {
                PyRuntimeError::new_err(err.to_string())
            }
        }
    }
}

pub type LoadbookResult<T> = Result<T, LoadbookError>;
