//! Error types for vegetation-index compositing.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using ViError.
pub type ViResult<T> = Result<T, ViError>;

/// Primary error type for the compositing core and its collaborators.
#[derive(Debug, Error)]
pub enum ViError {
    // === Request Errors ===
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Data Errors ===
    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Dataset '{dataset}' not found in '{tile}'")]
    DatasetNotFound { tile: String, dataset: String },

    #[error("QA channel '{0}' required by this dialect was not supplied")]
    MissingChannel(String),

    #[error("Cannot composite an empty stack")]
    EmptyStack,

    // === Storage Errors ===
    #[error("{} already exists; set overwrite to replace it", .0.display())]
    OutputExists(PathBuf),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ViError {
    /// Create an Unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a DatasetNotFound error.
    pub fn dataset_not_found(tile: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self::DatasetNotFound {
            tile: tile.into(),
            dataset: dataset.into(),
        }
    }

    /// Whether the failure happened before any array work was attempted.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ViError::Unsupported(_) | ViError::InvalidConfig(_))
    }
}

impl From<std::io::Error> for ViError {
    fn from(err: std::io::Error) -> Self {
        ViError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ViError {
    fn from(err: serde_json::Error) -> Self {
        ViError::Storage(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_not_found_message() {
        let err = ViError::dataset_not_found("MOD09CMG.2019-01-01", "Coarse Resolution QA");
        assert_eq!(
            err.to_string(),
            "Dataset 'Coarse Resolution QA' not found in 'MOD09CMG.2019-01-01'"
        );
    }

    #[test]
    fn test_rejections() {
        assert!(ViError::unsupported("EVI").is_rejection());
        assert!(!ViError::EmptyStack.is_rejection());
    }
}
