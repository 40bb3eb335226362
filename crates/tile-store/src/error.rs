//! Error types for the Zarr tile store.

use std::path::PathBuf;

use thiserror::Error;
use vi_common::ViError;

/// Errors raised while reading or writing Zarr tiles.
#[derive(Error, Debug)]
pub enum TileStoreError {
    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    Zarr(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid or unexpected array metadata.
    #[error("invalid metadata: {0}")]
    Metadata(String),

    /// Stored element type cannot be read as integer words.
    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// Tile directory does not exist.
    #[error("tile not found: {}", .0.display())]
    TileNotFound(PathBuf),

    /// Dataset is not present in the tile.
    #[error("dataset '{dataset}' not found in '{tile}'")]
    NotFound { tile: String, dataset: String },

    /// Output already exists and overwriting is disabled.
    #[error("{} already exists", .0.display())]
    Exists(PathBuf),
}

impl TileStoreError {
    /// Create a Zarr error.
    pub fn zarr(msg: impl ToString) -> Self {
        Self::Zarr(msg.to_string())
    }

    /// Create a Metadata error.
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }
}

impl From<std::io::Error> for TileStoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<TileStoreError> for ViError {
    fn from(err: TileStoreError) -> Self {
        match err {
            TileStoreError::NotFound { tile, dataset } => ViError::DatasetNotFound { tile, dataset },
            TileStoreError::Exists(path) => ViError::OutputExists(path),
            other => ViError::Storage(other.to_string()),
        }
    }
}

/// Result type for tile store operations.
pub type Result<T> = std::result::Result<T, TileStoreError>;
