//! Shared test utilities for the compositing workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic QA state words for both sensor dialects
//! - Builders for whole CMG tiles keyed by real subdataset names
//! - Band and angle grid generators
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures::modis, CmgTile};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Create a temporary directory that is removed when dropped.
pub fn temp_workspace() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Assert a predicate over every pixel of a grid, reporting the first
/// offending row/column.
///
/// ```ignore
/// assert_every_pixel!(composite, |v| *v == vi_common::NODATA);
/// ```
#[macro_export]
macro_rules! assert_every_pixel {
    ($grid:expr, $pred:expr) => {{
        let grid = &$grid;
        for (i, value) in grid.data.iter().enumerate() {
            if !($pred)(value) {
                panic!(
                    "pixel (row {}, col {}) = {:?} failed `{}`",
                    i / grid.width,
                    i % grid.width,
                    value,
                    stringify!($pred)
                );
            }
        }
    }};
}
