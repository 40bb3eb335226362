//! Common types shared by the vegetation-index compositing crates.

pub mod datasets;
pub mod error;
pub mod georef;
pub mod grid;
pub mod product;

pub use datasets::{datasets_for, ProductDatasets};
pub use error::{ViError, ViResult};
pub use georef::{GeoReference, GeoTransform};
pub use grid::PixelGrid;
pub use product::{Product, Sensor, VegetationIndex};

/// Nodata value for every scaled index array.
pub const NODATA: i32 = -3000;

/// Scale factor applied to index values before they are stored as integers.
pub const INDEX_SCALE: f64 = 10000.0;

/// View-angle sentinels, in increasing priority of exclusion from the tie-break.
pub mod sentinel {
    /// Degenerate angle or ephemeral water.
    pub const INVALID_ANGLE: i32 = 9999;
    /// Tile did not reach the ideal rank at this pixel.
    pub const NOT_IDEAL_RANK: i32 = 9998;
    /// Eligible tile whose view angle was exactly zero.
    pub const ZERO_ANGLE: i32 = 9997;
}
