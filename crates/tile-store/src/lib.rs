//! Zarr V3 filesystem collaborators for the compositor.
//!
//! - [`ZarrTileSource`] reads tile subdatasets stored as Zarr arrays.
//! - [`ZarrRasterWriter`] persists finished index rasters as Int16 Zarr
//!   arrays carrying their georeferencing as attributes.

pub mod error;
pub mod source;
pub mod testdata;
pub mod writer;

pub use error::{Result, TileStoreError};
pub use source::{georeference_from_attributes, ZarrTileSource};
pub use writer::ZarrRasterWriter;
