//! Multi-date best-pixel compositing of vegetation index tiles.
//!
//! For every pixel of a stack of same-grid tiles, the compositor picks the
//! observation with the best QA-derived rank, breaks rank ties on the
//! smallest view angle, and writes that observation's index value.
//!
//! # Example
//!
//! ```
//! use compositor::{
//!     CmgCompositor, CompositeConfig, MemoryTileSource, TileId,
//! };
//!
//! let source = MemoryTileSource::new();
//! let compositor = CmgCompositor::new(source, CompositeConfig::default()).unwrap();
//! assert!(compositor.composite(&[] as &[TileId]).is_err());
//! ```

pub mod config;
pub mod index;
pub mod layers;
pub mod mask;
pub mod pipeline;
pub mod rank;
pub mod source;
pub mod stack;

pub use config::{CompositeConfig, Compression, OutputConfig};
pub use index::{calc_gcvi, calc_index, calc_ndvi};
pub use layers::{QaChannels, QualityLayers};
pub use mask::Masker;
pub use pipeline::{
    compositing_window, export_dataset, export_qa_layer, masked_tile_index, read_quality_layers,
    tile_index, write_tile_index, CmgCompositor,
};
pub use rank::{RankedTile, Ranker, TierCondition, TierRule, TIER_SEQUENCE};
pub use source::{MemoryRasterWriter, MemoryTileSource, RasterWriter, TileId, TileSource};
pub use stack::{composite_stack, Composite, StackLayer};
