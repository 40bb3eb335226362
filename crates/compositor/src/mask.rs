//! Simple per-tile masking for single-tile processing.

use qa_flags::{dialect_for, DialectSpec, QaFlag};
use tracing::debug;
use vi_common::{PixelGrid, Product, ViError, ViResult, NODATA};

use crate::layers::QaChannels;

/// Flags that null a surface-reflectance pixel.
pub static SURFACE_REFLECTANCE_FLAGS: [QaFlag; 7] = [
    QaFlag::Cloudy,
    QaFlag::InternalCloud,
    QaFlag::CloudShadow,
    QaFlag::CloudAdjacent,
    QaFlag::NotLowAerosol,
    QaFlag::Mod35Snow,
    QaFlag::LandWaterMismatch,
];

/// Flags that null a pixel of a pre-generated VI product.
pub static VEGETATION_INDEX_FLAGS: [QaFlag; 1] = [QaFlag::Unreliable];

/// Nulls index pixels where any of a fixed set of QA flags holds.
#[derive(Debug, Clone, Copy)]
pub struct Masker {
    dialect: &'static DialectSpec,
    flags: &'static [QaFlag],
}

impl Masker {
    pub fn for_product(product: Product) -> Self {
        let flags: &'static [QaFlag] = if product.is_pregenerated_vi() {
            &VEGETATION_INDEX_FLAGS
        } else {
            &SURFACE_REFLECTANCE_FLAGS
        };
        Self {
            dialect: dialect_for(product.sensor()),
            flags,
        }
    }

    pub fn flags(&self) -> &'static [QaFlag] {
        self.flags
    }

    /// Union of this masker's flags over a tile.
    pub fn mask(&self, channels: &QaChannels) -> ViResult<PixelGrid<bool>> {
        let mut mask: Option<PixelGrid<bool>> = None;
        for &flag in self.flags {
            let channel = self.dialect.channel(flag).ok_or_else(|| {
                ViError::unsupported(format!("{} is not defined for this sensor", flag))
            })?;
            let raw = channels.get(channel)?;
            let hits = self.dialect.decode(flag, raw).ok_or_else(|| {
                ViError::unsupported(format!("{} is not defined for this sensor", flag))
            })?;
            mask = Some(match mask {
                Some(m) => m.zip_map(&hits, |&a, &b| a || b)?,
                None => hits,
            });
        }
        mask.ok_or_else(|| ViError::InvalidConfig("masker has no flags".to_string()))
    }

    /// Copy of `index` with every masked pixel set to [`NODATA`].
    pub fn apply(&self, index: &PixelGrid<i32>, channels: &QaChannels) -> ViResult<PixelGrid<i32>> {
        let mask = self.mask(channels)?;
        let masked = mask.data.iter().filter(|&&m| m).count();
        debug!(pixels = masked, total = mask.len(), "Applied QA mask");
        index.zip_map(&mask, |&v, &m| if m { NODATA } else { v })
    }
}
