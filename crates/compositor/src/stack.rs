//! Best-observation selection across a stack of ranked tiles.

use tracing::debug;
use vi_common::sentinel::{NOT_IDEAL_RANK, ZERO_ANGLE};
use vi_common::{PixelGrid, ViError, ViResult, NODATA};

use crate::rank::RankedTile;

/// Rank of snow-covered observations.
pub const SNOW_RANK: u8 = 9;

/// Lowest ideal rank that may reach the composite.
pub const MIN_ELIGIBLE_RANK: u8 = 8;

/// One tile of the stack: its ranking plus its index values.
#[derive(Debug, Clone)]
pub struct StackLayer {
    pub ranked: RankedTile,
    pub index: PixelGrid<i32>,
}

impl StackLayer {
    pub fn new(ranked: RankedTile, index: PixelGrid<i32>) -> ViResult<Self> {
        index.ensure_same_shape(&ranked.rank)?;
        index.ensure_same_shape(&ranked.view_angle)?;
        index.ensure_same_shape(&ranked.water)?;
        Ok(Self { ranked, index })
    }

    fn shape(&self) -> (usize, usize) {
        self.index.shape()
    }
}

/// Composite index plus the per-pixel winning rank and view angle.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub values: PixelGrid<i32>,
    pub ideal_rank: PixelGrid<u8>,
    pub ideal_view_angle: PixelGrid<i32>,
}

/// Select, per pixel, the index value of the best-ranked tile, breaking rank
/// ties on the smallest view angle.
///
/// Where several tiles share both the ideal rank and the ideal view angle
/// the tile latest in `layers` wins. Pixels whose ideal rank is below
/// [`MIN_ELIGIBLE_RANK`], or that any tile flags as water, are
/// [`NODATA`]. With `snow_mask` set, snow observations are excluded
/// instead of ranked. The inputs are not modified.
pub fn composite_stack(layers: &[StackLayer], snow_mask: bool) -> ViResult<Composite> {
    let first = layers.first().ok_or(ViError::EmptyStack)?;
    let (width, height) = first.shape();
    for layer in layers {
        if layer.shape() != (width, height) {
            return Err(ViError::ShapeMismatch {
                expected: (width, height),
                found: layer.shape(),
            });
        }
    }

    // Ranks with no-data observations and (optionally) snow excluded.
    let ranks: Vec<PixelGrid<u8>> = layers
        .iter()
        .map(|layer| {
            layer.ranked.rank.zip_map(&layer.index, |&r, &v| {
                if v == NODATA || (snow_mask && r == SNOW_RANK) {
                    0
                } else {
                    r
                }
            })
        })
        .collect::<ViResult<_>>()?;

    let ideal_rank = fold_grids(&ranks, 0u8, |a, b| a.max(b))?;

    // Only tiles at the ideal rank compete on view angle.
    let angles: Vec<PixelGrid<i32>> = layers
        .iter()
        .zip(&ranks)
        .map(|(layer, rank)| {
            let eligible = rank.zip_map(&ideal_rank, |r, ideal| r == ideal)?;
            layer.ranked.view_angle.zip_map(&eligible, |&a, &ok| {
                if !ok {
                    NOT_IDEAL_RANK
                } else if a == 0 {
                    ZERO_ANGLE
                } else {
                    a
                }
            })
        })
        .collect::<ViResult<_>>()?;

    let ideal_view_angle = fold_grids(&angles, i32::MAX, |a, b| a.min(b))?;

    let mut values = PixelGrid::filled(width, height, NODATA);
    for (layer, angle) in layers.iter().zip(&angles) {
        for (i, out) in values.data.iter_mut().enumerate() {
            if angle.data[i] == ideal_view_angle.data[i] {
                *out = layer.index.data[i];
            }
        }
    }

    let mut water = PixelGrid::filled(width, height, false);
    for layer in layers {
        water = water.zip_map(&layer.ranked.water, |&a, &b| a || b)?;
    }

    let mut excluded = 0usize;
    for (i, out) in values.data.iter_mut().enumerate() {
        if ideal_rank.data[i] < MIN_ELIGIBLE_RANK || water.data[i] {
            *out = NODATA;
            excluded += 1;
        }
    }

    debug!(
        tiles = layers.len(),
        width,
        height,
        excluded,
        snow_mask,
        "Composited stack"
    );

    Ok(Composite {
        values,
        ideal_rank,
        ideal_view_angle,
    })
}

/// Element-wise reduction of same-shape grids.
fn fold_grids<T: Copy>(grids: &[PixelGrid<T>], init: T, f: impl Fn(T, T) -> T) -> ViResult<PixelGrid<T>> {
    let (width, height) = grids.first().map(PixelGrid::shape).ok_or(ViError::EmptyStack)?;
    grids
        .iter()
        .try_fold(PixelGrid::filled(width, height, init), |acc, grid| {
            acc.zip_map(grid, |&a, &b| f(a, b))
        })
}
