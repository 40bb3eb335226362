//! Scaled integer vegetation indices.
//!
//! Both indices are computed in floating point, scaled by 10000 and
//! truncated toward zero. Any non-finite intermediate (a zero or
//! cancelling denominator) becomes [`NODATA`], so output grids never carry
//! NaN or infinity.

use vi_common::{PixelGrid, VegetationIndex, ViResult, INDEX_SCALE, NODATA};

/// Finalize one scaled index value.
#[inline]
fn scaled(value: f64) -> i32 {
    let v = value * INDEX_SCALE;
    if v.is_finite() {
        // `as` saturates at the i32 bounds
        v.trunc() as i32
    } else {
        NODATA
    }
}

/// NDVI, `(nir - red) / (nir + red)`.
pub fn calc_ndvi(red: &PixelGrid<f64>, nir: &PixelGrid<f64>) -> ViResult<PixelGrid<i32>> {
    red.zip_map(nir, |&r, &n| scaled((n - r) / (n + r)))
}

/// GCVI, `nir / green - 1`.
pub fn calc_gcvi(green: &PixelGrid<f64>, nir: &PixelGrid<f64>) -> ViResult<PixelGrid<i32>> {
    green.zip_map(nir, |&g, &n| scaled(n / g - 1.0))
}

/// Compute `vi` from its `(b1, b2)` band pair: red/NIR or green/NIR.
pub fn calc_index(
    vi: VegetationIndex,
    b1: &PixelGrid<f64>,
    b2: &PixelGrid<f64>,
) -> ViResult<PixelGrid<i32>> {
    match vi {
        VegetationIndex::Ndvi => calc_ndvi(b1, b2),
        VegetationIndex::Gcvi => calc_gcvi(b1, b2),
    }
}
