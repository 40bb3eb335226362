//! Grid generators for band and angle layers.

use vi_common::PixelGrid;

/// Creates a reflectance grid (0.0-1.0) ramping from `start` by `step`
/// per pixel in row-major order.
pub fn reflectance_ramp(width: usize, height: usize, start: f64, step: f64) -> PixelGrid<f64> {
    PixelGrid {
        width,
        height,
        data: (0..width * height).map(|i| start + step * i as f64).collect(),
    }
}

/// Creates a scaled zenith-angle grid (degrees ×100) where every pixel has
/// a distinct angle, increasing in row-major order from `base`.
pub fn distinct_angles(width: usize, height: usize, base: i32) -> PixelGrid<i32> {
    PixelGrid {
        width,
        height,
        data: (0..(width * height) as i32).map(|i| base + i * 10).collect(),
    }
}
