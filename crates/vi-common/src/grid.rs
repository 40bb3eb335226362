//! Row-major pixel grids.

use crate::error::{ViError, ViResult};

/// A 2D grid of per-pixel values stored in row-major order (top-to-bottom).
///
/// Every array that takes part in one compositing operation must share the
/// same `(width, height)`; the operations in this workspace check that
/// explicitly with [`PixelGrid::ensure_same_shape`].
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid<T> {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Pixel values, `height * width` long.
    pub data: Vec<T>,
}

impl<T> PixelGrid<T> {
    /// Create a grid from row-major data.
    pub fn new(width: usize, height: usize, data: Vec<T>) -> ViResult<Self> {
        if data.len() != width * height {
            return Err(ViError::InvalidGrid(format!(
                "{}x{} grid needs {} values, got {}",
                width,
                height,
                width * height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a grid from nested rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> ViResult<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(ViError::InvalidGrid(format!(
                "ragged rows: expected {} columns, found {}",
                width,
                bad.len()
            )));
        }
        Self::new(width, height, rows.into_iter().flatten().collect())
    }

    /// Grid dimensions as `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the value at a row/column position.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col)
    }

    /// Fail with `ShapeMismatch` unless `other` has this grid's dimensions.
    pub fn ensure_same_shape<U>(&self, other: &PixelGrid<U>) -> ViResult<()> {
        if self.shape() != other.shape() {
            return Err(ViError::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        Ok(())
    }

    /// Apply `f` to every pixel, producing a new grid of the same shape.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> PixelGrid<U> {
        PixelGrid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Combine two same-shape grids pixel by pixel.
    pub fn zip_map<U, V>(
        &self,
        other: &PixelGrid<U>,
        f: impl Fn(&T, &U) -> V,
    ) -> ViResult<PixelGrid<V>> {
        self.ensure_same_shape(other)?;
        Ok(PixelGrid {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| f(a, b))
                .collect(),
        })
    }
}

impl<T: Clone> PixelGrid<T> {
    /// Create a grid with every pixel set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl PixelGrid<i32> {
    /// Reinterpret signed words as unsigned bit patterns.
    pub fn to_bits(&self) -> PixelGrid<u32> {
        self.map(|&v| v as u32)
    }

    /// Stored integers as floating point, unscaled.
    pub fn to_f64(&self) -> PixelGrid<f64> {
        self.map(|&v| f64::from(v))
    }
}
