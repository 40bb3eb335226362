//! Data-access and persistence seams.
//!
//! The compositor never touches files itself. It asks a [`TileSource`] for
//! the pixel arrays of named subdatasets and hands finished rasters to a
//! [`RasterWriter`] together with a georeferencing template.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use vi_common::georef::SINUSOIDAL_WKT;
use vi_common::{GeoReference, GeoTransform, PixelGrid, ViError, ViResult};

/// Identifier of one granule as understood by a tile source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(String);

impl TileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TileId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Read access to the subdatasets of tiles.
pub trait TileSource: Send + Sync {
    /// Pixel array of a named subdataset. Fails with `DatasetNotFound` when
    /// the tile has no such dataset.
    fn fetch_array(&self, tile: &TileId, dataset: &str) -> ViResult<PixelGrid<i32>>;

    /// Coordinate system and pixel grid of a subdataset.
    fn georeference(&self, tile: &TileId, dataset: &str) -> ViResult<GeoReference>;

    /// Names of every subdataset of a tile.
    fn list_datasets(&self, tile: &TileId) -> ViResult<Vec<String>>;
}

/// Persists finished rasters.
pub trait RasterWriter: Send + Sync {
    fn write_raster(&self, grid: &PixelGrid<i32>, path: &Path, georef: &GeoReference)
        -> ViResult<()>;
}

#[derive(Debug, Clone, Default)]
struct MemoryTile {
    datasets: BTreeMap<String, PixelGrid<i32>>,
    georef: Option<GeoReference>,
}

/// Tile source backed by in-memory grids.
#[derive(Debug, Clone, Default)]
pub struct MemoryTileSource {
    tiles: HashMap<TileId, MemoryTile>,
}

impl MemoryTileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or extend) a tile with named datasets.
    pub fn insert_tile<I, S>(&mut self, tile: impl Into<TileId>, datasets: I)
    where
        I: IntoIterator<Item = (S, PixelGrid<i32>)>,
        S: Into<String>,
    {
        let entry = self.tiles.entry(tile.into()).or_default();
        for (name, grid) in datasets {
            entry.datasets.insert(name.into(), grid);
        }
    }

    pub fn set_georeference(&mut self, tile: impl Into<TileId>, georef: GeoReference) {
        self.tiles.entry(tile.into()).or_default().georef = Some(georef);
    }

    fn tile(&self, tile: &TileId) -> ViResult<&MemoryTile> {
        self.tiles
            .get(tile)
            .ok_or_else(|| ViError::Storage(format!("unknown tile '{}'", tile)))
    }
}

impl TileSource for MemoryTileSource {
    fn fetch_array(&self, tile: &TileId, dataset: &str) -> ViResult<PixelGrid<i32>> {
        self.tile(tile)?
            .datasets
            .get(dataset)
            .cloned()
            .ok_or_else(|| ViError::dataset_not_found(tile.as_str(), dataset))
    }

    fn georeference(&self, tile: &TileId, dataset: &str) -> ViResult<GeoReference> {
        let entry = self.tile(tile)?;
        if !entry.datasets.contains_key(dataset) {
            return Err(ViError::dataset_not_found(tile.as_str(), dataset));
        }
        Ok(entry
            .georef
            .clone()
            .unwrap_or_else(|| GeoReference::new(SINUSOIDAL_WKT, GeoTransform::identity())))
    }

    fn list_datasets(&self, tile: &TileId) -> ViResult<Vec<String>> {
        Ok(self.tile(tile)?.datasets.keys().cloned().collect())
    }
}

/// A raster handed to a [`MemoryRasterWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenRaster {
    pub path: PathBuf,
    pub grid: PixelGrid<i32>,
    pub georef: GeoReference,
}

/// Raster writer that keeps everything it is given.
#[derive(Debug, Default)]
pub struct MemoryRasterWriter {
    written: Mutex<Vec<WrittenRaster>>,
}

impl MemoryRasterWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self) -> Vec<WrittenRaster> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RasterWriter for MemoryRasterWriter {
    fn write_raster(
        &self,
        grid: &PixelGrid<i32>,
        path: &Path,
        georef: &GeoReference,
    ) -> ViResult<()> {
        let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        if written.iter().any(|r| r.path == path) {
            return Err(ViError::OutputExists(path.to_path_buf()));
        }
        written.push(WrittenRaster {
            path: path.to_path_buf(),
            grid: grid.clone(),
            georef: georef.clone(),
        });
        Ok(())
    }
}
