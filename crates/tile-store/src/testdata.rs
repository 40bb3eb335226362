//! Test data generation utilities.
//!
//! Builds tile directories on disk in the layout [`ZarrTileSource`] reads,
//! so tests can exercise the whole read path with known values.
//!
//! [`ZarrTileSource`]: crate::ZarrTileSource

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use vi_common::{GeoReference, PixelGrid};
use zarrs::array::{Array, ArrayBuilder, DataType, Element, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use crate::error::{Result, TileStoreError};
use crate::source::{ATTR_CRS, ATTR_TRANSFORM};

/// Element type a test dataset is stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredType {
    Int8,
    Int16,
    Int32,
    UInt8,
    UInt16,
    UInt32,
}

/// Write one dataset of a tile.
///
/// Values are narrowed with `as`, so callers pick a type wide enough for
/// their data.
pub fn write_dataset(
    tile_dir: &Path,
    name: &str,
    grid: &PixelGrid<i32>,
    stored: StoredType,
    attrs: Map<String, Value>,
) -> Result<PathBuf> {
    let path = tile_dir.join(name);
    std::fs::create_dir_all(&path)?;
    let store = Arc::new(FilesystemStore::new(&path).map_err(TileStoreError::zarr)?);

    let d = &grid.data;
    match stored {
        StoredType::Int8 => store_elements(store, grid, DataType::Int8, attrs, &narrow(d, |v| v as i8))?,
        StoredType::Int16 => store_elements(store, grid, DataType::Int16, attrs, &narrow(d, |v| v as i16))?,
        StoredType::Int32 => store_elements(store, grid, DataType::Int32, attrs, d)?,
        StoredType::UInt8 => store_elements(store, grid, DataType::UInt8, attrs, &narrow(d, |v| v as u8))?,
        StoredType::UInt16 => store_elements(store, grid, DataType::UInt16, attrs, &narrow(d, |v| v as u16))?,
        StoredType::UInt32 => store_elements(store, grid, DataType::UInt32, attrs, &narrow(d, |v| v as u32))?,
    }
    Ok(path)
}

/// Write every dataset of a tile as Int32, optionally georeferenced.
pub fn write_tile(
    root: &Path,
    tile: &str,
    datasets: &[(&str, PixelGrid<i32>)],
    georef: Option<&GeoReference>,
) -> Result<PathBuf> {
    let tile_dir = root.join(tile);
    for (name, grid) in datasets {
        let mut attrs = Map::new();
        if let Some(geo) = georef {
            attrs.insert(ATTR_CRS.to_string(), serde_json::json!(geo.crs_wkt));
            attrs.insert(ATTR_TRANSFORM.to_string(), serde_json::json!(geo.transform.0));
        }
        write_dataset(&tile_dir, name, grid, StoredType::Int32, attrs)?;
    }
    Ok(tile_dir)
}

fn narrow<T>(data: &[i32], f: impl Fn(i32) -> T) -> Vec<T> {
    data.iter().map(|&v| f(v)).collect()
}

fn store_elements<T: Element + Default>(
    store: Arc<FilesystemStore>,
    grid: &PixelGrid<i32>,
    data_type: DataType,
    attrs: Map<String, Value>,
    data: &[T],
) -> Result<()>
where
    FillValue: From<T>,
{
    let chunks = vec![grid.height.max(1) as u64, grid.width.max(1) as u64];
    let array: Array<FilesystemStore> = ArrayBuilder::new(
        vec![grid.height as u64, grid.width as u64],
        data_type,
        chunks.try_into().map_err(|e| TileStoreError::metadata(format!("{:?}", e)))?,
        FillValue::from(T::default()),
    )
    .attributes(attrs)
    .build(store, "/")
    .map_err(TileStoreError::zarr)?;

    array.store_metadata().map_err(TileStoreError::zarr)?;

    let subset = ArraySubset::new_with_start_shape(
        vec![0, 0],
        vec![grid.height as u64, grid.width as u64],
    )
    .map_err(TileStoreError::zarr)?;
    array
        .store_array_subset_elements(&subset, data)
        .map_err(TileStoreError::zarr)?;
    Ok(())
}
