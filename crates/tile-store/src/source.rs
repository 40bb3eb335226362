//! Tiles stored as directories of Zarr V3 arrays.
//!
//! A tile is a directory under the store root. Each subdataset is its own
//! Zarr array in a sub-directory named after the dataset:
//!
//! ```text
//! root/
//!   MOD09CMG.2019-01-01/
//!     Coarse Resolution State QA/zarr.json
//!     Coarse Resolution View Zenith Angle/zarr.json
//!     ...
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use compositor::{TileId, TileSource};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use vi_common::georef::{SINUSOIDAL_WKT, VIIRS_500M_PIXEL_SIZE};
use vi_common::{GeoReference, GeoTransform, PixelGrid, Sensor, ViResult};
use walkdir::WalkDir;
use zarrs::array::{Array, DataType, ElementOwned};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use crate::error::{Result, TileStoreError};

/// Metadata document of a Zarr V3 array.
pub const ARRAY_METADATA: &str = "zarr.json";

/// Attribute holding the coordinate system as WKT.
pub const ATTR_CRS: &str = "crs_wkt";
/// Attribute holding the GDAL-order affine transform.
pub const ATTR_TRANSFORM: &str = "geo_transform";
/// Attribute holding the `[x, y]` upper-left corner in projected meters.
pub const ATTR_UPPER_LEFT: &str = "upper_left";
/// Attribute holding the nodata value of an index raster.
pub const ATTR_NODATA: &str = "nodata";

/// Filesystem tile source.
#[derive(Debug, Clone)]
pub struct ZarrTileSource {
    root: PathBuf,
    sensor: Option<Sensor>,
}

impl ZarrTileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sensor: None,
        }
    }

    /// Sensor of the tiles, enabling sensor-specific georeferencing fallbacks.
    pub fn with_sensor(mut self, sensor: Sensor) -> Self {
        self.sensor = Some(sensor);
        self
    }

    pub fn tile_dir(&self, tile: &TileId) -> PathBuf {
        self.root.join(tile.as_str())
    }

    pub fn dataset_dir(&self, tile: &TileId, dataset: &str) -> PathBuf {
        self.tile_dir(tile).join(dataset)
    }

    /// First tile (in name order) whose directory name starts with `prefix`.
    ///
    /// Tiles may sit directly under the root or one level down.
    pub fn find_tile(&self, prefix: &str) -> Option<TileId> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
            .filter(|entry| !entry.path().join(ARRAY_METADATA).is_file())
            .find_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(|rel| TileId::new(rel.to_string_lossy()))
            })
    }

    fn open(&self, tile: &TileId, dataset: &str) -> Result<Array<FilesystemStore>> {
        let dir = self.dataset_dir(tile, dataset);
        if !dir.join(ARRAY_METADATA).is_file() {
            return Err(TileStoreError::NotFound {
                tile: tile.to_string(),
                dataset: dataset.to_string(),
            });
        }
        let store = FilesystemStore::new(&dir).map_err(TileStoreError::zarr)?;
        Array::open(Arc::new(store), "/").map_err(TileStoreError::zarr)
    }

    fn read(&self, tile: &TileId, dataset: &str) -> Result<PixelGrid<i32>> {
        let array = self.open(tile, dataset)?;
        let shape = array.shape().to_vec();
        if shape.len() != 2 {
            return Err(TileStoreError::metadata(format!(
                "'{}' has {} dimensions, expected 2",
                dataset,
                shape.len()
            )));
        }
        let (height, width) = (shape[0] as usize, shape[1] as usize);

        // Zarr uses [row, col] indexing
        let subset = ArraySubset::new_with_start_shape(vec![0, 0], shape)
            .map_err(TileStoreError::zarr)?;

        let data = match array.data_type() {
            DataType::Int8 => retrieve_widened::<i8>(&array, &subset)?,
            DataType::Int16 => retrieve_widened::<i16>(&array, &subset)?,
            DataType::Int32 => retrieve_widened::<i32>(&array, &subset)?,
            DataType::UInt8 => retrieve_widened::<u8>(&array, &subset)?,
            DataType::UInt16 => retrieve_widened::<u16>(&array, &subset)?,
            // QA words are reinterpreted bit for bit
            DataType::UInt32 => retrieve_widened::<u32>(&array, &subset)?,
            other => return Err(TileStoreError::UnsupportedDataType(format!("{:?}", other))),
        };

        debug!(tile = %tile, dataset, width, height, "Read dataset");
        PixelGrid::new(width, height, data).map_err(|e| TileStoreError::metadata(e.to_string()))
    }
}

/// Read every element of a subset, widening it into `i32` words.
fn retrieve_widened<T>(array: &Array<FilesystemStore>, subset: &ArraySubset) -> Result<Vec<i32>>
where
    T: ElementOwned + Into<i64>,
{
    let values: Vec<T> = array
        .retrieve_array_subset_elements(subset)
        .map_err(TileStoreError::zarr)?;
    Ok(values
        .into_iter()
        .map(|v| {
            let wide: i64 = v.into();
            wide as i32
        })
        .collect())
}

/// Georeferencing of an array from its attributes.
///
/// A missing or empty CRS falls back to the MODIS sinusoidal projection. A
/// VIIRS array without a transform is placed on the 500 m sinusoidal grid at
/// its upper-left corner when that corner is recorded.
pub fn georeference_from_attributes(attrs: &Map<String, Value>, sensor: Option<Sensor>) -> GeoReference {
    let crs = match attrs.get(ATTR_CRS).and_then(Value::as_str) {
        Some(wkt) if !wkt.trim().is_empty() => wkt.to_string(),
        _ => {
            warn!("No projection found, assuming MODIS sinusoidal");
            SINUSOIDAL_WKT.to_string()
        }
    };

    let transform = attrs
        .get(ATTR_TRANSFORM)
        .and_then(|v| serde_json::from_value::<[f64; 6]>(v.clone()).ok())
        .map(GeoTransform)
        .or_else(|| {
            if sensor != Some(Sensor::Viirs) {
                return None;
            }
            let [x, y] = attrs
                .get(ATTR_UPPER_LEFT)
                .and_then(|v| serde_json::from_value::<[f64; 2]>(v.clone()).ok())?;
            warn!(x, y, "No geotransform found, using the VIIRS 500 m grid");
            Some(GeoTransform::north_up(x, y, VIIRS_500M_PIXEL_SIZE))
        })
        .unwrap_or_else(GeoTransform::identity);

    GeoReference::new(crs, transform)
}

impl TileSource for ZarrTileSource {
    fn fetch_array(&self, tile: &TileId, dataset: &str) -> ViResult<PixelGrid<i32>> {
        Ok(self.read(tile, dataset)?)
    }

    fn georeference(&self, tile: &TileId, dataset: &str) -> ViResult<GeoReference> {
        let array = self.open(tile, dataset)?;
        Ok(georeference_from_attributes(array.attributes(), self.sensor))
    }

    fn list_datasets(&self, tile: &TileId) -> ViResult<Vec<String>> {
        let dir = self.tile_dir(tile);
        if !dir.is_dir() {
            return Err(TileStoreError::TileNotFound(dir).into());
        }
        Ok(WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .filter(|entry| entry.path().join(ARRAY_METADATA).is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect())
    }
}
