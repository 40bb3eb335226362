//! Zarr V3 raster writer for finished index arrays.

use std::path::Path;
use std::sync::Arc;

use compositor::{Compression, OutputConfig, RasterWriter};
use serde_json::{json, Map, Value};
use tracing::info;
use vi_common::{GeoReference, PixelGrid, ViResult, NODATA};
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::codec::BytesToBytesCodecTraits;
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use crate::error::{Result, TileStoreError};
use crate::source::{ATTR_CRS, ATTR_NODATA, ATTR_TRANSFORM};

/// Writes rasters as Int16 Zarr arrays, one directory per raster.
#[derive(Debug, Clone, Default)]
pub struct ZarrRasterWriter {
    config: OutputConfig,
    attributes: Map<String, Value>,
}

impl ZarrRasterWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            attributes: Map::new(),
        }
    }

    /// Extra attribute stored with every raster (product, dates, index...).
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    fn write(&self, grid: &PixelGrid<i32>, path: &Path, georef: &GeoReference) -> Result<()> {
        if path.exists() {
            if !self.config.overwrite {
                return Err(TileStoreError::Exists(path.to_path_buf()));
            }
            if path.is_dir() {
                std::fs::remove_dir_all(path)?;
            } else {
                std::fs::remove_file(path)?;
            }
        }
        std::fs::create_dir_all(path)?;

        let store = Arc::new(FilesystemStore::new(path).map_err(TileStoreError::zarr)?);
        let array = self.build_array(store, grid, georef)?;
        array.store_metadata().map_err(TileStoreError::zarr)?;

        let data: Vec<i16> = grid.data.iter().map(|&v| saturate_i16(v)).collect();
        let subset = ArraySubset::new_with_start_shape(
            vec![0, 0],
            vec![grid.height as u64, grid.width as u64],
        )
        .map_err(TileStoreError::zarr)?;
        array
            .store_array_subset_elements(&subset, &data)
            .map_err(TileStoreError::zarr)?;

        info!(
            path = %path.display(),
            width = grid.width,
            height = grid.height,
            compression = %self.config.compression,
            "Wrote raster"
        );
        Ok(())
    }

    fn build_array(
        &self,
        store: Arc<FilesystemStore>,
        grid: &PixelGrid<i32>,
        georef: &GeoReference,
    ) -> Result<Array<FilesystemStore>> {
        let mut attrs = self.attributes.clone();
        attrs.insert(ATTR_CRS.to_string(), json!(georef.crs_wkt));
        attrs.insert(ATTR_TRANSFORM.to_string(), json!(georef.transform.0));
        attrs.insert(ATTR_NODATA.to_string(), json!(NODATA));

        let chunk = self.config.chunk_size as u64;
        let chunk_grid: zarrs::array::ChunkGrid = vec![chunk, chunk]
            .try_into()
            .map_err(|e| TileStoreError::metadata(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(
            vec![grid.height as u64, grid.width as u64], // shape [rows, cols]
            DataType::Int16,
            chunk_grid,
            FillValue::from(saturate_i16(NODATA)),
        );
        let mut builder = binding.attributes(attrs);

        if self.config.compression != Compression::None {
            builder = builder.bytes_to_bytes_codecs(vec![self.compression_codec()?]);
        }

        builder.build(store, "/").map_err(TileStoreError::zarr)
    }

    fn compression_codec(&self) -> Result<Arc<dyn BytesToBytesCodecTraits>> {
        let level = BloscCompressionLevel::try_from(self.config.compression_level)
            .map_err(|_| TileStoreError::metadata("Invalid compression level"))?;

        let compressor = match self.config.compression {
            Compression::None => {
                return Err(TileStoreError::metadata("No compression configured"));
            }
            Compression::Lz4 | Compression::BloscLz4 => BloscCompressor::LZ4,
            Compression::Zstd | Compression::BloscZstd => BloscCompressor::Zstd,
        };

        // typesize is required when shuffle is enabled; i16 = 2 bytes
        let codec = BloscCodec::new(compressor, level, None, BloscShuffleMode::Shuffle, Some(2))
            .map_err(TileStoreError::zarr)?;
        Ok(Arc::new(codec))
    }
}

#[inline]
fn saturate_i16(v: i32) -> i16 {
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

impl RasterWriter for ZarrRasterWriter {
    fn write_raster(
        &self,
        grid: &PixelGrid<i32>,
        path: &Path,
        georef: &GeoReference,
    ) -> ViResult<()> {
        Ok(self.write(grid, path, georef)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturate_i16() {
        assert_eq!(saturate_i16(15000), 15000);
        assert_eq!(saturate_i16(NODATA), -3000);
        assert_eq!(saturate_i16(40000), i16::MAX);
        assert_eq!(saturate_i16(-40000), i16::MIN);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let out = temp_dir.path().join("composite.zarr");
        std::fs::create_dir_all(&out).unwrap();

        let writer = ZarrRasterWriter::new(OutputConfig::default());
        let grid = PixelGrid::filled(2, 2, 1);
        let err = writer
            .write_raster(&grid, &out, &GeoReference::cmg(2, 2))
            .unwrap_err();
        assert!(matches!(err, vi_common::ViError::OutputExists(_)));
    }
}
