//! Per-tile extraction and multi-date compositing.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use qa_flags::{Channel, DialectSpec, QaFlag};
use tracing::{info, warn};
use vi_common::georef::WGS84_WKT;
use vi_common::{
    datasets_for, GeoReference, PixelGrid, Product, ProductDatasets, VegetationIndex, ViError,
    ViResult,
};

use crate::config::CompositeConfig;
use crate::index::calc_index;
use crate::layers::{QaChannels, QualityLayers};
use crate::mask::Masker;
use crate::rank::{Ranker, TierCondition};
use crate::source::{RasterWriter, TileId, TileSource};
use crate::stack::{composite_stack, Composite, StackLayer};

/// Consecutive dates of a compositing window starting at `start`.
pub fn compositing_window(start: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .map(|offset| start + Duration::days(i64::from(offset)))
        .collect()
}

/// Dataset backing a QA channel in a product.
pub fn channel_dataset(datasets: &ProductDatasets, channel: Channel) -> Option<&'static str> {
    match channel {
        Channel::State => datasets.state,
        Channel::Qa => datasets.qa,
        Channel::Qf2 => datasets.qf2,
        Channel::Qf4 => datasets.qf4,
        Channel::Reliability => datasets.reliability,
    }
}

fn required<'a>(name: Option<&'a str>, product: Product, what: &str) -> ViResult<&'a str> {
    name.ok_or_else(|| ViError::unsupported(format!("{} has no {} layer", product, what)))
}

/// Channels the given flags are decoded from.
fn channels_for(dialect: &DialectSpec, flags: impl IntoIterator<Item = QaFlag>) -> BTreeSet<Channel> {
    flags
        .into_iter()
        .filter_map(|flag| dialect.channel(flag))
        .collect()
}

/// Fetch QA channels of a tile as raw bit words.
pub fn read_channels(
    source: &dyn TileSource,
    tile: &TileId,
    product: Product,
    channels: &BTreeSet<Channel>,
) -> ViResult<QaChannels> {
    let datasets = datasets_for(product);
    let mut out = QaChannels::new();
    for &channel in channels {
        let name = required(channel_dataset(datasets, channel), product, channel.name())?;
        out.insert(channel, source.fetch_array(tile, name)?.to_bits())?;
    }
    Ok(out)
}

/// Everything the ranker needs from one CMG tile.
pub fn read_quality_layers(
    source: &dyn TileSource,
    tile: &TileId,
    product: Product,
    ranker: &Ranker,
) -> ViResult<QualityLayers> {
    let datasets = datasets_for(product);
    let mut channels: BTreeSet<Channel> = channels_for(
        ranker.dialect(),
        ranker.rules().iter().filter_map(|rule| match rule.condition {
            TierCondition::Flag(flag) => Some(flag),
            _ => None,
        }),
    );
    channels.insert(Channel::State);

    let qa = read_channels(source, tile, product, &channels)?;
    let view = source.fetch_array(tile, required(datasets.view_zenith, product, "view zenith")?)?;
    let solar = source.fetch_array(tile, required(datasets.solar_zenith, product, "solar zenith")?)?;
    QualityLayers::new(qa, view, solar)
}

/// Index array of one tile.
///
/// Pre-generated VI products supply NDVI directly. Everything else is
/// computed from the product's band pair.
pub fn tile_index(
    source: &dyn TileSource,
    tile: &TileId,
    product: Product,
    vi: VegetationIndex,
) -> ViResult<PixelGrid<i32>> {
    let datasets = datasets_for(product);
    if vi == VegetationIndex::Gcvi && !product.is_cmg() {
        return Err(ViError::unsupported(
            "Only CMG-scale imagery is supported for GCVI generation",
        ));
    }

    if product.is_pregenerated_vi() {
        return source.fetch_array(tile, required(datasets.ndvi, product, "NDVI")?);
    }

    let (b1, b2) = datasets.index_bands(vi)?;
    // both indices are ratios, so the stored integers are used unscaled
    let b1 = source.fetch_array(tile, b1)?.to_f64();
    let b2 = source.fetch_array(tile, b2)?.to_f64();
    calc_index(vi, &b1, &b2)
}

/// Index array of one tile with cloud, shadow and water pixels nulled.
pub fn masked_tile_index(
    source: &dyn TileSource,
    tile: &TileId,
    product: Product,
    vi: VegetationIndex,
) -> ViResult<PixelGrid<i32>> {
    let index = tile_index(source, tile, product, vi)?;
    let masker = Masker::for_product(product);
    let channels = channels_for(
        qa_flags::dialect_for(product.sensor()),
        masker.flags().iter().copied(),
    );
    let qa = read_channels(source, tile, product, &channels)?;
    masker.apply(&index, &qa)
}

/// Dataset whose georeferencing a product's rasters are written with.
fn template_dataset(product: Product) -> ViResult<&'static str> {
    let datasets = datasets_for(product);
    required(datasets.nir.or(datasets.ndvi), product, "template")
}

/// Write the masked index of one tile, georeferenced like its bands.
pub fn write_tile_index(
    source: &dyn TileSource,
    writer: &dyn RasterWriter,
    tile: &TileId,
    config: &CompositeConfig,
    output: &Path,
) -> ViResult<()> {
    config.validate()?;
    let index = masked_tile_index(source, tile, config.product, config.vegetation_index)?;
    let georef = source.georeference(tile, template_dataset(config.product)?)?;
    writer.write_raster(&index, output, &georef)?;
    info!(tile = %tile, output = %output.display(), "Wrote tile index");
    Ok(())
}

/// Copy a named subdataset of a tile to a raster of its own.
pub fn export_dataset(
    source: &dyn TileSource,
    writer: &dyn RasterWriter,
    tile: &TileId,
    dataset: &str,
    output: &Path,
) -> ViResult<()> {
    let grid = source.fetch_array(tile, dataset)?;
    let georef = source.georeference(tile, dataset)?;
    writer.write_raster(&grid, output, &georef)?;
    info!(tile = %tile, dataset, output = %output.display(), "Exported dataset");
    Ok(())
}

/// Export the product's QA layer of a tile.
pub fn export_qa_layer(
    source: &dyn TileSource,
    writer: &dyn RasterWriter,
    tile: &TileId,
    product: Product,
    output: &Path,
) -> ViResult<()> {
    let name = required(datasets_for(product).qa_layer, product, "exportable QA")?;
    export_dataset(source, writer, tile, name, output)
}

/// Multi-date best-pixel compositor for CMG products.
pub struct CmgCompositor<S> {
    source: S,
    config: CompositeConfig,
    ranker: Ranker,
}

impl<S: TileSource> CmgCompositor<S> {
    /// Fails before any data is read when the configuration cannot be
    /// composited.
    pub fn new(source: S, config: CompositeConfig) -> ViResult<Self> {
        config.validate()?;
        if !config.product.is_cmg() {
            return Err(ViError::unsupported(format!(
                "multi-date compositing requires a CMG product, not {}",
                config.product
            )));
        }
        let ranker = Ranker::for_sensor(config.product.sensor());
        Ok(Self {
            source,
            config,
            ranker,
        })
    }

    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Ranking and index array of one tile.
    pub fn stack_layer(&self, tile: &TileId) -> ViResult<StackLayer> {
        let product = self.config.product;
        let layers = read_quality_layers(&self.source, tile, product, &self.ranker)?;
        let ranked = self.ranker.rank(&layers)?;
        let index = tile_index(&self.source, tile, product, self.config.vegetation_index)?;
        StackLayer::new(ranked, index)
    }

    /// Composite tiles in the given order.
    pub fn composite(&self, tiles: &[TileId]) -> ViResult<Composite> {
        if tiles.is_empty() {
            return Err(ViError::EmptyStack);
        }
        let layers = tiles
            .iter()
            .map(|tile| self.stack_layer(tile))
            .collect::<ViResult<Vec<_>>>()?;
        let composite = composite_stack(&layers, self.config.snow_mask)?;
        info!(
            product = %self.config.product,
            index = %self.config.vegetation_index,
            tiles = tiles.len(),
            "Composited tiles"
        );
        Ok(composite)
    }

    /// Georeferencing for a composite of `tiles`: the first tile's pixel
    /// grid in WGS84, or the global CMG grid when that tile carries none.
    pub fn template(&self, tiles: &[TileId], width: usize, height: usize) -> ViResult<GeoReference> {
        let first = tiles.first().ok_or(ViError::EmptyStack)?;
        let dataset = template_dataset(self.config.product)?;
        let georef = self.source.georeference(first, dataset)?;
        if georef.transform.is_identity() {
            warn!(tile = %first, "Tile has no pixel grid, using the global CMG grid");
            return Ok(GeoReference::cmg(width, height));
        }
        Ok(georef.with_crs(WGS84_WKT))
    }

    /// Composite tiles and hand the result to `writer`.
    pub fn composite_to(
        &self,
        tiles: &[TileId],
        writer: &dyn RasterWriter,
        output: &Path,
    ) -> ViResult<Composite> {
        let composite = self.composite(tiles)?;
        let (width, height) = composite.values.shape();
        let georef = self.template(tiles, width, height)?;
        writer.write_raster(&composite.values, output, &georef)?;
        info!(output = %output.display(), "Wrote composite");
        Ok(composite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MemoryRasterWriter, MemoryTileSource};
    use test_utils::fixtures::CmgTile;
    use vi_common::GeoTransform;

    fn source_with(tiles: &[(&str, CmgTile)]) -> MemoryTileSource {
        let mut source = MemoryTileSource::new();
        for (id, tile) in tiles {
            source.insert_tile(*id, tile.datasets());
        }
        source
    }

    #[test]
    fn test_compositing_window() {
        let start = NaiveDate::from_ymd_opt(2019, 12, 28).unwrap();
        let window = compositing_window(start, 8);
        assert_eq!(window.len(), 8);
        assert_eq!(window[0], start);
        assert_eq!(window[7], NaiveDate::from_ymd_opt(2020, 1, 4).unwrap());
    }

    #[test]
    fn test_tile_index_from_bands() {
        let source = source_with(&[("t", CmgTile::modis(2, 2))]);
        let ndvi = tile_index(&source, &"t".into(), Product::Mod09Cmg, VegetationIndex::Ndvi).unwrap();
        assert_eq!(ndvi.data, vec![6666; 4]);
        let gcvi = tile_index(&source, &"t".into(), Product::Mod09Cmg, VegetationIndex::Gcvi).unwrap();
        assert_eq!(gcvi.data, vec![15000; 4]);
    }

    #[test]
    fn test_exact_ratios_from_stored_integers() {
        let mut source = MemoryTileSource::new();
        source.insert_tile(
            "t",
            [
                ("sur_refl_b01", PixelGrid::new(3, 1, vec![50, 1000, 100]).unwrap()),
                ("sur_refl_b02", PixelGrid::new(3, 1, vec![750, 3000, 300]).unwrap()),
            ],
        );
        let ndvi = tile_index(&source, &"t".into(), Product::Mod09Q1, VegetationIndex::Ndvi).unwrap();
        assert_eq!(ndvi.data, vec![8750, 5000, 5000]);
    }

    #[test]
    fn test_gcvi_rejected_outside_cmg() {
        let source = MemoryTileSource::new();
        let err = tile_index(&source, &"t".into(), Product::Mod09Q1, VegetationIndex::Gcvi).unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn test_pregenerated_ndvi_is_read_directly() {
        let mut source = MemoryTileSource::new();
        source.insert_tile(
            "vi",
            [
                ("250m 16 days NDVI", PixelGrid::new(2, 1, vec![4000, 5000]).unwrap()),
                ("250m 16 days pixel reliability", PixelGrid::new(2, 1, vec![0, 1]).unwrap()),
            ],
        );
        let out = masked_tile_index(&source, &"vi".into(), Product::Mod13Q1, VegetationIndex::Ndvi).unwrap();
        assert_eq!(out.data, vec![4000, vi_common::NODATA]);
    }

    #[test]
    fn test_missing_band_propagates() {
        let mut source = MemoryTileSource::new();
        source.insert_tile("t", [("sur_refl_b01", PixelGrid::filled(1, 1, 100))]);
        let err = tile_index(&source, &"t".into(), Product::Mod09Q1, VegetationIndex::Ndvi).unwrap_err();
        assert!(matches!(err, ViError::DatasetNotFound { .. }));
    }

    #[test]
    fn test_compositor_rejects_non_cmg() {
        let config = CompositeConfig {
            product: Product::Vnp09H1,
            ..Default::default()
        };
        let result = CmgCompositor::new(MemoryTileSource::new(), config);
        assert!(matches!(result, Err(ViError::Unsupported(_))));
    }

    #[test]
    fn test_compositor_empty_stack() {
        let compositor = CmgCompositor::new(MemoryTileSource::new(), CompositeConfig::default()).unwrap();
        assert!(matches!(compositor.composite(&[]), Err(ViError::EmptyStack)));
    }

    #[test]
    fn test_viirs_reads_quality_words() {
        let source = source_with(&[("v", CmgTile::viirs(1, 1).with_qf2(1 << 4))]);
        let config = CompositeConfig {
            product: Product::Vnp09Cmg,
            snow_mask: false,
            ..Default::default()
        };
        let compositor = CmgCompositor::new(source, config).unwrap();
        let out = compositor.composite(&["v".into()]).unwrap();
        assert_eq!(out.ideal_rank.data, vec![8]);
        assert_eq!(out.values.data, vec![6666]);
    }

    #[test]
    fn test_template_falls_back_to_global_grid() {
        let source = source_with(&[("a", CmgTile::modis(2, 2))]);
        let writer = MemoryRasterWriter::new();
        let compositor = CmgCompositor::new(source, CompositeConfig::default()).unwrap();
        compositor
            .composite_to(&["a".into()], &writer, Path::new("out"))
            .unwrap();
        let written = writer.written();
        assert_eq!(written[0].georef, GeoReference::cmg(2, 2));
    }

    #[test]
    fn test_template_keeps_tile_grid_in_wgs84() {
        let mut source = source_with(&[("a", CmgTile::modis(2, 2))]);
        let grid = GeoTransform([-180.0, 0.05, 0.0, 90.0, 0.0, -0.05]);
        source.set_georeference("a", GeoReference::new("LOCAL_CS[\"x\"]", grid));
        let compositor = CmgCompositor::new(source, CompositeConfig::default()).unwrap();
        let georef = compositor.template(&["a".into()], 2, 2).unwrap();
        assert_eq!(georef.crs_wkt, WGS84_WKT);
        assert_eq!(georef.transform, grid);
    }

    #[test]
    fn test_export_qa_layer() {
        let mut source = MemoryTileSource::new();
        source.insert_tile("q", [("sur_refl_state_250m", PixelGrid::filled(1, 1, 72))]);
        let writer = MemoryRasterWriter::new();
        export_qa_layer(&source, &writer, &"q".into(), Product::Mod09Q1, Path::new("qa")).unwrap();
        assert_eq!(writer.written()[0].grid.data, vec![72]);

        let err = export_qa_layer(&source, &writer, &"q".into(), Product::Mod09Cmg, Path::new("qa2"))
            .unwrap_err();
        assert!(matches!(err, ViError::Unsupported(_)));
    }
}
