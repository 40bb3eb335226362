//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use compositor::{
    compositing_window, export_qa_layer, write_tile_index, CmgCompositor, CompositeConfig, TileId,
};
use rayon::prelude::*;
use tile_store::{ZarrRasterWriter, ZarrTileSource};
use tracing::{error, info, warn};

/// Output raster name of one composite.
pub fn composite_name(config: &CompositeConfig, start: NaiveDate) -> String {
    format!(
        "{}.{}.{}",
        config.product,
        start.format("%Y-%m-%d"),
        config.vegetation_index
    )
}

/// Tiles of the window starting at `start`, in date order.
///
/// Days with no tile under the root are skipped with a warning.
pub fn window_tiles(source: &ZarrTileSource, config: &CompositeConfig, start: NaiveDate) -> Vec<TileId> {
    compositing_window(start, config.window_days)
        .into_iter()
        .filter_map(|day| {
            let prefix = format!("{}.{}", config.product, day.format("%Y-%m-%d"));
            let tile = source.find_tile(&prefix);
            if tile.is_none() {
                warn!(day = %day, prefix = %prefix, "No tile found for day");
            }
            tile
        })
        .collect()
}

/// Composite every requested window in parallel, each one independently.
pub fn composite_dates(
    config: &CompositeConfig,
    tile_root: &Path,
    output: &Path,
    dates: &[NaiveDate],
) -> Result<()> {
    let source = ZarrTileSource::new(tile_root).with_sensor(config.product.sensor());
    let compositor = CmgCompositor::new(source, config.clone())?;
    std::fs::create_dir_all(output)
        .with_context(|| format!("creating {}", output.display()))?;

    let results: Vec<(NaiveDate, Result<PathBuf>)> = dates
        .par_iter()
        .map(|&date| (date, composite_window(&compositor, output, date)))
        .collect();

    let mut failed = 0;
    for (date, result) in &results {
        match result {
            Ok(path) => info!(date = %date, path = %path.display(), "Composite complete"),
            Err(e) => {
                failed += 1;
                error!(date = %date, error = %e, "Composite failed");
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} composites failed", failed, results.len());
    }
    Ok(())
}

fn composite_window(
    compositor: &CmgCompositor<ZarrTileSource>,
    output: &Path,
    start: NaiveDate,
) -> Result<PathBuf> {
    let config = compositor.config();
    let tiles = window_tiles(compositor.source(), config, start);
    if tiles.is_empty() {
        bail!("no {} tiles found for the window starting {}", config.product, start);
    }
    info!(date = %start, tiles = tiles.len(), "Compositing window");

    let writer = ZarrRasterWriter::new(config.output.clone())
        .with_attribute("product", config.product.name())
        .with_attribute("vegetation_index", config.vegetation_index.name())
        .with_attribute("start_date", start.to_string())
        .with_attribute("window_days", config.window_days)
        .with_attribute("snow_mask", config.snow_mask)
        .with_attribute(
            "tiles",
            tiles.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
        );

    let path = output.join(composite_name(config, start));
    compositor.composite_to(&tiles, &writer, &path)?;
    Ok(path)
}

/// Masked index of one tile, plus its QA layer when requested.
pub fn process_tile(
    config: &CompositeConfig,
    tile: &Path,
    output: &Path,
    qa: Option<&Path>,
) -> Result<()> {
    let name = tile
        .file_name()
        .ok_or_else(|| anyhow!("{} is not a tile directory", tile.display()))?;
    let root = tile.parent().unwrap_or_else(|| Path::new("."));
    let source = ZarrTileSource::new(root).with_sensor(config.product.sensor());
    let id = TileId::new(name.to_string_lossy());

    let writer = ZarrRasterWriter::new(config.output.clone())
        .with_attribute("product", config.product.name())
        .with_attribute("vegetation_index", config.vegetation_index.name())
        .with_attribute("tile", id.to_string());

    write_tile_index(&source, &writer, &id, config, output)?;
    if let Some(qa) = qa {
        export_qa_layer(&source, &writer, &id, config.product, qa)?;
    }
    info!(tile = %id, output = %output.display(), "Tile complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compositor::TileSource;
    use test_utils::fixtures::{modis, CmgTile};
    use tile_store::testdata::write_tile;
    use vi_common::VegetationIndex;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_composite_name() {
        let config = CompositeConfig {
            vegetation_index: VegetationIndex::Gcvi,
            ..Default::default()
        };
        assert_eq!(composite_name(&config, date("2019-01-09")), "MOD09CMG.2019-01-09.GCVI");
    }

    #[test]
    fn test_window_skips_missing_days() {
        let root = tempfile::tempdir().unwrap();
        let datasets = CmgTile::modis(1, 1).datasets();
        for day in ["2019-01-01", "2019-01-03", "2019-01-09"] {
            write_tile(root.path(), &format!("MOD09CMG.{}.hdf", day), &datasets, None).unwrap();
        }
        let source = ZarrTileSource::new(root.path());
        let tiles = window_tiles(&source, &CompositeConfig::default(), date("2019-01-01"));
        assert_eq!(
            tiles,
            vec![
                TileId::new("MOD09CMG.2019-01-01.hdf"),
                TileId::new("MOD09CMG.2019-01-03.hdf")
            ]
        );
    }

    #[test]
    fn test_composite_dates_in_parallel() {
        let root = tempfile::tempdir().unwrap();
        let tiles = root.path().join("tiles");
        for (day, view) in [("2019-01-01", 2000), ("2019-01-02", 1000), ("2019-01-09", 500)] {
            let tile = CmgTile::modis(1, 1)
                .with_state(modis::LAND | modis::AEROSOL_HIGH)
                .with_view_zenith(view)
                .with_bands(500, 4500 - view / 100);
            write_tile(&tiles, &format!("MOD09CMG.{}", day), &tile.datasets(), None).unwrap();
        }
        let out = root.path().join("out");
        let config = CompositeConfig::default();
        composite_dates(&config, &tiles, &out, &[date("2019-01-01"), date("2019-01-09")]).unwrap();

        let reader = ZarrTileSource::new(root.path());
        let first = reader
            .fetch_array(&TileId::new("out"), "MOD09CMG.2019-01-01.NDVI")
            .unwrap();
        let second = reader
            .fetch_array(&TileId::new("out"), "MOD09CMG.2019-01-09.NDVI")
            .unwrap();
        // the 1000 view angle tile wins the first window
        assert_eq!(first.data, vec![7995]);
        assert_eq!(second.data, vec![7997]);

        // a window with no tiles fails
        assert!(composite_dates(&config, &tiles, &out, &[date("2018-06-01")]).is_err());
    }
}
