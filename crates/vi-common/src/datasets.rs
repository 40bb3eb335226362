//! Subdataset names per product.
//!
//! These are the names the archives use inside each granule's hierarchy.
//! Absent entries mean the product has no such layer.

use crate::error::{ViError, ViResult};
use crate::product::{Product, VegetationIndex};

/// Canonical band and QA layer names of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductDatasets {
    pub red: Option<&'static str>,
    pub nir: Option<&'static str>,
    pub green: Option<&'static str>,
    /// Pre-computed NDVI layer.
    pub ndvi: Option<&'static str>,
    pub state: Option<&'static str>,
    /// MODIS band quality word.
    pub qa: Option<&'static str>,
    /// VIIRS quality flag words 2 and 4.
    pub qf2: Option<&'static str>,
    pub qf4: Option<&'static str>,
    /// Pixel reliability of pre-generated VI products.
    pub reliability: Option<&'static str>,
    pub view_zenith: Option<&'static str>,
    pub solar_zenith: Option<&'static str>,
    /// Layer exported alongside the index when a QA raster is requested.
    pub qa_layer: Option<&'static str>,
}

const EMPTY: ProductDatasets = ProductDatasets {
    red: None,
    nir: None,
    green: None,
    ndvi: None,
    state: None,
    qa: None,
    qf2: None,
    qf4: None,
    reliability: None,
    view_zenith: None,
    solar_zenith: None,
    qa_layer: None,
};

static MOD09CMG: ProductDatasets = ProductDatasets {
    red: Some("Coarse Resolution Surface Reflectance Band 1"),
    nir: Some("Coarse Resolution Surface Reflectance Band 2"),
    green: Some("Coarse Resolution Surface Reflectance Band 4"),
    state: Some("Coarse Resolution State QA"),
    qa: Some("Coarse Resolution QA"),
    view_zenith: Some("Coarse Resolution View Zenith Angle"),
    solar_zenith: Some("Coarse Resolution Solar Zenith Angle"),
    ..EMPTY
};

static VNP09CMG: ProductDatasets = ProductDatasets {
    red: Some("SurfReflect_I1"),
    nir: Some("SurfReflect_I2"),
    green: Some("SurfReflect_M4"),
    state: Some("State_QA"),
    qf2: Some("SurfReflect_QF2"),
    qf4: Some("SurfReflect_QF4"),
    view_zenith: Some("SensorZenith"),
    solar_zenith: Some("SolarZenith"),
    ..EMPTY
};

static MODIS_250M: ProductDatasets = ProductDatasets {
    red: Some("sur_refl_b01"),
    nir: Some("sur_refl_b02"),
    state: Some("sur_refl_state_250m"),
    qa: Some("sur_refl_qc_250m"),
    qa_layer: Some("sur_refl_state_250m"),
    ..EMPTY
};

static VIIRS_500M: ProductDatasets = ProductDatasets {
    red: Some("SurfReflect_I1"),
    nir: Some("SurfReflect_I2"),
    state: Some("SurfReflect_State_500m"),
    qa: Some("SurfReflect_QC_500m"),
    qa_layer: Some("SurfReflect_State_500m"),
    ..EMPTY
};

static MODIS_VI_16DAY: ProductDatasets = ProductDatasets {
    ndvi: Some("250m 16 days NDVI"),
    reliability: Some("250m 16 days pixel reliability"),
    qa_layer: Some("250m 16 days VI Quality"),
    ..EMPTY
};

static MODIS_VI_8DAY: ProductDatasets = ProductDatasets {
    ndvi: Some("250m 8 days NDVI"),
    reliability: Some("250m 8 days pixel reliability"),
    qa_layer: Some("250m 8 days VI Quality"),
    ..EMPTY
};

/// Dataset table for a product.
pub fn datasets_for(product: Product) -> &'static ProductDatasets {
    match product {
        Product::Mod09Cmg => &MOD09CMG,
        Product::Vnp09Cmg => &VNP09CMG,
        Product::Mod09Q1 | Product::Myd09Q1 | Product::Mod09Q1N => &MODIS_250M,
        Product::Vnp09H1 => &VIIRS_500M,
        Product::Mod13Q1 | Product::Myd13Q1 => &MODIS_VI_16DAY,
        Product::Mod13Q4N => &MODIS_VI_8DAY,
    }
}

impl ProductDatasets {
    /// The `(b1, b2)` band pair an index is computed from: red/NIR for
    /// NDVI, green/NIR for GCVI.
    pub fn index_bands(&self, vi: VegetationIndex) -> ViResult<(&'static str, &'static str)> {
        let b1 = match vi {
            VegetationIndex::Ndvi => self.red,
            VegetationIndex::Gcvi => self.green,
        };
        match (b1, self.nir) {
            (Some(b1), Some(nir)) => Ok((b1, nir)),
            _ => Err(ViError::unsupported(format!(
                "{} cannot be computed from this product's bands",
                vi
            ))),
        }
    }
}
