//! Imagery products, sensor families and vegetation indices.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ViError;

/// Sensor family. Each family has its own QA bit-layout dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensor {
    Modis,
    Viirs,
}

/// Supported imagery products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "MOD09Q1")]
    Mod09Q1,
    #[serde(rename = "MOD13Q1")]
    Mod13Q1,
    #[serde(rename = "MYD09Q1")]
    Myd09Q1,
    #[serde(rename = "MYD13Q1")]
    Myd13Q1,
    #[serde(rename = "VNP09H1")]
    Vnp09H1,
    #[serde(rename = "MOD09Q1N")]
    Mod09Q1N,
    #[serde(rename = "MOD13Q4N")]
    Mod13Q4N,
    #[serde(rename = "MOD09CMG")]
    Mod09Cmg,
    #[serde(rename = "VNP09CMG")]
    Vnp09Cmg,
}

impl Product {
    /// Every supported product, in catalog order.
    pub const ALL: [Product; 9] = [
        Product::Mod09Q1,
        Product::Mod13Q1,
        Product::Myd09Q1,
        Product::Myd13Q1,
        Product::Vnp09H1,
        Product::Mod09Q1N,
        Product::Mod13Q4N,
        Product::Mod09Cmg,
        Product::Vnp09Cmg,
    ];

    /// Canonical product name.
    pub fn name(&self) -> &'static str {
        match self {
            Product::Mod09Q1 => "MOD09Q1",
            Product::Mod13Q1 => "MOD13Q1",
            Product::Myd09Q1 => "MYD09Q1",
            Product::Myd13Q1 => "MYD13Q1",
            Product::Vnp09H1 => "VNP09H1",
            Product::Mod09Q1N => "MOD09Q1N",
            Product::Mod13Q4N => "MOD13Q4N",
            Product::Mod09Cmg => "MOD09CMG",
            Product::Vnp09Cmg => "VNP09CMG",
        }
    }

    /// Sensor family, selected by the first letter of the product name.
    pub fn sensor(&self) -> Sensor {
        if self.name().starts_with('V') {
            Sensor::Viirs
        } else {
            Sensor::Modis
        }
    }

    /// Four-character product code, e.g. `09CM` for MOD09CMG.
    pub fn suffix(&self) -> &'static str {
        &self.name()[3..7]
    }

    /// Climate Modeling Grid product.
    pub fn is_cmg(&self) -> bool {
        self.name().get(5..8) == Some("CMG")
    }

    /// Product ships a pre-computed NDVI layer with a pixel-reliability mask.
    pub fn is_pregenerated_vi(&self) -> bool {
        matches!(self.suffix(), "13Q1" | "13Q4")
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Product {
    type Err = ViError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Product::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                ViError::unsupported(format!("Product '{}' is not currently supported", s))
            })
    }
}

/// Vegetation index computed from a pair of bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VegetationIndex {
    /// `(nir - red) / (nir + red)`
    Ndvi,
    /// Green chlorophyll index, `nir / green - 1`
    Gcvi,
}

impl VegetationIndex {
    pub fn name(&self) -> &'static str {
        match self {
            VegetationIndex::Ndvi => "NDVI",
            VegetationIndex::Gcvi => "GCVI",
        }
    }
}

impl fmt::Display for VegetationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VegetationIndex {
    type Err = ViError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NDVI" => Ok(VegetationIndex::Ndvi),
            "GCVI" => Ok(VegetationIndex::Gcvi),
            _ => Err(ViError::unsupported(format!(
                "Index type '{}' is not recognized or not currently supported",
                s
            ))),
        }
    }
}
