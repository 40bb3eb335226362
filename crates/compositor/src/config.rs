//! Configuration for a compositing run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vi_common::{Product, VegetationIndex, ViError, ViResult};

/// Configuration for one compositing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// Product every tile of the run belongs to.
    pub product: Product,

    /// Index written to the composite.
    pub vegetation_index: VegetationIndex,

    /// Exclude snow-ranked observations instead of preferring them.
    pub snow_mask: bool,

    /// Length of the compositing window in days.
    pub window_days: u32,

    /// Raster output settings.
    pub output: OutputConfig,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            product: Product::Mod09Cmg,
            vegetation_index: VegetationIndex::Ndvi,
            snow_mask: true,
            window_days: 8,
            output: OutputConfig::default(),
        }
    }
}

impl CompositeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> ViResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&text)
            .map_err(|e| ViError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> ViResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from environment variables.
    ///
    /// Unparseable product or index names are errors. Other unparseable
    /// values leave the field unchanged.
    pub fn apply_env(&mut self) -> ViResult<()> {
        if let Ok(val) = std::env::var("VI_PRODUCT") {
            self.product = val.parse()?;
        }

        if let Ok(val) = std::env::var("VI_INDEX") {
            self.vegetation_index = val.parse()?;
        }

        if let Ok(val) = std::env::var("VI_SNOW_MASK") {
            self.snow_mask = parse_bool(&val);
        }

        if let Ok(val) = std::env::var("VI_WINDOW_DAYS") {
            if let Ok(days) = val.parse() {
                self.window_days = days;
            }
        }

        if let Ok(val) = std::env::var("VI_OVERWRITE") {
            self.output.overwrite = parse_bool(&val);
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ViResult<()> {
        if self.vegetation_index == VegetationIndex::Gcvi && !self.product.is_cmg() {
            return Err(ViError::unsupported(format!(
                "GCVI is only available for CMG products, not {}",
                self.product
            )));
        }

        if self.window_days == 0 {
            return Err(ViError::InvalidConfig(
                "window_days must be > 0".to_string(),
            ));
        }

        self.output.validate().map_err(ViError::InvalidConfig)
    }
}

fn parse_bool(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

/// Raster output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Replace an existing raster at the output path.
    pub overwrite: bool,

    /// Chunk dimension for output arrays (square chunks).
    pub chunk_size: usize,

    /// Compression codec for output arrays.
    pub compression: Compression,

    /// Compression level (1-9).
    pub compression_level: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            chunk_size: 512,
            compression: Compression::BloscZstd,
            compression_level: 1,
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }

        if self.compression_level == 0 || self.compression_level > 9 {
            return Err("compression_level must be 1-9".to_string());
        }

        Ok(())
    }
}

/// Compression codec for output arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    None,
    Lz4,
    Zstd,
    BloscLz4,
    #[default]
    BloscZstd,
}

impl Compression {
    /// Parse from string (case-insensitive), defaulting to Blosc/Zstd.
    pub fn from_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => Self::None,
            "lz4" => Self::Lz4,
            "zstd" => Self::Zstd,
            "blosc_lz4" => Self::BloscLz4,
            _ => Self::BloscZstd,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = CompositeConfig::default();
        assert!(config.snow_mask);
        assert_eq!(config.window_days, 8);
        assert_eq!(config.output.compression, Compression::BloscZstd);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gcvi_requires_cmg() {
        let config = CompositeConfig {
            product: Product::Mod09Q1,
            vegetation_index: VegetationIndex::Gcvi,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ViError::Unsupported(_))));
    }

    #[test]
    fn test_bad_compression_level() {
        let mut config = CompositeConfig::default();
        config.output.compression_level = 0;
        assert!(matches!(config.validate(), Err(ViError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "product: VNP09CMG\nvegetation_index: GCVI\nsnow_mask: false\noutput:\n  compression: lz4\n  overwrite: true"
        )
        .unwrap();

        let config = CompositeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.product, Product::Vnp09Cmg);
        assert_eq!(config.vegetation_index, VegetationIndex::Gcvi);
        assert!(!config.snow_mask);
        assert_eq!(config.window_days, 8);
        assert_eq!(config.output.compression, Compression::Lz4);
        assert!(config.output.overwrite);
        assert_eq!(config.output.chunk_size, 512);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_product() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "product: MOD11A1").unwrap();
        assert!(matches!(
            CompositeConfig::from_file(file.path()),
            Err(ViError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("yes"));
        assert!(!parse_bool("0"));
    }

    #[test]
    fn test_compression_names() {
        assert_eq!(Compression::from_name("BLOSC_LZ4"), Compression::BloscLz4);
        assert_eq!(Compression::from_name("bogus"), Compression::BloscZstd);
        assert_eq!(Compression::Zstd.to_string(), "zstd");
    }
}
