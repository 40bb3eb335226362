//! Georeferencing templates handed to the raster writer.
//!
//! The core never computes georeferencing; it only carries the coordinate
//! system and pixel-grid transform of a template tile through to the output.

use serde::{Deserialize, Serialize};

/// MODIS sinusoidal projection. VIIRS tiles frequently omit their projection,
/// and this is what they are in.
pub const SINUSOIDAL_WKT: &str = r#"PROJCS["unnamed",GEOGCS["Unknown datum based upon the custom spheroid",DATUM["Not specified (based on custom spheroid)",SPHEROID["Custom spheroid",6371007.181,0]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Sinusoidal"],PARAMETER["longitude_of_center",0],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["Meter",1]]"#;

/// Geographic WGS84, used for every CMG composite.
pub const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#;

/// Pixel size of the VIIRS 500 m sinusoidal grid, in meters.
pub const VIIRS_500M_PIXEL_SIZE: f64 = 463.3127165;

/// Affine pixel-to-world transform in GDAL order:
/// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// North-up transform anchored at an upper-left corner.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_size: f64) -> Self {
        Self([origin_x, pixel_size, 0.0, origin_y, 0.0, -pixel_size])
    }

    /// The transform GDAL reports for a raster with no georeferencing.
    pub fn identity() -> Self {
        Self([0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }

    /// A unit pixel width means the source carried no real transform.
    pub fn is_identity(&self) -> bool {
        self.0[1] == 1.0
    }
}

/// Coordinate system plus pixel grid of a raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoReference {
    /// Coordinate reference system as WKT.
    pub crs_wkt: String,
    pub transform: GeoTransform,
}

impl GeoReference {
    pub fn new(crs_wkt: impl Into<String>, transform: GeoTransform) -> Self {
        Self {
            crs_wkt: crs_wkt.into(),
            transform,
        }
    }

    /// Global 0.05° Climate Modeling Grid in WGS84, sized to the composite.
    pub fn cmg(width: usize, height: usize) -> Self {
        let dx = 360.0 / width.max(1) as f64;
        let dy = 180.0 / height.max(1) as f64;
        Self::new(
            WGS84_WKT,
            GeoTransform([-180.0, dx, 0.0, 90.0, 0.0, -dy]),
        )
    }

    /// Same pixel grid, different coordinate system.
    pub fn with_crs(mut self, crs_wkt: impl Into<String>) -> Self {
        self.crs_wkt = crs_wkt.into();
        self
    }
}
