//! Synthetic QA words and CMG tiles.
//!
//! State words are composed from the named bit fields so each test reads as
//! the condition it is exercising.

use vi_common::{datasets_for, PixelGrid, Product};

/// MODIS state QA bit fields.
pub mod modis {
    pub const CLOUDY: u32 = 0b01;
    pub const CLOUD_SHADOW: u32 = 1 << 2;
    pub const LAND: u32 = 8;
    pub const SHALLOW_OCEAN: u32 = 0;
    pub const SHALLOW_INLAND: u32 = 24;
    pub const EPHEMERAL_WATER: u32 = 32;
    pub const DEEP_INLAND: u32 = 40;
    pub const DEEP_OCEAN: u32 = 56;
    pub const AEROSOL_CLIMATOLOGY: u32 = 0;
    pub const AEROSOL_LOW: u32 = 64;
    pub const AEROSOL_AVERAGE: u32 = 128;
    pub const AEROSOL_HIGH: u32 = 192;
    pub const INTERNAL_CLOUD: u32 = 1 << 10;
    pub const MOD35_SNOW: u32 = 1 << 12;
    pub const CLOUD_ADJACENT: u32 = 1 << 13;
    pub const INTERNAL_SNOW: u32 = 1 << 15;

    /// Cloud-free land with low aerosol: no tier applies.
    pub const CLEAR: u32 = LAND | AEROSOL_LOW;
    /// Clear land under snow: rank 9.
    pub const SNOW: u32 = CLEAR | INTERNAL_SNOW;

    /// Band-quality word that marks a bad retrieval (bits 7-9).
    pub const QA_BAD: u32 = 0b11_1000_0000;
    /// Band-quality word for an uncorrected pixel (bits 0-1).
    pub const QA_UNCORRECTED: u32 = 0b11;
}

/// VIIRS state and QF bit fields.
pub mod viirs {
    pub const CLOUD_SHADOW: u32 = 1 << 2;
    pub const LAND: u32 = 8;
    pub const INLAND_WATER: u32 = 16;
    pub const SEA_WATER: u32 = 24;
    pub const COASTAL: u32 = 40;
    pub const AEROSOL_LOW: u32 = 64;
    pub const INTERNAL_CLOUD: u32 = 1 << 10;
    pub const SNOW: u32 = 1 << 15;

    pub const CLEAR: u32 = LAND | AEROSOL_LOW;

    /// QF2 high-aerosol bit.
    pub const QF2_HIGH_AEROSOL: u32 = 1 << 4;
    /// QF4 bad band bits.
    pub const QF4_BAD: u32 = 0b010;
}

/// Reflectances (×10000) giving an NDVI of 6666 with the default bands.
pub const DEFAULT_RED: i32 = 1000;
pub const DEFAULT_NIR: i32 = 5000;
pub const DEFAULT_GREEN: i32 = 2000;
pub const DEFAULT_VIEW_ZENITH: i32 = 1500;
pub const DEFAULT_SOLAR_ZENITH: i32 = 3000;

/// One CMG granule's layers, before they are handed to a tile source.
#[derive(Debug, Clone)]
pub struct CmgTile {
    pub product: Product,
    pub width: usize,
    pub height: usize,
    pub state: Vec<u32>,
    pub qa: Vec<u32>,
    pub qf2: Vec<u32>,
    pub qf4: Vec<u32>,
    pub view_zenith: Vec<i32>,
    pub solar_zenith: Vec<i32>,
    pub red: Vec<i32>,
    pub nir: Vec<i32>,
    pub green: Vec<i32>,
}

impl CmgTile {
    /// Clear MOD09CMG tile.
    pub fn modis(width: usize, height: usize) -> Self {
        Self::filled(Product::Mod09Cmg, width, height, modis::CLEAR)
    }

    /// Clear VNP09CMG tile.
    pub fn viirs(width: usize, height: usize) -> Self {
        Self::filled(Product::Vnp09Cmg, width, height, viirs::CLEAR)
    }

    fn filled(product: Product, width: usize, height: usize, state: u32) -> Self {
        let n = width * height;
        Self {
            product,
            width,
            height,
            state: vec![state; n],
            qa: vec![0; n],
            qf2: vec![0; n],
            qf4: vec![0; n],
            view_zenith: vec![DEFAULT_VIEW_ZENITH; n],
            solar_zenith: vec![DEFAULT_SOLAR_ZENITH; n],
            red: vec![DEFAULT_RED; n],
            nir: vec![DEFAULT_NIR; n],
            green: vec![DEFAULT_GREEN; n],
        }
    }

    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    pub fn with_state(mut self, state: u32) -> Self {
        self.state.iter_mut().for_each(|s| *s = state);
        self
    }

    pub fn with_state_at(mut self, row: usize, col: usize, state: u32) -> Self {
        let i = self.idx(row, col);
        self.state[i] = state;
        self
    }

    pub fn with_qa_at(mut self, row: usize, col: usize, qa: u32) -> Self {
        let i = self.idx(row, col);
        self.qa[i] = qa;
        self
    }

    pub fn with_qf2(mut self, qf2: u32) -> Self {
        self.qf2.iter_mut().for_each(|q| *q = qf2);
        self
    }

    pub fn with_qf4(mut self, qf4: u32) -> Self {
        self.qf4.iter_mut().for_each(|q| *q = qf4);
        self
    }

    pub fn with_view_zenith(mut self, angle: i32) -> Self {
        self.view_zenith.iter_mut().for_each(|a| *a = angle);
        self
    }

    pub fn with_view_zenith_at(mut self, row: usize, col: usize, angle: i32) -> Self {
        let i = self.idx(row, col);
        self.view_zenith[i] = angle;
        self
    }

    pub fn with_solar_zenith(mut self, angle: i32) -> Self {
        self.solar_zenith.iter_mut().for_each(|a| *a = angle);
        self
    }

    /// Set red and NIR everywhere.
    pub fn with_bands(mut self, red: i32, nir: i32) -> Self {
        self.red.iter_mut().for_each(|v| *v = red);
        self.nir.iter_mut().for_each(|v| *v = nir);
        self
    }

    pub fn with_bands_at(mut self, row: usize, col: usize, red: i32, nir: i32) -> Self {
        let i = self.idx(row, col);
        self.red[i] = red;
        self.nir[i] = nir;
        self
    }

    fn grid<T: Copy + Into<i64>>(&self, values: &[T]) -> PixelGrid<i32> {
        let data = values
            .iter()
            .map(|&v| {
                let wide: i64 = v.into();
                wide as i32
            })
            .collect();
        PixelGrid::new(self.width, self.height, data).expect("fixture dimensions")
    }

    /// All layers of the tile under the product's real subdataset names.
    pub fn datasets(&self) -> Vec<(&'static str, PixelGrid<i32>)> {
        let names = datasets_for(self.product);
        let layers: [(Option<&'static str>, PixelGrid<i32>); 10] = [
            (names.state, self.grid(&self.state)),
            (names.qa, self.grid(&self.qa)),
            (names.qf2, self.grid(&self.qf2)),
            (names.qf4, self.grid(&self.qf4)),
            (names.view_zenith, self.grid(&self.view_zenith)),
            (names.solar_zenith, self.grid(&self.solar_zenith)),
            (names.red, self.grid(&self.red)),
            (names.nir, self.grid(&self.nir)),
            (names.green, self.grid(&self.green)),
            (names.ndvi, self.grid(&self.nir)),
        ];
        layers
            .into_iter()
            .filter_map(|(name, grid)| name.map(|n| (n, grid)))
            .collect()
    }
}
