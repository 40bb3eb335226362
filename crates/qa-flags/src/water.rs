//! Land/water class tables.

/// Land/water class field of the state word (bits 3-5), for both dialects.
pub const LAND_WATER_MASK: u32 = 0b111000;

/// MODIS land/water classes, already shifted into place.
pub mod modis {
    pub const SHALLOW_OCEAN: u32 = 0;
    pub const LAND: u32 = 8;
    pub const SHORELINE: u32 = 16;
    pub const SHALLOW_INLAND: u32 = 24;
    pub const EPHEMERAL: u32 = 32;
    pub const DEEP_INLAND: u32 = 40;
    pub const MODERATE_OCEAN: u32 = 48;
    pub const DEEP_OCEAN: u32 = 56;
}

/// VIIRS land/water classes, already shifted into place.
pub mod viirs {
    pub const LAND_DESERT: u32 = 0;
    pub const LAND: u32 = 8;
    pub const INLAND_WATER: u32 = 16;
    pub const SEA_WATER: u32 = 24;
    pub const COASTAL: u32 = 40;
}

/// How a dialect turns a state word into water decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterTable {
    pub mask: u32,
    /// Classes treated as water.
    pub water_classes: &'static [u32],
    /// An all-zero state word is not flagged in the water mask even when
    /// its class would be water. Ranking still excludes it.
    pub zero_state_is_land: bool,
    /// Class whose view angle is never trusted for tie-breaking.
    pub ephemeral_class: Option<u32>,
}

impl WaterTable {
    #[inline]
    pub fn class(&self, state: u32) -> u32 {
        state & self.mask
    }

    /// Pixel is water for the purpose of ranking (rank 0).
    #[inline]
    pub fn excludes_from_rank(&self, state: u32) -> bool {
        self.water_classes.contains(&self.class(state))
    }

    /// Pixel belongs in the water mask.
    #[inline]
    pub fn is_water(&self, state: u32) -> bool {
        if self.zero_state_is_land && state == 0 {
            return false;
        }
        self.excludes_from_rank(state)
    }

    /// View angle at this pixel is replaced by the invalid sentinel.
    #[inline]
    pub fn invalidates_view_angle(&self, state: u32) -> bool {
        self.ephemeral_class == Some(self.class(state))
    }
}
