//! Per-sensor bit tables.

use vi_common::{PixelGrid, Sensor};

use crate::bits::{BitTest, Channel, QaFlag};
use crate::water::{WaterTable, LAND_WATER_MASK};

/// One entry of a dialect's bit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagRule {
    pub flag: QaFlag,
    pub channel: Channel,
    pub test: BitTest,
}

impl FlagRule {
    const fn new(flag: QaFlag, channel: Channel, test: BitTest) -> Self {
        Self {
            flag,
            channel,
            test,
        }
    }
}

/// Bit layout and water semantics of one sensor family.
#[derive(Debug)]
pub struct DialectSpec {
    pub sensor: Sensor,
    pub flags: &'static [FlagRule],
    pub water: WaterTable,
}

const STATE_BIT_2: u32 = 1 << 2;
const STATE_BIT_10: u32 = 1 << 10;
const STATE_BIT_12: u32 = 1 << 12;
const STATE_BIT_13: u32 = 1 << 13;
const STATE_BIT_15: u32 = 1 << 15;
const AEROSOL_MASK: u32 = 0b1100_0000;
const AEROSOL_CLIMATOLOGY: u32 = 0;
const AEROSOL_LOW: u32 = 64;
const AEROSOL_HIGH: u32 = 192;
const CLOUD_STATE_MASK: u32 = 0b11;
const ACCEPTED_LAND_CLASSES: &[u32] = &[8, 16, 32];

/// MODIS band-quality bits 2-5 and 7-9 that together mark a bad retrieval.
const MODIS_BAD_MASK: u32 = 0b11_1100 | 0b11_1000_0000;
const MODIS_BAD_VALUES: &[u32] = &[112, 896, 952];

static MODIS_FLAGS: [FlagRule; 13] = [
    FlagRule::new(QaFlag::BadPixel, Channel::Qa, BitTest::any_of(MODIS_BAD_MASK, MODIS_BAD_VALUES)),
    FlagRule::new(QaFlag::InternalCloud, Channel::State, BitTest::non_zero(STATE_BIT_10)),
    FlagRule::new(QaFlag::CloudShadow, Channel::State, BitTest::equals(STATE_BIT_2, STATE_BIT_2)),
    FlagRule::new(QaFlag::Uncorrected, Channel::Qa, BitTest::equals(0b11, 3)),
    FlagRule::new(QaFlag::ClimatologyAerosol, Channel::State, BitTest::equals(AEROSOL_MASK, AEROSOL_CLIMATOLOGY)),
    FlagRule::new(QaFlag::HighAerosol, Channel::State, BitTest::equals(AEROSOL_MASK, AEROSOL_HIGH)),
    FlagRule::new(QaFlag::Snow, Channel::State, BitTest::non_zero(STATE_BIT_12 | STATE_BIT_15)),
    FlagRule::new(QaFlag::Cloudy, Channel::State, BitTest::non_zero(CLOUD_STATE_MASK)),
    FlagRule::new(QaFlag::CloudAdjacent, Channel::State, BitTest::non_zero(STATE_BIT_13)),
    FlagRule::new(QaFlag::NotLowAerosol, Channel::State, BitTest::not_equals(AEROSOL_MASK, AEROSOL_LOW)),
    FlagRule::new(QaFlag::Mod35Snow, Channel::State, BitTest::non_zero(STATE_BIT_12)),
    FlagRule::new(QaFlag::LandWaterMismatch, Channel::State, BitTest::none_of(LAND_WATER_MASK, ACCEPTED_LAND_CLASSES)),
    FlagRule::new(QaFlag::Unreliable, Channel::Reliability, BitTest::non_zero(u32::MAX)),
];

// VIIRS has no uncorrected or climatology-aerosol flag, and its aerosol and
// band quality live in the QF2/QF4 words.
static VIIRS_FLAGS: [FlagRule; 10] = [
    FlagRule::new(QaFlag::BadPixel, Channel::Qf4, BitTest::non_zero(0b110)),
    FlagRule::new(QaFlag::InternalCloud, Channel::State, BitTest::non_zero(STATE_BIT_10)),
    FlagRule::new(QaFlag::CloudShadow, Channel::State, BitTest::non_zero(STATE_BIT_2)),
    FlagRule::new(QaFlag::HighAerosol, Channel::Qf2, BitTest::non_zero(0b1_0000)),
    FlagRule::new(QaFlag::Snow, Channel::State, BitTest::non_zero(STATE_BIT_15)),
    FlagRule::new(QaFlag::Cloudy, Channel::State, BitTest::non_zero(CLOUD_STATE_MASK)),
    FlagRule::new(QaFlag::CloudAdjacent, Channel::State, BitTest::non_zero(STATE_BIT_13)),
    FlagRule::new(QaFlag::NotLowAerosol, Channel::State, BitTest::not_equals(AEROSOL_MASK, AEROSOL_LOW)),
    FlagRule::new(QaFlag::Mod35Snow, Channel::State, BitTest::non_zero(STATE_BIT_12)),
    FlagRule::new(QaFlag::LandWaterMismatch, Channel::State, BitTest::none_of(LAND_WATER_MASK, ACCEPTED_LAND_CLASSES)),
];

/// MODIS (Terra/Aqua) dialect.
pub static MODIS: DialectSpec = DialectSpec {
    sensor: Sensor::Modis,
    flags: &MODIS_FLAGS,
    water: WaterTable {
        mask: LAND_WATER_MASK,
        water_classes: &[0, 24, 40, 48, 56],
        zero_state_is_land: true,
        ephemeral_class: Some(32),
    },
};

/// VIIRS (Suomi NPP) dialect.
pub static VIIRS: DialectSpec = DialectSpec {
    sensor: Sensor::Viirs,
    flags: &VIIRS_FLAGS,
    water: WaterTable {
        mask: LAND_WATER_MASK,
        water_classes: &[16, 24, 32, 48, 56],
        zero_state_is_land: false,
        ephemeral_class: None,
    },
};

/// Select the dialect for a sensor family.
pub fn dialect_for(sensor: Sensor) -> &'static DialectSpec {
    match sensor {
        Sensor::Modis => &MODIS,
        Sensor::Viirs => &VIIRS,
    }
}

impl DialectSpec {
    /// Table entry for a flag, if this dialect defines it.
    pub fn rule(&self, flag: QaFlag) -> Option<&FlagRule> {
        self.flags.iter().find(|r| r.flag == flag)
    }

    pub fn supports(&self, flag: QaFlag) -> bool {
        self.rule(flag).is_some()
    }

    /// Channel a flag is read from.
    pub fn channel(&self, flag: QaFlag) -> Option<Channel> {
        self.rule(flag).map(|r| r.channel)
    }

    /// Evaluate a flag on one raw word of its channel.
    pub fn test(&self, flag: QaFlag, raw: u32) -> Option<bool> {
        self.rule(flag).map(|r| r.test.test(raw))
    }

    /// Decode a flag over a whole QA grid of its channel.
    ///
    /// Returns `None` when the dialect does not define the flag. The grid
    /// must be the channel named by [`DialectSpec::channel`]; passing a
    /// different layer decodes garbage.
    pub fn decode(&self, flag: QaFlag, raw: &PixelGrid<u32>) -> Option<PixelGrid<bool>> {
        let rule = self.rule(flag)?;
        Some(raw.map(|&word| rule.test.test(word)))
    }

    /// Water mask of a state grid.
    pub fn water_mask(&self, state: &PixelGrid<u32>) -> PixelGrid<bool> {
        state.map(|&s| self.water.is_water(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modis_bad_pixel_values() {
        // bits 7-9 set, 2-5 clear
        assert_eq!(MODIS.test(QaFlag::BadPixel, 0b11_1000_0000), Some(true));
        // bits 7-9 and 3-5 set
        assert_eq!(MODIS.test(QaFlag::BadPixel, 952), Some(true));
        // bit 6 lies outside both fields, so 112 can never be produced
        assert_eq!(MODIS.test(QaFlag::BadPixel, 112), Some(false));
        assert_eq!(MODIS.test(QaFlag::BadPixel, 0), Some(false));
        // correction bits 0-1 and bit 6 are ignored
        assert_eq!(MODIS.test(QaFlag::BadPixel, 952 | 0b100_0011), Some(true));
    }

    #[test]
    fn test_modis_aerosol_levels() {
        assert_eq!(MODIS.test(QaFlag::ClimatologyAerosol, 0b0000_1000), Some(true));
        assert_eq!(MODIS.test(QaFlag::ClimatologyAerosol, 0b0100_1000), Some(false));
        assert_eq!(MODIS.test(QaFlag::HighAerosol, 0b1100_1000), Some(true));
        assert_eq!(MODIS.test(QaFlag::HighAerosol, 0b1000_1000), Some(false));
        assert_eq!(MODIS.test(QaFlag::NotLowAerosol, 0b0100_1000), Some(false));
        assert_eq!(MODIS.test(QaFlag::NotLowAerosol, 0b1000_1000), Some(true));
    }

    #[test]
    fn test_modis_snow_either_bit() {
        assert_eq!(MODIS.test(QaFlag::Snow, 1 << 12), Some(true));
        assert_eq!(MODIS.test(QaFlag::Snow, 1 << 15), Some(true));
        assert_eq!(MODIS.test(QaFlag::Snow, 1 << 11), Some(false));
        assert_eq!(MODIS.test(QaFlag::Mod35Snow, 1 << 15), Some(false));
    }

    #[test]
    fn test_viirs_snow_bit_15_only() {
        assert_eq!(VIIRS.test(QaFlag::Snow, 1 << 15), Some(true));
        assert_eq!(VIIRS.test(QaFlag::Snow, 1 << 12), Some(false));
    }

    #[test]
    fn test_viirs_channels() {
        assert_eq!(VIIRS.channel(QaFlag::BadPixel), Some(Channel::Qf4));
        assert_eq!(VIIRS.channel(QaFlag::HighAerosol), Some(Channel::Qf2));
        assert_eq!(MODIS.channel(QaFlag::HighAerosol), Some(Channel::State));
        assert_eq!(VIIRS.test(QaFlag::BadPixel, 0b010), Some(true));
        assert_eq!(VIIRS.test(QaFlag::BadPixel, 0b001), Some(false));
        assert_eq!(VIIRS.test(QaFlag::HighAerosol, 0b1_0000), Some(true));
    }

    #[test]
    fn test_viirs_lacks_modis_only_tiers() {
        assert!(!VIIRS.supports(QaFlag::Uncorrected));
        assert!(!VIIRS.supports(QaFlag::ClimatologyAerosol));
        assert!(!VIIRS.supports(QaFlag::Unreliable));
        assert!(MODIS.supports(QaFlag::Uncorrected));
    }

    #[test]
    fn test_decode_grid() {
        let state = PixelGrid::new(2, 2, vec![0, 1 << 10, 0b100, 1 << 10 | 0b100]).unwrap();
        let cloud = MODIS.decode(QaFlag::InternalCloud, &state).unwrap();
        assert_eq!(cloud.data, vec![false, true, false, true]);
        let shadow = MODIS.decode(QaFlag::CloudShadow, &state).unwrap();
        assert_eq!(shadow.data, vec![false, false, true, true]);
        assert!(VIIRS.decode(QaFlag::Uncorrected, &state).is_none());
    }

    #[test]
    fn test_dialect_selection() {
        assert_eq!(dialect_for(Sensor::Modis).sensor, Sensor::Modis);
        assert_eq!(dialect_for(Sensor::Viirs).sensor, Sensor::Viirs);
    }
}
