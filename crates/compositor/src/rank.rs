//! Quality ranking of a single tile.
//!
//! Every pixel starts at [`UNRANKED`] and is then folded through
//! [`TIER_SEQUENCE`] in order. A matching rule overwrites whatever rank the
//! pixel holds, so rules later in the sequence take precedence: a pixel that
//! is both shadowed and snow-covered ends at the snow tier. Water is applied
//! after the whole sequence and always ends at rank 0.
//!
//! Rules whose flag the tile's dialect does not define are dropped when the
//! [`Ranker`] is built, leaving whatever an earlier rule assigned.

use qa_flags::{dialect_for, DialectSpec, QaFlag};
use tracing::debug;
use vi_common::sentinel::INVALID_ANGLE;
use vi_common::{PixelGrid, Sensor, ViError, ViResult};

use crate::layers::QualityLayers;

/// Rank of a pixel no rule matched.
pub const UNRANKED: u8 = 10;

/// Rank of water pixels.
pub const WATER_RANK: u8 = 0;

/// Solar zenith (degrees ×100) beyond which the sun is too low.
pub const LOW_SUN_ZENITH: i32 = 6000;

/// Sensor zenith (degrees ×100) beyond which the view is too oblique.
pub const HIGH_VIEW_ZENITH: i32 = 8500;

/// What a tier rule matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierCondition {
    /// A decoded QA flag.
    Flag(QaFlag),
    /// Solar zenith strictly above a threshold.
    SolarZenithAbove(i32),
    /// Sanitized sensor zenith strictly above a threshold.
    ViewZenithAbove(i32),
}

/// Assign `rank` wherever `condition` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierRule {
    pub rank: u8,
    pub condition: TierCondition,
}

impl TierRule {
    const fn new(rank: u8, condition: TierCondition) -> Self {
        Self { rank, condition }
    }
}

/// Tier rules in application order.
pub static TIER_SEQUENCE: [TierRule; 9] = [
    TierRule::new(1, TierCondition::Flag(QaFlag::BadPixel)),
    TierRule::new(2, TierCondition::SolarZenithAbove(LOW_SUN_ZENITH)),
    TierRule::new(3, TierCondition::ViewZenithAbove(HIGH_VIEW_ZENITH)),
    TierRule::new(4, TierCondition::Flag(QaFlag::InternalCloud)),
    TierRule::new(5, TierCondition::Flag(QaFlag::CloudShadow)),
    TierRule::new(6, TierCondition::Flag(QaFlag::Uncorrected)),
    TierRule::new(7, TierCondition::Flag(QaFlag::ClimatologyAerosol)),
    TierRule::new(8, TierCondition::Flag(QaFlag::HighAerosol)),
    TierRule::new(9, TierCondition::Flag(QaFlag::Snow)),
];

/// Ranker output for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTile {
    pub rank: PixelGrid<u8>,
    /// Sensor zenith with degenerate and untrusted pixels set to
    /// [`INVALID_ANGLE`].
    pub view_angle: PixelGrid<i32>,
    pub water: PixelGrid<bool>,
}

/// Per-dialect quality ranker.
#[derive(Debug, Clone)]
pub struct Ranker {
    dialect: &'static DialectSpec,
    rules: Vec<TierRule>,
}

impl Ranker {
    pub fn new(dialect: &'static DialectSpec) -> Self {
        let rules = TIER_SEQUENCE
            .iter()
            .filter(|rule| match rule.condition {
                TierCondition::Flag(flag) => dialect.supports(flag),
                _ => true,
            })
            .copied()
            .collect();
        Self { dialect, rules }
    }

    pub fn for_sensor(sensor: Sensor) -> Self {
        Self::new(dialect_for(sensor))
    }

    /// Rules this ranker applies, in order.
    pub fn rules(&self) -> &[TierRule] {
        &self.rules
    }

    pub fn dialect(&self) -> &'static DialectSpec {
        self.dialect
    }

    /// Rank every pixel of a tile and derive its view-angle and water arrays.
    pub fn rank(&self, layers: &QualityLayers) -> ViResult<RankedTile> {
        let (width, height) = layers.shape();
        let state = layers.channels.get(qa_flags::Channel::State)?;
        state.ensure_same_shape(&layers.view_zenith)?;

        let sanitized = sanitize_view_zenith(&layers.view_zenith);

        let mut rank = PixelGrid::filled(width, height, UNRANKED);
        for rule in &self.rules {
            let hits = self.matches(rule.condition, layers, &sanitized)?;
            let count = hits.data.iter().filter(|&&h| h).count();
            debug!(tier = rule.rank, condition = ?rule.condition, pixels = count, "Applied tier rule");
            rank = rank.zip_map(&hits, |&r, &hit| if hit { rule.rank } else { r })?;
        }

        let water_table = &self.dialect.water;
        rank = rank.zip_map(state, |&r, &s| {
            if water_table.excludes_from_rank(s) {
                WATER_RANK
            } else {
                r
            }
        })?;

        let view_angle = sanitized.zip_map(state, |&a, &s| {
            if water_table.invalidates_view_angle(s) {
                INVALID_ANGLE
            } else {
                a
            }
        })?;

        Ok(RankedTile {
            rank,
            view_angle,
            water: self.dialect.water_mask(state),
        })
    }

    fn matches(
        &self,
        condition: TierCondition,
        layers: &QualityLayers,
        view_zenith: &PixelGrid<i32>,
    ) -> ViResult<PixelGrid<bool>> {
        match condition {
            TierCondition::Flag(flag) => {
                let channel = self.dialect.channel(flag).ok_or_else(|| {
                    ViError::unsupported(format!("{} is not defined for this sensor", flag))
                })?;
                let raw = layers.channels.get(channel)?;
                raw.ensure_same_shape(view_zenith)?;
                self.dialect.decode(flag, raw).ok_or_else(|| {
                    ViError::unsupported(format!("{} is not defined for this sensor", flag))
                })
            }
            TierCondition::SolarZenithAbove(max) => Ok(layers.solar_zenith.map(|&a| a > max)),
            TierCondition::ViewZenithAbove(max) => Ok(view_zenith.map(|&a| a > max)),
        }
    }
}

/// Map degenerate (non-positive) sensor zenith angles to [`INVALID_ANGLE`].
pub fn sanitize_view_zenith(view_zenith: &PixelGrid<i32>) -> PixelGrid<i32> {
    view_zenith.map(|&a| if a <= 0 { INVALID_ANGLE } else { a })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::QaChannels;
    use qa_flags::Channel;
    use test_utils::fixtures::{modis, viirs};

    fn modis_layers(state: Vec<u32>, qa: Vec<u32>, view: Vec<i32>, solar: Vec<i32>) -> QualityLayers {
        let w = state.len();
        let channels = QaChannels::new()
            .with(Channel::State, PixelGrid::new(w, 1, state).unwrap())
            .unwrap()
            .with(Channel::Qa, PixelGrid::new(w, 1, qa).unwrap())
            .unwrap();
        QualityLayers::new(
            channels,
            PixelGrid::new(w, 1, view).unwrap(),
            PixelGrid::new(w, 1, solar).unwrap(),
        )
        .unwrap()
    }

    fn viirs_layers(state: u32, qf2: u32, qf4: u32) -> QualityLayers {
        let channels = QaChannels::new()
            .with(Channel::State, PixelGrid::filled(1, 1, state))
            .unwrap()
            .with(Channel::Qf2, PixelGrid::filled(1, 1, qf2))
            .unwrap()
            .with(Channel::Qf4, PixelGrid::filled(1, 1, qf4))
            .unwrap();
        QualityLayers::new(channels, PixelGrid::filled(1, 1, 1500), PixelGrid::filled(1, 1, 3000))
            .unwrap()
    }

    fn single_modis(state: u32, qa: u32) -> u8 {
        let ranker = Ranker::for_sensor(Sensor::Modis);
        let layers = modis_layers(vec![state], vec![qa], vec![1500], vec![3000]);
        ranker.rank(&layers).unwrap().rank.data[0]
    }

    #[test]
    fn test_clear_pixel_is_unranked() {
        assert_eq!(single_modis(modis::CLEAR, 0), UNRANKED);
    }

    #[test]
    fn test_modis_tiers() {
        assert_eq!(single_modis(modis::CLEAR, modis::QA_BAD), 1);
        assert_eq!(single_modis(modis::CLEAR | modis::INTERNAL_CLOUD, 0), 4);
        assert_eq!(single_modis(modis::CLEAR | modis::CLOUD_SHADOW, 0), 5);
        assert_eq!(single_modis(modis::CLEAR, modis::QA_UNCORRECTED), 6);
        assert_eq!(single_modis(modis::LAND | modis::AEROSOL_CLIMATOLOGY, 0), 7);
        assert_eq!(single_modis(modis::LAND | modis::AEROSOL_HIGH, 0), 8);
        assert_eq!(single_modis(modis::SNOW, 0), 9);
        assert_eq!(single_modis(modis::CLEAR | modis::MOD35_SNOW, 0), 9);
    }

    #[test]
    fn test_later_tier_wins() {
        // shadow and snow: snow is applied last
        assert_eq!(single_modis(modis::SNOW | modis::CLOUD_SHADOW, 0), 9);
        // cloud is applied after the bad-pixel tier
        assert_eq!(single_modis(modis::CLEAR | modis::INTERNAL_CLOUD, modis::QA_BAD), 4);
        // high aerosol is applied after climatology and shadow
        assert_eq!(single_modis(modis::LAND | modis::AEROSOL_HIGH | modis::CLOUD_SHADOW, 0), 8);
    }

    #[test]
    fn test_angle_tiers() {
        let ranker = Ranker::for_sensor(Sensor::Modis);
        let layers = modis_layers(
            vec![modis::CLEAR; 4],
            vec![0; 4],
            vec![1500, 8600, 0, 8600],
            vec![6100, 3000, 3000, 6100],
        );
        let ranked = ranker.rank(&layers).unwrap();
        // high view is applied after low sun
        assert_eq!(ranked.rank.data, vec![2, 3, 3, 3]);
        assert_eq!(ranked.view_angle.data, vec![1500, 8600, INVALID_ANGLE, 8600]);
    }

    #[test]
    fn test_water_overrides_every_tier() {
        let ranker = Ranker::for_sensor(Sensor::Modis);
        let layers = modis_layers(
            vec![modis::DEEP_OCEAN | modis::INTERNAL_SNOW, 0, modis::CLEAR],
            vec![0; 3],
            vec![1500; 3],
            vec![3000; 3],
        );
        let ranked = ranker.rank(&layers).unwrap();
        assert_eq!(ranked.rank.data, vec![0, 0, UNRANKED]);
        // an all-zero state word is ranked out but not in the water mask
        assert_eq!(ranked.water.data, vec![true, false, false]);
    }

    #[test]
    fn test_modis_ephemeral_water_angle() {
        let ranker = Ranker::for_sensor(Sensor::Modis);
        let layers = modis_layers(
            vec![modis::EPHEMERAL_WATER | modis::AEROSOL_LOW],
            vec![0],
            vec![1500],
            vec![3000],
        );
        let ranked = ranker.rank(&layers).unwrap();
        assert_eq!(ranked.view_angle.data, vec![INVALID_ANGLE]);
        assert_eq!(ranked.rank.data, vec![UNRANKED]);
        assert!(!ranked.water.data[0]);
    }

    #[test]
    fn test_viirs_rules_skip_modis_only_tiers() {
        let ranker = Ranker::for_sensor(Sensor::Viirs);
        let ranks: Vec<u8> = ranker.rules().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 8, 9]);
        assert_eq!(Ranker::for_sensor(Sensor::Modis).rules().len(), TIER_SEQUENCE.len());
    }

    #[test]
    fn test_viirs_tiers() {
        let ranker = Ranker::for_sensor(Sensor::Viirs);
        let rank = |state, qf2, qf4| ranker.rank(&viirs_layers(state, qf2, qf4)).unwrap().rank.data[0];
        assert_eq!(rank(viirs::CLEAR, 0, 0), UNRANKED);
        assert_eq!(rank(viirs::CLEAR, 0, viirs::QF4_BAD), 1);
        assert_eq!(rank(viirs::CLEAR, viirs::QF2_HIGH_AEROSOL, 0), 8);
        assert_eq!(rank(viirs::CLEAR | viirs::SNOW, 0, 0), 9);
        // no climatology tier: zero aerosol bits stay unranked
        assert_eq!(rank(viirs::LAND, 0, 0), UNRANKED);
        assert_eq!(rank(viirs::SEA_WATER, 0, 0), 0);
        assert_eq!(rank(viirs::COASTAL, 0, 0), UNRANKED);
    }

    #[test]
    fn test_viirs_missing_quality_word() {
        let ranker = Ranker::for_sensor(Sensor::Viirs);
        let channels = QaChannels::new()
            .with(Channel::State, PixelGrid::filled(1, 1, viirs::CLEAR))
            .unwrap();
        let layers =
            QualityLayers::new(channels, PixelGrid::filled(1, 1, 1500), PixelGrid::filled(1, 1, 3000))
                .unwrap();
        assert!(matches!(ranker.rank(&layers), Err(ViError::MissingChannel(_))));
    }

    #[test]
    fn test_ranking_is_pure() {
        let ranker = Ranker::for_sensor(Sensor::Modis);
        let layers = modis_layers(
            vec![modis::SNOW, modis::CLEAR | modis::CLOUD_SHADOW, modis::DEEP_INLAND],
            vec![0, modis::QA_UNCORRECTED, 0],
            vec![1200, -5, 3000],
            vec![3000, 7000, 3000],
        );
        let first = ranker.rank(&layers).unwrap();
        let second = ranker.rank(&layers).unwrap();
        assert_eq!(first, second);
    }
}
