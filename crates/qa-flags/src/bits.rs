//! QA channels, named flags and bit tests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A per-pixel QA layer of a tile. Which subdataset backs a channel depends
/// on the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    /// State QA word (cloud, shadow, land/water, aerosol, snow).
    State,
    /// MODIS band quality word (correction and per-band quality).
    Qa,
    /// VIIRS quality flags word 2 (aerosol).
    Qf2,
    /// VIIRS quality flags word 4 (per-band quality).
    Qf4,
    /// Pixel reliability of the pre-generated VI products.
    Reliability,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::State => "state",
            Channel::Qa => "qa",
            Channel::Qf2 => "qf2",
            Channel::Qf4 => "qf4",
            Channel::Reliability => "reliability",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Quality dimensions decoded from QA words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QaFlag {
    /// Band-quality combination marking the retrieval as bad.
    BadPixel,
    /// Internal cloud algorithm flag.
    InternalCloud,
    CloudShadow,
    /// Atmospheric correction was not performed.
    Uncorrected,
    /// Aerosol quantity fell back to climatology.
    ClimatologyAerosol,
    HighAerosol,
    /// Snow or ice, as used for ranking.
    Snow,
    /// Cloud state bits report anything other than clear.
    Cloudy,
    CloudAdjacent,
    /// Aerosol quantity is anything but "low".
    NotLowAerosol,
    /// MOD35 snow/ice bit.
    Mod35Snow,
    /// Land/water class is not one of the accepted land classes.
    LandWaterMismatch,
    /// Pixel reliability is anything but "good data".
    Unreliable,
}

impl QaFlag {
    pub fn name(&self) -> &'static str {
        match self {
            QaFlag::BadPixel => "bad pixel",
            QaFlag::InternalCloud => "internal cloud",
            QaFlag::CloudShadow => "cloud shadow",
            QaFlag::Uncorrected => "uncorrected",
            QaFlag::ClimatologyAerosol => "climatology aerosol",
            QaFlag::HighAerosol => "high aerosol",
            QaFlag::Snow => "snow",
            QaFlag::Cloudy => "cloudy",
            QaFlag::CloudAdjacent => "cloud adjacent",
            QaFlag::NotLowAerosol => "not low aerosol",
            QaFlag::Mod35Snow => "MOD35 snow/ice",
            QaFlag::LandWaterMismatch => "land/water mismatch",
            QaFlag::Unreliable => "unreliable",
        }
    }
}

impl fmt::Display for QaFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Comparison applied to `raw & mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    NonZero,
    Equals(u32),
    NotEquals(u32),
    AnyOf(&'static [u32]),
    NoneOf(&'static [u32]),
}

/// A mask plus the comparison that makes the flag true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitTest {
    pub mask: u32,
    pub matches: Match,
}

impl BitTest {
    pub const fn non_zero(mask: u32) -> Self {
        Self {
            mask,
            matches: Match::NonZero,
        }
    }

    pub const fn equals(mask: u32, value: u32) -> Self {
        Self {
            mask,
            matches: Match::Equals(value),
        }
    }

    pub const fn not_equals(mask: u32, value: u32) -> Self {
        Self {
            mask,
            matches: Match::NotEquals(value),
        }
    }

    pub const fn any_of(mask: u32, values: &'static [u32]) -> Self {
        Self {
            mask,
            matches: Match::AnyOf(values),
        }
    }

    pub const fn none_of(mask: u32, values: &'static [u32]) -> Self {
        Self {
            mask,
            matches: Match::NoneOf(values),
        }
    }

    /// Evaluate the test against one raw QA word.
    #[inline]
    pub fn test(&self, raw: u32) -> bool {
        let bits = raw & self.mask;
        match self.matches {
            Match::NonZero => bits != 0,
            Match::Equals(v) => bits == v,
            Match::NotEquals(v) => bits != v,
            Match::AnyOf(values) => values.contains(&bits),
            Match::NoneOf(values) => !values.contains(&bits),
        }
    }
}
