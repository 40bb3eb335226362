//! Bit-flag decoding for MODIS and VIIRS surface reflectance QA layers.
//!
//! Each sensor family has its own immutable bit table ([`DialectSpec`]).
//! A table maps a [`QaFlag`] to the QA [`Channel`] it is read from and the
//! [`BitTest`] that decides it. Flags a dialect does not define are absent
//! from its table, and callers treat that as "never set".
//!
//! ```
//! use qa_flags::{dialect_for, QaFlag};
//! use vi_common::Sensor;
//!
//! let modis = dialect_for(Sensor::Modis);
//! assert_eq!(modis.test(QaFlag::CloudShadow, 0b100), Some(true));
//! assert_eq!(dialect_for(Sensor::Viirs).test(QaFlag::Uncorrected, 0b11), None);
//! ```

pub mod bits;
pub mod dialect;
pub mod water;

pub use bits::{BitTest, Channel, Match, QaFlag};
pub use dialect::{dialect_for, DialectSpec, FlagRule, MODIS, VIIRS};
pub use water::WaterTable;
