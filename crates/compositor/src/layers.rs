//! Per-tile quality inputs of the ranker.

use std::collections::BTreeMap;

use qa_flags::Channel;
use vi_common::{PixelGrid, ViError, ViResult};

/// Raw QA words of one tile, keyed by channel.
#[derive(Debug, Clone, Default)]
pub struct QaChannels {
    grids: BTreeMap<Channel, PixelGrid<u32>>,
}

impl QaChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel. Every channel of a tile must share one shape.
    pub fn insert(&mut self, channel: Channel, grid: PixelGrid<u32>) -> ViResult<()> {
        if let Some(existing) = self.grids.values().next() {
            existing.ensure_same_shape(&grid)?;
        }
        self.grids.insert(channel, grid);
        Ok(())
    }

    pub fn with(mut self, channel: Channel, grid: PixelGrid<u32>) -> ViResult<Self> {
        self.insert(channel, grid)?;
        Ok(self)
    }

    /// Grid of a channel, or `MissingChannel` when the tile did not supply it.
    pub fn get(&self, channel: Channel) -> ViResult<&PixelGrid<u32>> {
        self.grids
            .get(&channel)
            .ok_or_else(|| ViError::MissingChannel(channel.to_string()))
    }

    /// Shape shared by all channels, if any were supplied.
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.grids.values().next().map(PixelGrid::shape)
    }
}

/// Everything the ranker reads from one tile.
#[derive(Debug, Clone)]
pub struct QualityLayers {
    pub channels: QaChannels,
    /// Sensor zenith, degrees ×100.
    pub view_zenith: PixelGrid<i32>,
    /// Solar zenith, degrees ×100.
    pub solar_zenith: PixelGrid<i32>,
}

impl QualityLayers {
    pub fn new(
        channels: QaChannels,
        view_zenith: PixelGrid<i32>,
        solar_zenith: PixelGrid<i32>,
    ) -> ViResult<Self> {
        view_zenith.ensure_same_shape(&solar_zenith)?;
        if let Some(shape) = channels.shape() {
            if shape != view_zenith.shape() {
                return Err(ViError::ShapeMismatch {
                    expected: view_zenith.shape(),
                    found: shape,
                });
            }
        }
        Ok(Self {
            channels,
            view_zenith,
            solar_zenith,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.view_zenith.shape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_channel() {
        let channels = QaChannels::new()
            .with(Channel::State, PixelGrid::filled(2, 2, 0))
            .unwrap();
        assert!(channels.get(Channel::State).is_ok());
        match channels.get(Channel::Qf4) {
            Err(ViError::MissingChannel(name)) => assert_eq!(name, "qf4"),
            other => panic!("expected missing channel, got {:?}", other),
        }
    }

    #[test]
    fn test_channel_shapes_must_agree() {
        let mut channels = QaChannels::new();
        channels.insert(Channel::State, PixelGrid::filled(2, 2, 0)).unwrap();
        assert!(matches!(
            channels.insert(Channel::Qa, PixelGrid::filled(3, 2, 0)),
            Err(ViError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_angle_shapes_must_agree() {
        let channels = QaChannels::new()
            .with(Channel::State, PixelGrid::filled(2, 2, 0))
            .unwrap();
        let result = QualityLayers::new(
            channels,
            PixelGrid::filled(1, 1, 0),
            PixelGrid::filled(1, 1, 0),
        );
        assert!(matches!(result, Err(ViError::ShapeMismatch { .. })));
    }
}
