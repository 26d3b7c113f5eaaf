//! Mixer dimensions and channel addressing.

use core::fmt;

use crate::error::MixerError;

/// Width of the solo and link bitmasks: one bit per track and per group.
pub const MAX_MASK_CHANNELS: usize = 32;

/// Width of the aux solo bitmask.
pub const MAX_AUXES: usize = 32;

/// Number of tracks, groups and aux returns of one mixer instance.
///
/// Fixed for the lifetime of a [`Mixer`](crate::Mixer); every per-channel
/// array is sized from it once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixerLayout {
    /// Input tracks
    pub tracks: usize,
    /// Group buses
    pub groups: usize,
    /// Aux return buses
    pub auxes: usize,
}

impl MixerLayout {
    /// Full-size mixer: 16 tracks, 4 groups, 4 aux returns.
    pub const FULL: Self = Self {
        tracks: 16,
        groups: 4,
        auxes: 4,
    };

    /// Compact mixer: 8 tracks, 2 groups, 4 aux returns.
    pub const JUNIOR: Self = Self {
        tracks: 8,
        groups: 2,
        auxes: 4,
    };

    /// Build and validate a layout.
    pub fn new(tracks: usize, groups: usize, auxes: usize) -> Result<Self, MixerError> {
        let layout = Self {
            tracks,
            groups,
            auxes,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Check that every bitmask fits.
    pub fn validate(&self) -> Result<(), MixerError> {
        if self.tracks == 0 {
            return Err(MixerError::NoTracks);
        }
        if self.tracks + self.groups > MAX_MASK_CHANNELS {
            return Err(MixerError::TooManyChannels {
                tracks: self.tracks,
                groups: self.groups,
            });
        }
        if self.auxes > MAX_AUXES {
            return Err(MixerError::TooManyAuxes(self.auxes));
        }
        Ok(())
    }

    /// Tracks plus groups: the number of bits used in the solo and link masks.
    #[inline]
    pub fn mask_channels(&self) -> usize {
        self.tracks + self.groups
    }

    /// Solo/link mask bit of a channel, or `None` for aux returns and master.
    #[inline]
    pub fn mask_index(&self, channel: ChannelId) -> Option<usize> {
        match channel {
            ChannelId::Track(t) if t < self.tracks => Some(t),
            ChannelId::Group(g) if g < self.groups => Some(self.tracks + g),
            _ => None,
        }
    }

    /// Inverse of [`mask_index`](Self::mask_index).
    pub fn channel_at(&self, mask_index: usize) -> Option<ChannelId> {
        if mask_index < self.tracks {
            Some(ChannelId::Track(mask_index))
        } else if mask_index < self.mask_channels() {
            Some(ChannelId::Group(mask_index - self.tracks))
        } else {
            None
        }
    }
}

impl Default for MixerLayout {
    fn default() -> Self {
        Self::FULL
    }
}

/// A channel strip, addressed by kind and zero-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    /// Input track
    Track(usize),
    /// Group bus
    Group(usize),
    /// Aux return
    Aux(usize),
    /// Master bus
    Master,
}

impl fmt::Display for ChannelId {
    /// One-based, the way channels are labelled on the panel.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Track(i) => write!(f, "Track {}", i + 1),
            Self::Group(i) => write!(f, "Group {}", i + 1),
            Self::Aux(i) => write!(f, "Aux {}", i + 1),
            Self::Master => write!(f, "Master"),
        }
    }
}
