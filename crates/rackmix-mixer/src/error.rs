//! Construction-time errors.
//!
//! The per-sample path never fails; out-of-range inputs are clamped where
//! they are read. Only building a mixer for an impossible layout is an error.

use core::fmt;

/// Errors from building a [`Mixer`](crate::Mixer) or its parameter map.
#[derive(Debug, Clone, PartialEq)]
pub enum MixerError {
    /// A mixer needs at least one track.
    NoTracks,
    /// Tracks plus groups exceed the width of the solo/link bitmasks.
    TooManyChannels {
        /// Requested track count
        tracks: usize,
        /// Requested group count
        groups: usize,
    },
    /// Aux returns exceed the width of the aux solo bitmask.
    TooManyAuxes(usize),
    /// A parameter index fell outside the bank it was resolved against.
    ParamOutOfRange(usize),
    /// Sample rate is not a positive, finite number.
    InvalidSampleRate(f32),
}

impl fmt::Display for MixerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTracks => write!(f, "a mixer needs at least one track"),
            Self::TooManyChannels { tracks, groups } => write!(
                f,
                "{tracks} tracks + {groups} groups exceed the {} channel limit",
                crate::layout::MAX_MASK_CHANNELS
            ),
            Self::TooManyAuxes(n) => write!(
                f,
                "{n} aux returns exceed the {} aux limit",
                crate::layout::MAX_AUXES
            ),
            Self::ParamOutOfRange(index) => write!(f, "parameter index {index} is out of range"),
            Self::InvalidSampleRate(rate) => write!(f, "invalid sample rate: {rate}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MixerError {}
