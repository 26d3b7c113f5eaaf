//! Persisted per-channel settings that are not host parameters.
//!
//! These are the menu-level options of each strip. They live on the stage
//! itself (the audio thread owns them) and change only through `&mut`
//! access between frames, typically when a session is loaded.
//!
//! [`LocalSettings`] keeps the three small enumerations that persist as one
//! packed integer. Packing and unpacking are explicit shifts, so the stored
//! value is the same on every platform:
//!
//! ```text
//! bits  0..8   direct-out tap
//! bits  8..16  stereo pan law override (0xFF = follow global)
//! bits 16..24  filter position
//! bits 24..32  reserved, written as 0
//! ```

use rackmix_core::{HPF_OFF_HZ, LPF_OFF_HZ};

use crate::pan_law::StereoPanLaw;

/// Byte value of a pan-law override that follows the global law.
pub const FOLLOW_GLOBAL: u8 = 0xFF;

/// Gain adjust range of a track input, in dB either way.
pub const GAIN_ADJUST_RANGE_DB: f32 = 20.0;

/// Highest selectable HPF cutoff.
pub const HPF_MAX_HZ: f32 = 1000.0;

/// Lowest selectable LPF cutoff.
pub const LPF_MIN_HZ: f32 = 1000.0;

/// Default dim attenuation.
pub const DEFAULT_DIM_GAIN_DB: f32 = -12.0;

/// Extent of the fade profile either way: `+100` is exponential, `0`
/// linear and `-100` logarithmic.
pub const FADE_PROFILE_RANGE: f32 = 100.0;

/// A point in a strip's signal chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TapPoint {
    /// After input gain and invert, before the insert
    PreInsert = 0,
    /// After the insert return, before the fader
    PreFader = 1,
    /// After fader and pan
    PostFader = 2,
    /// After mute, solo and fade
    #[default]
    PostMuteSolo = 3,
}

impl TapPoint {
    /// Every tap in chain order.
    pub const ALL: [Self; 4] =
        [Self::PreInsert, Self::PreFader, Self::PostFader, Self::PostMuteSolo];

    /// Tap for a persisted byte.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// Where a track's HPF/LPF sit relative to its insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FilterPos {
    /// Filters feed the insert send
    PreInsert = 0,
    /// Filters follow the insert return
    #[default]
    PostInsert = 1,
}

impl FilterPos {
    /// Position for a persisted byte.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::PreInsert),
            1 => Some(Self::PostInsert),
            _ => None,
        }
    }
}

/// The packed per-channel options.
///
/// Unknown byte values unpack to the field's default rather than failing,
/// so a value written by a newer layout still loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalSettings {
    /// Which tap feeds the channel's direct out
    pub direct_out_tap: TapPoint,
    /// Stereo pan law override; `None` follows the global law
    pub pan_law_stereo: Option<StereoPanLaw>,
    /// Filter position (tracks only)
    pub filter_pos: FilterPos,
}

impl LocalSettings {
    /// Pack into the persisted integer.
    pub fn to_packed(self) -> u32 {
        let law = self.pan_law_stereo.map_or(FOLLOW_GLOBAL, StereoPanLaw::index);
        u32::from(self.direct_out_tap as u8)
            | (u32::from(law) << 8)
            | (u32::from(self.filter_pos as u8) << 16)
    }

    /// Unpack a persisted integer.
    pub fn from_packed(packed: u32) -> Self {
        let byte = |shift: u32| ((packed >> shift) & 0xFF) as u8;
        Self {
            direct_out_tap: TapPoint::from_index(byte(0)).unwrap_or_default(),
            pan_law_stereo: StereoPanLaw::from_index(byte(8)),
            filter_pos: FilterPos::from_index(byte(16)).unwrap_or_default(),
        }
    }
}

/// Track options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSettings {
    /// Packed options
    pub local: LocalSettings,
    /// Input gain in dB, `-20..=20`
    pub gain_adjust_db: f32,
    /// Polarity invert
    pub invert: bool,
    /// Highpass cutoff; at or below 13 Hz the filter is off
    pub hpf_cutoff: f32,
    /// Lowpass cutoff; at or above 20 kHz the filter is off
    pub lpf_cutoff: f32,
    /// Fade curve, `-100` (log) to `+100` (exp)
    pub fade_profile: f32,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            local: LocalSettings::default(),
            gain_adjust_db: 0.0,
            invert: false,
            hpf_cutoff: HPF_OFF_HZ,
            lpf_cutoff: LPF_OFF_HZ,
            fade_profile: 0.0,
        }
    }
}

/// Group and aux return options.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BusSettings {
    /// Packed options
    pub local: LocalSettings,
    /// Fade curve, `-100` (log) to `+100` (exp)
    pub fade_profile: f32,
}

/// Master clipper behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClipMode {
    /// Cubic knee from 6 V, saturating at 10 V
    #[default]
    Soft,
    /// Straight clamp at ±10 V
    Hard,
}

/// Master bus options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterSettings {
    /// Fade curve, `-100` (log) to `+100` (exp)
    pub fade_profile: f32,
    /// Attenuation applied while dim is on
    pub dim_gain_db: f32,
    /// DC blocker before the clipper
    pub dc_block: bool,
    /// Clipper behaviour
    pub clip_mode: ClipMode,
}

impl Default for MasterSettings {
    fn default() -> Self {
        Self {
            fade_profile: 0.0,
            dim_gain_db: DEFAULT_DIM_GAIN_DB,
            dc_block: false,
            clip_mode: ClipMode::Soft,
        }
    }
}
