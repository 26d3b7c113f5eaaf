//! Rackmix Mixer - track, group, aux-return and master routing engine
//!
//! A sample-accurate mixer for a modular rack: every stage combines gain
//! staging, panning, mute/solo and fade automation, and the whole mixer
//! runs one frame per call with no allocation.
//!
//! # Stages
//!
//! - [`MixerTrack`] - Input strip with gain adjust, HPF/LPF, insert point
//!   and direct out
//! - [`MixerGroup`] - Sums its member tracks, then the same fader/pan/mute path
//! - [`MixerAux`] - Aux effect return
//! - [`MixerMaster`] - Chain input, mono, dim, DC blocker and clipper
//! - [`GlobalInfo`] - Control plane: solo masks, group usage, linked faders
//!
//! [`Mixer`] owns all of them and runs them in topological order.
//!
//! # Parameters
//!
//! Host-facing controls live in one flat [`ParamBank`](rackmix_core::ParamBank)
//! shared through an `Arc`. [`ParamMap`] gives typed handles into it; menu
//! options that are not host parameters live in each stage's `settings`.
//!
//! # Two-rate processing
//!
//! Pan laws, fade envelopes and change detection run on an eco tick every
//! [`EcoMode::divisor`] samples. Gain smoothing and summation run every
//! sample.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rackmix_core::Jack;
//! use rackmix_mixer::{Mixer, MixerInputs, MixerLayout, MixerOutputs};
//!
//! let layout = MixerLayout::JUNIOR;
//! let mut mixer = Mixer::new(layout, 48000.0).unwrap();
//! let params = Arc::clone(mixer.params());
//! let pan = mixer.param_map().tracks[0].strip.pan;
//! params.set(pan, 0.0);
//!
//! let mut inputs: MixerInputs = MixerInputs::new(&layout);
//! inputs.tracks[0].left = Jack::mono(1.0);
//! let mut outputs = MixerOutputs::new(&layout);
//! for _ in 0..4800 {
//!     mixer.process(&inputs, &mut outputs);
//! }
//! // Default mono law is equal power: hard left is +3 dB
//! assert!((outputs.main.0 - core::f32::consts::SQRT_2).abs() < 1e-4);
//! assert!(outputs.main.1.abs() < 1e-6);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod aux_return;
pub mod error;
pub mod fade;
pub mod global;
pub mod group;
pub mod layout;
pub mod master;
pub mod mixer;
pub mod pan_law;
pub mod params;
pub mod settings;
pub mod strip;
pub mod track;

pub use aux_return::{AuxPorts, MixerAux, calc_aux_solo_gain};
pub use error::MixerError;
pub use fade::{FadeEnvelope, is_fade_rate};
pub use global::{ChainMode, EcoMode, GlobalInfo, resolve_group};
pub use group::{GroupPorts, MixerGroup, calc_group_solo_gain};
pub use layout::{ChannelId, MAX_AUXES, MAX_MASK_CHANNELS, MixerLayout};
pub use master::{MasterPorts, MixerMaster};
pub use mixer::{METER_PUBLISH_INTERVAL, METER_STRIDE, Mixer, MixerInputs, MixerOutputs};
pub use pan_law::{
    MonoPanLaw, PanCache, PanLawSignature, StereoPanLaw, mono_pan_matrix, stereo_pan_matrix,
};
pub use params::{
    FADER_SCALING_EXPONENT, MAX_FADE_RATE, MAX_FADER, MIN_FADE_RATE, MasterParams, ParamMap,
    StripParams, TrackParams,
};
pub use settings::{
    BusSettings, ClipMode, DEFAULT_DIM_GAIN_DB, FADE_PROFILE_RANGE, FilterPos, LocalSettings,
    MasterSettings, TapPoint, TrackSettings,
};
pub use strip::{StripCore, Taps};
pub use track::{MixerTrack, TrackPorts, calc_solo_gain};
