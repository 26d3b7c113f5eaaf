//! Rackmix Core - DSP primitives for a modular-rack mixer
//!
//! The building blocks shared by every stage of the rackmix signal path,
//! designed for a real-time audio callback that runs once per sample with
//! zero allocation.
//!
//! # Core Abstractions
//!
//! ## Gain staging
//!
//! - [`Gain4`] - Four-lane gain vector for stereo pan matrices
//! - [`SlewLimiter`] / [`Slewer4`] - Constant-rate, click-free gain smoothing
//! - [`fader_to_gain`] - Exponential fader taper
//! - [`fade_shape`] - Exponential/linear/logarithmic fade curves
//!
//! ## Filters
//!
//! - [`CutFilter`] - Stereo 12 dB/oct highpass or lowpass with an "off" position
//! - [`StereoDcBlocker`] - Master-bus DC removal
//!
//! ## Metering
//!
//! - [`VuMeter`] - Stereo peak and RMS envelopes
//!
//! ## Host contracts
//!
//! - [`ParamBank`] - Flat array of atomic parameters addressed by [`ParamHandle`]
//! - [`AudioPort`] / [`Jack`] - Polyphonic jacks with ±20 V read clamping
//! - [`SnapshotCell`] - Try-only exchange of multi-value state between threads
//!
//! ## Utilities
//!
//! - Level conversions: [`db_to_linear`], [`linear_to_db`]
//! - Master clipping: [`soft_clip_master`], [`hard_clip_master`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (with `alloc` for the parameter bank
//! and snapshot cell). Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! rackmix-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod curve;
pub mod dc_blocker;
pub mod filter;
pub mod lanes;
pub mod math;
pub mod param;
pub mod port;
pub mod slew;
pub mod snapshot;
pub mod vu;

pub use curve::{fade_shape, fade_shape_inverse};
pub use dc_blocker::StereoDcBlocker;
pub use filter::{
    Biquad, CutFilter, CutKind, HPF_OFF_HZ, LPF_OFF_HZ, highpass_coefficients, lowpass_coefficients,
};
pub use lanes::Gain4;
pub use math::{
    CLIP_CEILING_V, VOLTAGE_LIMIT, clamp_voltage, db_to_linear, fader_to_gain, flush_denormal,
    gain_to_fader, hard_clip_master, lerp, linear_to_db, soft_clip_master, soft_clip_unipolar,
};
pub use param::{ParamBank, ParamDescriptor, ParamHandle, ParamUnit};
pub use port::{AudioPort, Jack, MAX_POLY_CHANNELS};
pub use slew::{ANTIPOP_SLEW_FAST, ANTIPOP_SLEW_SLOW, SlewLimiter, Slewer4};
pub use snapshot::{HoldGuard, Snapshot, SnapshotCell};
pub use vu::{VU_DECAY_RATE, VuLevels, VuMeter};
