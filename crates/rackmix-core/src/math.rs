//! Level conversions, voltage guards and master-bus clipping.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Voltage conventions
//!
//! Signals in a modular rack are voltages, nominally ±5 V for audio with
//! ±10 V as the practical output ceiling. Every externally read voltage is
//! passed through [`clamp_voltage`] before it reaches any filter or gain
//! stage, so nothing downstream ever sees more than [`VOLTAGE_LIMIT`].
//!
//! # Master clipping
//!
//! | Function | Linear region | Ceiling | Knee |
//! |----------|---------------|---------|------|
//! | [`soft_clip_master`] | ±6 V | ±10 V (reached at 12 V) | cubic, C1-continuous |
//! | [`hard_clip_master`] | ±10 V | ±10 V | none |

use libm::{expf, logf, powf};

/// Absolute limit applied to every voltage read from a host port.
pub const VOLTAGE_LIMIT: f32 = 20.0;

/// Upper edge of the linear region of the master clipper.
pub const CLIP_KNEE_V: f32 = 6.0;

/// Input level at which the soft clipper reaches its ceiling.
pub const CLIP_SATURATION_IN_V: f32 = 12.0;

/// Output ceiling of both master clippers.
pub const CLIP_CEILING_V: f32 = 10.0;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use rackmix_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Inputs at or below `1e-10` read as -200 dB.
///
/// # Example
/// ```rust
/// use rackmix_core::linear_to_db;
///
/// assert!(linear_to_db(1.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Clamp a voltage read from a host port to ±[`VOLTAGE_LIMIT`].
///
/// Non-finite inputs (NaN from a misbehaving upstream module) read as 0 V.
#[inline]
pub fn clamp_voltage(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(-VOLTAGE_LIMIT, VOLTAGE_LIMIT)
    }
}

/// Map a linear fader position to gain: `fader^exponent`.
///
/// Negative positions are treated as zero so the result is monotonically
/// non-decreasing over any domain.
#[inline]
pub fn fader_to_gain(fader: f32, exponent: f32) -> f32 {
    powf(fader.max(0.0), exponent)
}

/// Inverse of [`fader_to_gain`]: the fader position producing `gain`.
#[inline]
pub fn gain_to_fader(gain: f32, exponent: f32) -> f32 {
    powf(gain.max(0.0), 1.0 / exponent)
}

/// Unipolar soft clipper for the master bus.
///
/// Identity up to [`CLIP_KNEE_V`], then the cubic `6 + t - t³/108`
/// (`t = x - 6`), which meets the line with matching value and slope at 6 V
/// and flattens to exactly 10 V with zero slope at 12 V. Constant 10 V above.
/// Expects `x >= 0`; callers apply it to `|x|` and restore the sign.
#[inline]
pub fn soft_clip_unipolar(x: f32) -> f32 {
    if x <= CLIP_KNEE_V {
        x
    } else if x <= CLIP_SATURATION_IN_V {
        let t = x - CLIP_KNEE_V;
        CLIP_KNEE_V + t - t * t * t / 108.0
    } else {
        CLIP_CEILING_V
    }
}

/// Bipolar master soft clip built on [`soft_clip_unipolar`].
///
/// # Example
/// ```rust
/// use rackmix_core::soft_clip_master;
///
/// assert_eq!(soft_clip_master(3.0), 3.0);
/// assert!((soft_clip_master(-12.0) + 10.0).abs() < 1e-5);
/// ```
#[inline]
pub fn soft_clip_master(x: f32) -> f32 {
    if x >= 0.0 {
        soft_clip_unipolar(x)
    } else {
        -soft_clip_unipolar(-x)
    }
}

/// Bipolar master hard clip: straight clamp to ±[`CLIP_CEILING_V`].
#[inline]
pub fn hard_clip_master(x: f32) -> f32 {
    x.clamp(-CLIP_CEILING_V, CLIP_CEILING_V)
}

/// Linear interpolation between two values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Flush subnormal-range floats to zero.
///
/// Filter feedback paths decay toward zero indefinitely; values below
/// `1e-20` are replaced with zero before they reach the subnormal range.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
