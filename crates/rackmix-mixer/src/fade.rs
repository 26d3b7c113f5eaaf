//! Mute/fade envelope shared by every channel strip.
//!
//! The envelope turns a mute target (0 = muted, 1 = open) into a fade gain.
//! Below [`MIN_FADE_RATE`] it is a plain switch. At or above it, a linear
//! position `x` integrates toward the end of the fade at
//! `sample_time / fade_rate` per sample and the gain is `x` mapped through
//! the fade curve ([`fade_shape`]).
//!
//! Two restart behaviours exist when the target flips mid-fade:
//!
//! - **Asymmetric** (default): `x` restarts at 0 and the curve is rescaled
//!   to run from the current gain to the new target. Fade-in and fade-out
//!   each take the full fade time.
//! - **Symmetrical**: `x` is mirrored onto the curve at the current gain and
//!   then runs backward or forward, so a fade-out retraces the fade-in shape.
//!
//! Either way the gain itself never jumps: `x` is the integrator, not the gain.

use rackmix_core::{fade_shape, fade_shape_inverse, fader_to_gain};

use crate::params::MIN_FADE_RATE;

/// True when `fade_rate` selects timed fades rather than instant muting.
#[inline]
pub fn is_fade_rate(fade_rate: f32) -> bool {
    fade_rate >= MIN_FADE_RATE
}

/// Fade state of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeEnvelope {
    fade_gain: f32,
    fade_gain_x: f32,
    fade_start: f32,
    target: f32,
}

impl FadeEnvelope {
    /// An open (unmuted) envelope.
    pub fn new() -> Self {
        Self::settled(1.0)
    }

    /// An envelope resting at `target`.
    pub fn settled(target: f32) -> Self {
        Self {
            fade_gain: target,
            fade_gain_x: target,
            fade_start: target,
            target,
        }
    }

    /// Current fade gain in `[0, 1]`.
    #[inline]
    pub fn gain(&self) -> f32 {
        self.fade_gain
    }

    /// Curve position of the fade in progress.
    #[inline]
    pub fn position(&self) -> f32 {
        self.fade_gain_x
    }

    /// Last commanded target.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether a timed fade is still moving.
    pub fn is_fading(&self) -> bool {
        self.fade_gain != self.target
    }

    /// Fade gain raised to the fader exponent, for mixing.
    #[inline]
    pub fn scaled_gain(&self, exponent: f32) -> f32 {
        fader_to_gain(self.fade_gain, exponent)
    }

    /// Snap to `target` with no fade.
    pub fn reset_to(&mut self, target: f32) {
        *self = Self::settled(target);
    }

    /// Advance by one control tick.
    ///
    /// `step_time` is the time since the previous call: one sample period,
    /// or the eco divisor times that when running at control rate.
    /// `profile` is the normalised fade curve in `[-1, 1]`, a settings
    /// profile divided by
    /// [`FADE_PROFILE_RANGE`](crate::settings::FADE_PROFILE_RANGE).
    /// Symmetrical fades assume targets of 0 or 1.
    pub fn process(
        &mut self,
        target: f32,
        fade_rate: f32,
        profile: f32,
        symmetrical: bool,
        step_time: f32,
    ) {
        let target = target.clamp(0.0, 1.0);
        if !is_fade_rate(fade_rate) {
            self.reset_to(target);
            return;
        }

        if target != self.target {
            self.target = target;
            self.fade_start = self.fade_gain;
            self.fade_gain_x = if symmetrical {
                fade_shape_inverse(self.fade_gain, profile)
            } else {
                0.0
            };
        }
        if self.fade_gain == self.target {
            return;
        }

        let delta_x = step_time / fade_rate;
        if symmetrical {
            self.fade_gain_x = if self.target > self.fade_gain {
                (self.fade_gain_x + delta_x).min(1.0)
            } else {
                (self.fade_gain_x - delta_x).max(0.0)
            };
            let shaped = fade_shape(self.fade_gain_x, profile);
            // Symmetric curves run between the endpoints; settle on the target
            self.fade_gain = if self.fade_gain_x >= 1.0 || self.fade_gain_x <= 0.0 {
                self.target
            } else {
                shaped
            };
        } else {
            self.fade_gain_x = (self.fade_gain_x + delta_x).min(1.0);
            self.fade_gain = if self.fade_gain_x >= 1.0 {
                self.target
            } else if self.target > self.fade_start {
                self.fade_start
                    + (self.target - self.fade_start) * fade_shape(self.fade_gain_x, profile)
            } else {
                self.target
                    + (self.fade_start - self.target) * fade_shape(1.0 - self.fade_gain_x, profile)
            };
        }
    }
}

impl Default for FadeEnvelope {
    fn default() -> Self {
        Self::new()
    }
}
