//! Constant-rate slew limiting for click-free gain changes.
//!
//! Gain targets in the mixer move in steps (a fader jumps when automated, a
//! mute toggles instantly). Feeding those steps straight into the signal
//! multiply produces audible clicks, so every gain passes through a slew
//! limiter that moves toward its target at a fixed rate expressed in
//! gain-units per second.
//!
//! Because the rate is per second and the per-sample step is
//! `rate * sample_time`, the time to cover a given distance does not depend
//! on the sample rate. Convergence is monotonic: the output never overshoots
//! and never reverses direction while the target is held.
//!
//! ## Usage
//!
//! ```rust
//! use rackmix_core::SlewLimiter;
//!
//! let mut slew = SlewLimiter::new(125.0);
//! slew.set_sample_time(1.0 / 48000.0);
//!
//! // 1.0 / 125 per second = 8 ms to travel the full range
//! for _ in 0..400 {
//!     slew.process(1.0);
//! }
//! assert!((slew.value() - 1.0).abs() < 1e-6);
//! ```

use crate::lanes::Gain4;

/// Fast rate for mute/solo gain transitions (units per second).
pub const ANTIPOP_SLEW_FAST: f32 = 125.0;

/// Slower rate for fader/pan gain-matrix transitions (units per second).
pub const ANTIPOP_SLEW_SLOW: f32 = 25.0;

/// Single-lane slew limiter.
#[derive(Debug, Clone)]
pub struct SlewLimiter {
    /// Current output value
    out: f32,
    /// Rate in units per second
    rate: f32,
    /// Maximum change per sample: `rate * sample_time`
    step: f32,
}

impl SlewLimiter {
    /// Create a limiter at zero with the given rate.
    ///
    /// The sample time defaults to 1/44100 s until
    /// [`set_sample_time`](Self::set_sample_time) is called.
    pub fn new(rate: f32) -> Self {
        Self {
            out: 0.0,
            rate,
            step: rate / 44100.0,
        }
    }

    /// Recompute the per-sample step for a new sample time (seconds).
    pub fn set_sample_time(&mut self, sample_time: f32) {
        self.step = self.rate * sample_time;
    }

    /// Change the rate, keeping the current sample time.
    pub fn set_rate(&mut self, rate: f32, sample_time: f32) {
        self.rate = rate;
        self.set_sample_time(sample_time);
    }

    /// Move one sample toward `target` and return the new output.
    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        let delta = target - self.out;
        self.out += delta.clamp(-self.step, self.step);
        self.out
    }

    /// Current output without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        self.out
    }

    /// Jump straight to `value`.
    pub fn reset_to(&mut self, value: f32) {
        self.out = value;
    }
}

/// Four-lane slew limiter for gain matrices.
///
/// All lanes share one rate. When the output already equals the target in
/// all four lanes the step is skipped entirely; this is purely a CPU saving,
/// since a settled limiter would compute the same output anyway.
#[derive(Debug, Clone)]
pub struct Slewer4 {
    out: Gain4,
    rate: f32,
    step: f32,
}

impl Slewer4 {
    /// Create a four-lane limiter at zero with the given rate.
    pub fn new(rate: f32) -> Self {
        Self {
            out: Gain4::ZERO,
            rate,
            step: rate / 44100.0,
        }
    }

    /// Recompute the per-sample step for a new sample time (seconds).
    pub fn set_sample_time(&mut self, sample_time: f32) {
        self.step = self.rate * sample_time;
    }

    /// Move every lane one sample toward `target`.
    #[inline]
    pub fn process(&mut self, target: &Gain4) -> Gain4 {
        if self.out.eq_mask(target) != 0xF {
            self.out = self.out + (*target - self.out).clamp_delta(self.step);
        }
        self.out
    }

    /// Current output without advancing.
    #[inline]
    pub fn value(&self) -> Gain4 {
        self.out
    }

    /// Jump straight to `value` in every lane.
    pub fn reset_to(&mut self, value: Gain4) {
        self.out = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_target_in_rate_time() {
        let sr = 48000.0;
        let mut slew = SlewLimiter::new(100.0);
        slew.set_sample_time(1.0 / sr);
        // 10 ms to move by 1.0
        for _ in 0..480 {
            slew.process(1.0);
        }
        assert!((slew.value() - 1.0).abs() < 1e-4, "got {}", slew.value());
    }

    #[test]
    fn duration_independent_of_sample_rate() {
        for &sr in &[44100.0f32, 48000.0, 96000.0] {
            let mut slew = SlewLimiter::new(50.0);
            slew.set_sample_time(1.0 / sr);
            let half = (sr * 0.01) as usize; // 10 ms -> 0.5
            for _ in 0..half {
                slew.process(1.0);
            }
            assert!(
                (slew.value() - 0.5).abs() < 0.01,
                "sr {sr}: expected ~0.5, got {}",
                slew.value()
            );
        }
    }

    #[test]
    fn monotonic_no_overshoot() {
        let mut slew = SlewLimiter::new(1000.0);
        slew.set_sample_time(1.0 / 48000.0);
        let mut prev = slew.value();
        for _ in 0..2000 {
            let v = slew.process(0.8);
            assert!(v >= prev && v <= 0.8);
            prev = v;
        }
    }

    #[test]
    fn four_lanes_move_independently() {
        let mut slew = Slewer4::new(2.0);
        slew.set_sample_time(0.5); // step of 1.0 per sample
        let target = Gain4::new(0.5, 2.0, -3.0, 0.0);
        let out = slew.process(&target);
        assert_eq!(out, Gain4::new(0.5, 1.0, -1.0, 0.0));
        let out = slew.process(&target);
        assert_eq!(out, Gain4::new(0.5, 2.0, -2.0, 0.0));
    }

    #[test]
    fn settled_four_lane_holds() {
        let mut slew = Slewer4::new(25.0);
        slew.reset_to(Gain4::IDENTITY);
        assert_eq!(slew.process(&Gain4::IDENTITY), Gain4::IDENTITY);
    }
}
