//! Channel-strip cut filters built on a Direct Form I biquad.
//!
//! Each mixer track carries a 12 dB/oct highpass and a 12 dB/oct lowpass,
//! both Butterworth (Q = 0.707) with coefficients from the RBJ Audio EQ
//! Cookbook. A filter parked at the end of its range is switched out of the
//! path entirely rather than run with an inaudible cutoff.

use core::f32::consts::PI;
use libm::{cosf, sinf};

use crate::math::flush_denormal;

/// Butterworth Q for a second-order section.
pub const BUTTERWORTH_Q: f32 = 0.707;

/// Highpass cutoffs at or below this are treated as "off".
pub const HPF_OFF_HZ: f32 = 13.0;

/// Lowpass cutoffs at or above this are treated as "off".
pub const LPF_OFF_HZ: f32 = 20000.0;

/// Generic biquad with Direct Form I state.
///
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a passthrough biquad (`y[n] = x[n]`).
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets coefficients, normalising by `a0`.
    pub fn set_coefficients(&mut self, coeffs: (f32, f32, f32, f32, f32, f32)) {
        let (b0, b1, b2, a0, a1, a2) = coeffs;
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = flush_denormal(output);

        output
    }

    /// Clears the delay lines, keeping coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// RBJ cookbook lowpass coefficients `(b0, b1, b2, a0, a1, a2)`.
pub fn lowpass_coefficients(
    frequency: f32,
    q: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = (1.0 - cos_omega) / 2.0;
    (b0, 1.0 - cos_omega, b0, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// RBJ cookbook highpass coefficients `(b0, b1, b2, a0, a1, a2)`.
pub fn highpass_coefficients(
    frequency: f32,
    q: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = (1.0 + cos_omega) / 2.0;
    (b0, -(1.0 + cos_omega), b0, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Which side of the spectrum a [`CutFilter`] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    /// Removes lows (rumble, DC)
    Highpass,
    /// Removes highs (hiss)
    Lowpass,
}

/// Stereo highpass or lowpass with an "off" position at the end of its range.
///
/// Coefficients are only recomputed when the cutoff or sample rate actually
/// changes, so [`set_cutoff`](Self::set_cutoff) is cheap to call at control rate.
#[derive(Debug, Clone)]
pub struct CutFilter {
    kind: CutKind,
    left: Biquad,
    right: Biquad,
    cutoff: f32,
    sample_rate: f32,
    active: bool,
}

impl CutFilter {
    /// Create a filter at its "off" position.
    pub fn new(kind: CutKind, sample_rate: f32) -> Self {
        let cutoff = match kind {
            CutKind::Highpass => HPF_OFF_HZ,
            CutKind::Lowpass => LPF_OFF_HZ,
        };
        Self {
            kind,
            left: Biquad::new(),
            right: Biquad::new(),
            cutoff,
            sample_rate,
            active: false,
        }
    }

    /// Set the cutoff in Hz. Values past the "off" threshold bypass the filter.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        if cutoff == self.cutoff {
            return;
        }
        self.cutoff = cutoff;
        self.recalculate();
    }

    /// Current cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Whether the filter is in the signal path.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Update the sample rate and recompute coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate();
    }

    /// Clear both channels' state.
    pub fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }

    /// Filter one stereo frame. Mono sources only run the left section.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32, stereo: bool) -> (f32, f32) {
        if !self.active {
            return (left, right);
        }
        let l = self.left.process(left);
        let r = if stereo { self.right.process(right) } else { l };
        (l, r)
    }

    fn recalculate(&mut self) {
        let nyquist_guard = self.sample_rate * 0.49;
        let was_active = self.active;
        self.active = match self.kind {
            CutKind::Highpass => self.cutoff > HPF_OFF_HZ,
            CutKind::Lowpass => self.cutoff < LPF_OFF_HZ && self.cutoff < nyquist_guard,
        };
        if !self.active {
            return;
        }
        let freq = self.cutoff.clamp(1.0, nyquist_guard);
        let coeffs = match self.kind {
            CutKind::Highpass => highpass_coefficients(freq, BUTTERWORTH_Q, self.sample_rate),
            CutKind::Lowpass => lowpass_coefficients(freq, BUTTERWORTH_Q, self.sample_rate),
        };
        self.left.set_coefficients(coeffs);
        self.right.set_coefficients(coeffs);
        if !was_active {
            self.reset();
        }
    }
}
