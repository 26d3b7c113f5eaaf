//! Stereo DC blocker for the master bus.
//!
//! First-order highpass `H(z) = (1 - z^-1) / (1 - R*z^-1)` per channel, with
//! `R = 1 - 2*pi*fc/fs`. At the default 10 Hz cutoff nothing audible is
//! touched, but offsets accumulated from CV-heavy patches are removed before
//! the clipper sees them.
//!
//! Reference: Julius O. Smith, "Introduction to Digital Filters", DC Blocker.

use core::f32::consts::PI;

use crate::math::flush_denormal;

/// Default cutoff of the master DC blocker in Hz.
pub const DC_BLOCK_CUTOFF_HZ: f32 = 10.0;

/// Two-channel DC blocking filter.
///
/// ```rust
/// use rackmix_core::StereoDcBlocker;
///
/// let mut blocker = StereoDcBlocker::new(48000.0);
/// let mut out = (0.0, 0.0);
/// for _ in 0..96000 {
///     out = blocker.process(2.0, -1.0);
/// }
/// assert!(out.0.abs() < 0.01 && out.1.abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct StereoDcBlocker {
    coeff: f32,
    x_prev: [f32; 2],
    y_prev: [f32; 2],
}

impl StereoDcBlocker {
    /// Create a blocker with the default cutoff for `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            coeff: Self::calculate_coeff(DC_BLOCK_CUTOFF_HZ, sample_rate),
            x_prev: [0.0; 2],
            y_prev: [0.0; 2],
        }
    }

    /// Filter one stereo frame: `y[n] = x[n] - x[n-1] + R * y[n-1]`.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let l = self.step(0, left);
        let r = self.step(1, right);
        (l, r)
    }

    #[inline]
    fn step(&mut self, ch: usize, input: f32) -> f32 {
        let output = flush_denormal(input - self.x_prev[ch] + self.coeff * self.y_prev[ch]);
        self.x_prev[ch] = input;
        self.y_prev[ch] = output;
        output
    }

    /// Clear filter history.
    pub fn reset(&mut self) {
        self.x_prev = [0.0; 2];
        self.y_prev = [0.0; 2];
    }

    /// Recompute `R` for a new sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.coeff = Self::calculate_coeff(DC_BLOCK_CUTOFF_HZ, sample_rate);
    }

    /// Current pole position `R`.
    pub fn coeff(&self) -> f32 {
        self.coeff
    }

    fn calculate_coeff(cutoff_hz: f32, sample_rate: f32) -> f32 {
        (1.0 - 2.0 * PI * cutoff_hz / sample_rate).clamp(0.9, 0.9999)
    }
}
