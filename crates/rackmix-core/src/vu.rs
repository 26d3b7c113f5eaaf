//! Stereo VU metering: peak hold and RMS envelopes.
//!
//! Both envelopes decay at [`VU_DECAY_RATE`] (1/s). Peaks rise instantly and
//! decay exponentially; the RMS envelope is a one-pole average of the squared
//! signal and is square-rooted only when read, so the per-sample cost is two
//! multiplies and a compare per channel.

use libm::sqrtf;

/// Envelope decay/averaging rate of the meters, in 1/s.
pub const VU_DECAY_RATE: f32 = 30.0;

/// Readout of a [`VuMeter`] in volts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VuLevels {
    /// Left peak envelope
    pub peak_l: f32,
    /// Right peak envelope
    pub peak_r: f32,
    /// Left RMS level
    pub rms_l: f32,
    /// Right RMS level
    pub rms_r: f32,
}

impl VuLevels {
    /// Levels as a flat array `[peak_l, peak_r, rms_l, rms_r]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.peak_l, self.peak_r, self.rms_l, self.rms_r]
    }

    /// Inverse of [`to_array`](Self::to_array).
    pub fn from_array(a: [f32; 4]) -> Self {
        Self {
            peak_l: a[0],
            peak_r: a[1],
            rms_l: a[2],
            rms_r: a[3],
        }
    }
}

/// Stereo envelope follower for channel meters.
///
/// ```rust
/// use rackmix_core::VuMeter;
///
/// let mut vu = VuMeter::new();
/// vu.set_sample_time(1.0 / 48000.0);
/// for _ in 0..48000 {
///     vu.process(5.0, 0.0);
/// }
/// let levels = vu.levels();
/// assert!((levels.peak_l - 5.0).abs() < 1e-3);
/// assert!((levels.rms_l - 5.0).abs() < 1e-2);
/// assert_eq!(levels.peak_r, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct VuMeter {
    peak: [f32; 2],
    mean_sq: [f32; 2],
    coeff: f32,
}

impl VuMeter {
    /// Create a meter at silence for 44.1 kHz.
    pub fn new() -> Self {
        Self {
            peak: [0.0; 2],
            mean_sq: [0.0; 2],
            coeff: VU_DECAY_RATE / 44100.0,
        }
    }

    /// Recompute the envelope coefficient for a new sample time.
    pub fn set_sample_time(&mut self, sample_time: f32) {
        self.coeff = (VU_DECAY_RATE * sample_time).min(1.0);
    }

    /// Feed one stereo frame.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) {
        for (ch, x) in [left, right].into_iter().enumerate() {
            let a = x.abs();
            self.peak[ch] = if a >= self.peak[ch] {
                a
            } else {
                self.peak[ch] - self.peak[ch] * self.coeff
            };
            self.mean_sq[ch] += (x * x - self.mean_sq[ch]) * self.coeff;
        }
    }

    /// Current levels.
    pub fn levels(&self) -> VuLevels {
        VuLevels {
            peak_l: self.peak[0],
            peak_r: self.peak[1],
            rms_l: sqrtf(self.mean_sq[0].max(0.0)),
            rms_r: sqrtf(self.mean_sq[1].max(0.0)),
        }
    }

    /// Drop both envelopes to silence.
    pub fn reset(&mut self) {
        self.peak = [0.0; 2];
        self.mean_sq = [0.0; 2];
    }
}

impl Default for VuMeter {
    fn default() -> Self {
        Self::new()
    }
}
