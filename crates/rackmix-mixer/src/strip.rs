//! Gain machinery shared by tracks, groups and aux returns.
//!
//! Every strip runs the same two-rate pipeline:
//!
//! - On an eco tick: fader and pan (with CV) go through the pan law into a
//!   target [`Gain4`], and the mute/solo target goes through the
//!   [`FadeEnvelope`] into a target fade gain.
//! - Every sample: a [`Slewer4`] moves the applied matrix toward its target
//!   at [`ANTIPOP_SLEW_SLOW`], the matrix multiplies `[L, R, R, L]` and folds
//!   back to stereo, then a [`SlewLimiter`] at [`ANTIPOP_SLEW_FAST`] moves the
//!   applied fade gain toward its target.

use rackmix_core::{
    ANTIPOP_SLEW_FAST, ANTIPOP_SLEW_SLOW, AudioPort, Gain4, SlewLimiter, Slewer4, VuLevels, VuMeter,
    clamp_voltage, fader_to_gain,
};

use crate::fade::{FadeEnvelope, is_fade_rate};
use crate::pan_law::{PanCache, PanLawSignature, clamp_pan};
use crate::params::{FADER_SCALING_EXPONENT, MAX_FADER};
use crate::settings::{FADE_PROFILE_RANGE, TapPoint};

/// Fader CV full scale: 10 V is the unmodified fader.
pub const FADER_CV_FULL_SCALE: f32 = 10.0;

/// Volts of pan CV per full pan range. Pan moves by `v / 10` per volt, so
/// ±5 V from centre reaches either side and 10 V sweeps hard left to hard
/// right.
pub const PAN_CV_VOLTS_PER_RANGE: f32 = 10.0;

/// Stereo signal at each tap of a strip, as of the last sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Taps {
    /// After input gain and invert
    pub pre_insert: (f32, f32),
    /// Before the fader
    pub pre_fader: (f32, f32),
    /// After fader and pan
    pub post_fader: (f32, f32),
    /// After mute, solo and fade
    pub post_mute_solo: (f32, f32),
}

impl Taps {
    /// Signal at `tap`.
    #[inline]
    pub fn get(&self, tap: TapPoint) -> (f32, f32) {
        match tap {
            TapPoint::PreInsert => self.pre_insert,
            TapPoint::PreFader => self.pre_fader,
            TapPoint::PostFader => self.post_fader,
            TapPoint::PostMuteSolo => self.post_mute_solo,
        }
    }
}

/// Channel 0 of a CV jack, or `None` when unplugged.
#[inline]
pub(crate) fn read_cv<P: AudioPort>(port: &P) -> Option<f32> {
    port.is_connected().then(|| port.read(0))
}

/// Fader with an optional fader CV applied.
#[inline]
pub fn fader_with_cv(fader: f32, cv: Option<f32>) -> f32 {
    let fader = if fader.is_nan() { 0.0 } else { fader.clamp(0.0, MAX_FADER) };
    match cv {
        Some(v) => fader * (clamp_voltage(v) / FADER_CV_FULL_SCALE).clamp(0.0, 1.0),
        None => fader,
    }
}

/// Pan with an optional pan CV applied.
#[inline]
pub fn pan_with_cv(pan: f32, cv: Option<f32>) -> f32 {
    match cv {
        Some(v) => clamp_pan(clamp_pan(pan) + clamp_voltage(v) / PAN_CV_VOLTS_PER_RANGE),
        None => clamp_pan(pan),
    }
}

/// Per-strip gain, fade and meter state.
#[derive(Debug, Clone)]
pub struct StripCore {
    pan_cache: PanCache,
    gain_matrix: Gain4,
    gain_matrix_slewer: Slewer4,
    fade: FadeEnvelope,
    fade_gain_scaled: f32,
    mute_solo_slewer: SlewLimiter,
    old_mute: Option<bool>,
    fader_with_cv: f32,
    pan_with_cv: f32,
    fade_mode: bool,
    vu: VuMeter,
    taps: Taps,
}

impl StripCore {
    /// A silent strip; the first eco tick brings it up.
    pub fn new() -> Self {
        Self {
            pan_cache: PanCache::new(),
            gain_matrix: Gain4::ZERO,
            gain_matrix_slewer: Slewer4::new(ANTIPOP_SLEW_SLOW),
            fade: FadeEnvelope::new(),
            fade_gain_scaled: 1.0,
            mute_solo_slewer: SlewLimiter::new(ANTIPOP_SLEW_FAST),
            old_mute: None,
            fader_with_cv: 1.0,
            pan_with_cv: 0.5,
            fade_mode: false,
            vu: VuMeter::new(),
            taps: Taps::default(),
        }
    }

    /// Rescale every time constant.
    pub fn set_sample_time(&mut self, sample_time: f32) {
        self.gain_matrix_slewer.set_sample_time(sample_time);
        self.mute_solo_slewer.set_sample_time(sample_time);
        self.vu.set_sample_time(sample_time);
    }

    /// Clear transient state. Slewers restart from silence; the fade
    /// envelope settles at `fade_target` without fading.
    pub fn reset_non_json(&mut self, fade_target: f32) {
        self.pan_cache.invalidate();
        self.gain_matrix = Gain4::ZERO;
        self.gain_matrix_slewer.reset_to(Gain4::ZERO);
        self.fade.reset_to(fade_target);
        self.fade_gain_scaled = self.fade.scaled_gain(FADER_SCALING_EXPONENT);
        self.mute_solo_slewer.reset_to(0.0);
        self.old_mute = None;
        self.vu.reset();
        self.taps = Taps::default();
    }

    /// Eco-rate: recompute the target gain matrix.
    pub(crate) fn update_gain_matrix(
        &mut self,
        fader: f32,
        fader_cv: Option<f32>,
        pan: f32,
        pan_cv: Option<f32>,
        signature: PanLawSignature,
    ) {
        self.fader_with_cv = fader_with_cv(fader, fader_cv);
        self.pan_with_cv = pan_with_cv(pan, pan_cv);
        let pan_matrix = self.pan_cache.update(self.pan_with_cv, signature);
        self.gain_matrix =
            pan_matrix.scale(fader_to_gain(self.fader_with_cv, FADER_SCALING_EXPONENT));
    }

    /// Eco-rate: note the mute button. Returns true when it changed since
    /// the previous tick (the first observation after a reset never counts).
    pub(crate) fn mute_changed(&mut self, muted: bool) -> bool {
        let changed = self.old_mute.is_some_and(|old| old != muted);
        self.old_mute = Some(muted);
        changed
    }

    /// Eco-rate: step the fade envelope toward `target`. `profile` is on
    /// the `±FADE_PROFILE_RANGE` settings scale.
    pub(crate) fn update_fade(
        &mut self,
        target: f32,
        fade_rate: f32,
        profile: f32,
        symmetrical: bool,
        step_time: f32,
    ) {
        self.fade_mode = is_fade_rate(fade_rate);
        let curve = profile / FADE_PROFILE_RANGE;
        self.fade.process(target, fade_rate, curve, symmetrical, step_time);
        self.fade_gain_scaled = self.fade.scaled_gain(FADER_SCALING_EXPONENT);
    }

    /// Apply the slewed gain matrix to one frame.
    #[inline]
    pub(crate) fn apply_gain(&mut self, left: f32, right: f32) -> (f32, f32) {
        let gains = self.gain_matrix_slewer.process(&self.gain_matrix);
        (gains * Gain4::from_stereo(left, right)).fold()
    }

    /// Apply the slewed mute/solo/fade gain to one frame.
    #[inline]
    pub(crate) fn apply_mute_solo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let g = self.mute_solo_slewer.process(self.fade_gain_scaled);
        (left * g, right * g)
    }

    /// Store taps and feed the meter with the post-mute-solo signal.
    #[inline]
    pub(crate) fn finish(&mut self, taps: Taps) {
        self.vu.process(taps.post_mute_solo.0, taps.post_mute_solo.1);
        self.taps = taps;
    }

    /// Fader including fader CV, for knob-arc display.
    pub fn fader_with_cv(&self) -> f32 {
        self.fader_with_cv
    }

    /// Pan including pan CV.
    pub fn pan_with_cv(&self) -> f32 {
        self.pan_with_cv
    }

    /// Whether mute is a timed fade (true) or an instant switch (false).
    pub fn is_fade_mode(&self) -> bool {
        self.fade_mode
    }

    /// Fade envelope state.
    pub fn fade(&self) -> &FadeEnvelope {
        &self.fade
    }

    /// Target gain matrix as of the last eco tick.
    pub fn gain_matrix(&self) -> Gain4 {
        self.gain_matrix
    }

    /// Gain matrix currently applied (slewed).
    pub fn applied_gain_matrix(&self) -> Gain4 {
        self.gain_matrix_slewer.value()
    }

    /// Mute/solo/fade gain currently applied (slewed).
    pub fn applied_mute_solo_gain(&self) -> f32 {
        self.mute_solo_slewer.value()
    }

    /// Meter levels.
    pub fn vu_levels(&self) -> VuLevels {
        self.vu.levels()
    }

    /// Signals at each tap for the last sample.
    pub fn taps(&self) -> &Taps {
        &self.taps
    }
}

impl Default for StripCore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pan_law::{MonoPanLaw, StereoPanLaw};

    const STEREO: PanLawSignature = PanLawSignature {
        local: None,
        global_stereo: StereoPanLaw::BalanceLinear,
        global_mono: MonoPanLaw::Flat,
        stereo: true,
    };

    #[test]
    fn fader_cv_scales_fader() {
        assert_eq!(fader_with_cv(1.0, None), 1.0);
        assert_eq!(fader_with_cv(1.0, Some(5.0)), 0.5);
        assert_eq!(fader_with_cv(1.0, Some(-3.0)), 0.0);
        assert_eq!(fader_with_cv(0.8, Some(15.0)), 0.8);
        assert_eq!(fader_with_cv(f32::NAN, None), 0.0);
    }

    #[test]
    fn pan_cv_spans_range() {
        assert_eq!(pan_with_cv(0.5, Some(5.0)), 1.0);
        assert_eq!(pan_with_cv(0.5, Some(-5.0)), 0.0);
        assert_eq!(pan_with_cv(0.5, Some(2.5)), 0.75);
        assert_eq!(pan_with_cv(0.9, Some(5.0)), 1.0);
        assert_eq!(pan_with_cv(0.0, Some(PAN_CV_VOLTS_PER_RANGE)), 1.0);
        assert!((pan_with_cv(0.2, Some(1.0)) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn gain_slews_to_target() {
        let mut strip = StripCore::new();
        strip.set_sample_time(1.0 / 1000.0);
        strip.reset_non_json(1.0);
        strip.update_gain_matrix(1.0, None, 0.5, None, STEREO);
        assert_eq!(strip.gain_matrix(), Gain4::IDENTITY);

        // 25 units/s at 1 kHz: 40 samples to reach unity
        let (l, _) = strip.apply_gain(1.0, 1.0);
        assert!((l - 0.025).abs() < 1e-6);
        for _ in 0..40 {
            strip.apply_gain(1.0, 1.0);
        }
        assert_eq!(strip.apply_gain(2.0, -3.0), (2.0, -3.0));
    }

    #[test]
    fn first_mute_observation_is_not_a_change() {
        let mut strip = StripCore::new();
        assert!(!strip.mute_changed(true));
        assert!(!strip.mute_changed(true));
        assert!(strip.mute_changed(false));
    }

    #[test]
    fn instant_mute_ramps_at_fast_rate() {
        let mut strip = StripCore::new();
        strip.set_sample_time(1.0 / 1000.0);
        strip.reset_non_json(1.0);
        for _ in 0..8 {
            strip.apply_mute_solo(1.0, 1.0);
        }
        assert_eq!(strip.applied_mute_solo_gain(), 1.0);
        strip.update_fade(0.0, 0.0, 0.0, false, 1.0 / 1000.0);
        assert!(!strip.is_fade_mode());
        let (l, _) = strip.apply_mute_solo(1.0, 1.0);
        assert!((l - 0.875).abs() < 1e-6);
    }
}
