//! Master bus.
//!
//! ```text
//! mix (+ chain if pre-master) -> mono collapse -> fader x fade x dim
//!   (+ chain if post-master) -> DC blocker -> clipper -> out
//! ```

use rackmix_core::{
    ANTIPOP_SLEW_FAST, ANTIPOP_SLEW_SLOW, AudioPort, Jack, ParamBank, SlewLimiter, StereoDcBlocker,
    VuLevels, VuMeter, db_to_linear, fader_to_gain, hard_clip_master, soft_clip_master,
};

use crate::fade::{FadeEnvelope, is_fade_rate};
use crate::global::{ChainMode, GlobalInfo};
use crate::params::{FADER_SCALING_EXPONENT, MasterParams};
use crate::settings::{ClipMode, FADE_PROFILE_RANGE, MasterSettings};
use crate::strip::{fader_with_cv, read_cv};

/// Deepest dim attenuation accepted.
pub const MIN_DIM_GAIN_DB: f32 = -60.0;

/// Jacks of the master bus.
#[derive(Debug, Clone, Default)]
pub struct MasterPorts<P = Jack> {
    /// Chain input left (or mono)
    pub chain_left: P,
    /// Chain input right
    pub chain_right: P,
    /// Master fader CV, 0..10 V
    pub fader_cv: P,
}

/// The final stereo summing stage.
#[derive(Debug, Clone)]
pub struct MixerMaster {
    params: MasterParams,
    /// Persisted options
    pub settings: MasterSettings,
    fader_gain: f32,
    fader_slewer: SlewLimiter,
    fade: FadeEnvelope,
    fade_dim_gain: f32,
    mute_slewer: SlewLimiter,
    dc_blocker: StereoDcBlocker,
    vu: VuMeter,
    fader_with_cv: f32,
    fade_mode: bool,
    mono: bool,
}

impl MixerMaster {
    /// Master bus bound to its parameter handles.
    pub fn new(params: MasterParams, sample_rate: f32) -> Self {
        let mut master = Self {
            params,
            settings: MasterSettings::default(),
            fader_gain: 0.0,
            fader_slewer: SlewLimiter::new(ANTIPOP_SLEW_SLOW),
            fade: FadeEnvelope::new(),
            fade_dim_gain: 1.0,
            mute_slewer: SlewLimiter::new(ANTIPOP_SLEW_FAST),
            dc_blocker: StereoDcBlocker::new(sample_rate),
            vu: VuMeter::new(),
            fader_with_cv: 1.0,
            fade_mode: false,
            mono: false,
        };
        master.set_sample_rate(sample_rate);
        master
    }

    /// Parameter handles.
    pub fn params(&self) -> &MasterParams {
        &self.params
    }

    /// Restore default settings and clear transient state.
    pub fn on_reset(&mut self, params: &ParamBank) {
        self.settings = MasterSettings::default();
        self.reset_non_json(params);
    }

    /// Clear slewers, DC blocker and meters; settle the fade at the
    /// current mute state.
    pub fn reset_non_json(&mut self, params: &ParamBank) {
        let fade_target = if params.get_bool(self.params.mute) { 0.0 } else { 1.0 };
        self.fade.reset_to(fade_target);
        self.fader_slewer.reset_to(0.0);
        self.mute_slewer.reset_to(0.0);
        self.dc_blocker.reset();
        self.vu.reset();
    }

    /// Recompute rate-dependent state.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let sample_time = 1.0 / sample_rate;
        self.fader_slewer.set_sample_time(sample_time);
        self.mute_slewer.set_sample_time(sample_time);
        self.vu.set_sample_time(sample_time);
        self.dc_blocker.set_sample_rate(sample_rate);
    }

    /// Fader including fader CV.
    pub fn fader_with_cv(&self) -> f32 {
        self.fader_with_cv
    }

    /// Whether mute is a timed fade.
    pub fn is_fade_mode(&self) -> bool {
        self.fade_mode
    }

    /// Fade envelope state.
    pub fn fade(&self) -> &FadeEnvelope {
        &self.fade
    }

    /// Output meter levels.
    pub fn vu_levels(&self) -> VuLevels {
        self.vu.levels()
    }

    /// Linear dim gain for the current setting.
    pub fn dim_gain(&self) -> f32 {
        let db = if self.settings.dim_gain_db.is_nan() {
            crate::settings::DEFAULT_DIM_GAIN_DB
        } else {
            self.settings.dim_gain_db.clamp(MIN_DIM_GAIN_DB, 0.0)
        };
        db_to_linear(db)
    }

    fn update_slow<P: AudioPort>(
        &mut self,
        ports: &MasterPorts<P>,
        global: &GlobalInfo,
        params: &ParamBank,
    ) {
        let p = self.params;
        self.fader_with_cv = fader_with_cv(params.get(p.fader), read_cv(&ports.fader_cv));
        self.fader_gain = fader_to_gain(self.fader_with_cv, FADER_SCALING_EXPONENT);
        self.mono = params.get_bool(p.mono);

        let fade_rate = params.get(p.fade_rate);
        self.fade_mode = is_fade_rate(fade_rate);
        let mute_target = if params.get_bool(p.mute) { 0.0 } else { 1.0 };
        self.fade.process(
            mute_target,
            fade_rate,
            self.settings.fade_profile / FADE_PROFILE_RANGE,
            global.symmetrical_fade,
            global.eco_step_time(),
        );
        let dim = if params.get_bool(p.dim) { self.dim_gain() } else { 1.0 };
        self.fade_dim_gain = self.fade.scaled_gain(FADER_SCALING_EXPONENT) * dim;
    }

    #[inline]
    fn chain_input<P: AudioPort>(ports: &MasterPorts<P>) -> (f32, f32) {
        if !ports.chain_left.is_connected() {
            return (0.0, 0.0);
        }
        let l = ports.chain_left.poly_sum();
        let r = if ports.chain_right.is_connected() { ports.chain_right.poly_sum() } else { l };
        (l, r)
    }

    /// Process one frame of the accumulated mix and return the final output.
    pub fn process<P: AudioPort>(
        &mut self,
        mix: (f32, f32),
        ports: &MasterPorts<P>,
        global: &GlobalInfo,
        params: &ParamBank,
        eco: bool,
    ) -> (f32, f32) {
        if eco {
            self.update_slow(ports, global, params);
        }
        let chain = Self::chain_input(ports);
        let (mut l, mut r) = mix;
        if global.chain_mode == ChainMode::PreMaster {
            l += chain.0;
            r += chain.1;
        }
        if self.mono {
            let m = 0.5 * (l + r);
            l = m;
            r = m;
        }

        let fader = self.fader_slewer.process(self.fader_gain);
        let gain = fader * self.mute_slewer.process(self.fade_dim_gain);
        l *= gain;
        r *= gain;

        if global.chain_mode == ChainMode::PostMaster {
            l += chain.0;
            r += chain.1;
        }
        if self.settings.dc_block {
            (l, r) = self.dc_blocker.process(l, r);
        }
        let out = match self.settings.clip_mode {
            ClipMode::Soft => (soft_clip_master(l), soft_clip_master(r)),
            ClipMode::Hard => (hard_clip_master(l), hard_clip_master(r)),
        };
        self.vu.process(out.0, out.1);
        out
    }
}
