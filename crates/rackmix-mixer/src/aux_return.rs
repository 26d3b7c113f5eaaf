//! Aux return strip.
//!
//! Sends are computed outside the mixer core; an aux return only processes
//! what comes back from the effect. Returns are stereo buses: a mono return
//! is copied to both sides and panned with the stereo law.

use rackmix_core::{AudioPort, Jack, ParamBank};

use crate::global::GlobalInfo;
use crate::pan_law::PanLawSignature;
use crate::params::StripParams;
use crate::settings::BusSettings;
use crate::strip::{StripCore, Taps};

/// Return jacks of one aux bus.
#[derive(Debug, Clone, Default)]
pub struct AuxPorts<P = Jack> {
    /// Left (or mono) return
    pub left: P,
    /// Right return
    pub right: P,
}

/// Solo resolution for one aux return.
///
/// Aux solos form their own mask. A soloed aux plays and the others go
/// quiet; with no aux soloed, a return is silenced by a track or group solo
/// only when `muted_by_main_solo` is set.
pub fn calc_aux_solo_gain(
    aux: usize,
    aux_solo_bit_mask: u32,
    solo_bit_mask: u32,
    muted_by_main_solo: bool,
) -> f32 {
    if aux_solo_bit_mask != 0 {
        return if aux_solo_bit_mask & (1 << aux) != 0 { 1.0 } else { 0.0 };
    }
    if muted_by_main_solo && solo_bit_mask != 0 {
        return 0.0;
    }
    1.0
}

/// One aux return.
#[derive(Debug, Clone)]
pub struct MixerAux {
    index: usize,
    params: StripParams,
    /// Persisted options
    pub settings: BusSettings,
    core: StripCore,
}

impl MixerAux {
    /// Aux return number `index`.
    pub fn new(index: usize, params: StripParams, sample_rate: f32) -> Self {
        let mut core = StripCore::new();
        core.set_sample_time(1.0 / sample_rate);
        Self {
            index,
            params,
            settings: BusSettings::default(),
            core,
        }
    }

    /// Zero-based aux number.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Parameter handles.
    pub fn params(&self) -> &StripParams {
        &self.params
    }

    /// Gain, fade and meter state.
    pub fn core(&self) -> &StripCore {
        &self.core
    }

    /// Restore default settings and clear transient state.
    pub fn on_reset(&mut self, params: &ParamBank) {
        self.settings = BusSettings::default();
        self.reset_non_json(params);
    }

    /// Clear slewers and meters; settle the fade at the current mute state.
    pub fn reset_non_json(&mut self, params: &ParamBank) {
        let fade_target = if params.get_bool(self.params.mute) { 0.0 } else { 1.0 };
        self.core.reset_non_json(fade_target);
    }

    /// Recompute rate-dependent state.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.core.set_sample_time(1.0 / sample_rate);
    }

    fn update_slow(&mut self, global: &GlobalInfo, params: &ParamBank) {
        let p = self.params;
        let signature = PanLawSignature {
            local: self.settings.local.pan_law_stereo,
            global_stereo: global.pan_law_stereo,
            global_mono: global.pan_law_mono,
            stereo: true,
        };
        self.core
            .update_gain_matrix(params.get(p.fader), None, params.get(p.pan), None, signature);

        let mute_target = if params.get_bool(p.mute) { 0.0 } else { 1.0 };
        let solo = calc_aux_solo_gain(
            self.index,
            global.aux_solo_bit_mask(),
            global.solo_bit_mask(),
            global.aux_returns_muted_when_main_solo,
        );
        self.core.update_fade(
            mute_target * solo,
            params.get(p.fade_rate),
            self.settings.fade_profile,
            global.symmetrical_fade,
            global.eco_step_time(),
        );
    }

    /// Process one frame of the return.
    pub fn process<P: AudioPort>(
        &mut self,
        ports: &AuxPorts<P>,
        global: &GlobalInfo,
        params: &ParamBank,
        eco: bool,
    ) -> (f32, f32) {
        if eco {
            self.update_slow(global, params);
        }
        let l = ports.left.poly_sum();
        let r = if ports.right.is_connected() { ports.right.poly_sum() } else { l };
        let post_fader = self.core.apply_gain(l, r);
        let post_mute_solo = self.core.apply_mute_solo(post_fader.0, post_fader.1);
        self.core.finish(Taps {
            pre_insert: (l, r),
            pre_fader: (l, r),
            post_fader,
            post_mute_solo,
        });
        post_mute_solo
    }
}
