//! Group bus strip.
//!
//! A group receives the sum of its member tracks' post-mute-solo signals,
//! always treats it as stereo, and runs the same fader/pan/mute/fade
//! pipeline as a track before feeding the main mix.

use rackmix_core::{AudioPort, Jack, ParamBank, clamp_voltage};

use crate::global::GlobalInfo;
use crate::pan_law::PanLawSignature;
use crate::params::StripParams;
use crate::settings::BusSettings;
use crate::strip::{StripCore, Taps, read_cv};

/// CV jacks of one group.
#[derive(Debug, Clone, Default)]
pub struct GroupPorts<P = Jack> {
    /// Fader CV, 0..10 V
    pub fader_cv: P,
    /// Pan CV, ±5 V
    pub pan_cv: P,
}

/// Solo resolution for one group: audible when nothing is soloed, when
/// the group is soloed itself, or when one of its member tracks is.
pub fn calc_group_solo_gain(
    group: usize,
    tracks: usize,
    solo_bit_mask: u32,
    group_usage: &[u32],
) -> f32 {
    if solo_bit_mask == 0 {
        return 1.0;
    }
    let own_bit = 1u32 << (tracks + group);
    let members = group_usage.get(group).copied().unwrap_or(0);
    if solo_bit_mask & own_bit != 0 || solo_bit_mask & members != 0 {
        1.0
    } else {
        0.0
    }
}

/// One group bus.
#[derive(Debug, Clone)]
pub struct MixerGroup {
    index: usize,
    mask_index: usize,
    params: StripParams,
    /// Persisted options
    pub settings: BusSettings,
    core: StripCore,
}

impl MixerGroup {
    /// Group number `index` of a mixer with `tracks` tracks.
    pub fn new(index: usize, tracks: usize, params: StripParams, sample_rate: f32) -> Self {
        let mut core = StripCore::new();
        core.set_sample_time(1.0 / sample_rate);
        Self {
            index,
            mask_index: tracks + index,
            params,
            settings: BusSettings::default(),
            core,
        }
    }

    /// Zero-based group number.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Bit of this group in the solo and link masks.
    pub fn mask_index(&self) -> usize {
        self.mask_index
    }

    /// Parameter handles.
    pub fn params(&self) -> &StripParams {
        &self.params
    }

    /// Gain, fade and meter state.
    pub fn core(&self) -> &StripCore {
        &self.core
    }

    /// Signal at the direct-out tap.
    pub fn direct_out(&self) -> (f32, f32) {
        self.core.taps().get(self.settings.local.direct_out_tap)
    }

    /// Solo gain of this group under the current global state.
    pub fn calc_solo_gain(&self, global: &GlobalInfo) -> f32 {
        calc_group_solo_gain(
            self.index,
            global.layout().tracks,
            global.solo_bit_mask(),
            global.group_usage_table(),
        )
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

    fn update_slow<P: AudioPort>(
        &mut self,
        ports: &GroupPorts<P>,
        global: &GlobalInfo,
        params: &ParamBank,
    ) {
        let p = self.params;
        let signature = PanLawSignature {
            local: self.settings.local.pan_law_stereo,
            global_stereo: global.pan_law_stereo,
            global_mono: global.pan_law_mono,
            stereo: true,
        };
        self.core.update_gain_matrix(
            params.get(p.fader),
            read_cv(&ports.fader_cv),
            params.get(p.pan),
            read_cv(&ports.pan_cv),
            signature,
        );

        let muted = params.get_bool(p.mute);
        let mute_target = if muted { 0.0 } else { 1.0 };
        if self.core.mute_changed(muted) {
            global.fade_other_linked_tracks(params, self.mask_index, mute_target);
        }
        let target = mute_target * self.calc_solo_gain(global) * global.dry_gain();
        self.core.update_fade(
            target,
            params.get(p.fade_rate),
            self.settings.fade_profile,
            global.symmetrical_fade,
            global.eco_step_time(),
        );
    }

    /// Process one frame of the summed member tracks.
    pub fn process<P: AudioPort>(
        &mut self,
        input: (f32, f32),
        ports: &GroupPorts<P>,
        global: &GlobalInfo,
        params: &ParamBank,
        eco: bool,
    ) -> (f32, f32) {
        if eco {
            self.update_slow(ports, global, params);
        }
        let pre = (clamp_voltage(input.0), clamp_voltage(input.1));
        let post_fader = self.core.apply_gain(pre.0, pre.1);
        let post_mute_solo = self.core.apply_mute_solo(post_fader.0, post_fader.1);
        self.core.finish(Taps {
            pre_insert: pre,
            pre_fader: pre,
            post_fader,
            post_mute_solo,
        });
        post_mute_solo
    }
}
