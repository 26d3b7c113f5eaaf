//! Flat, field-by-field snapshot of everything a mixer persists.
//!
//! Every struct here is `#[serde(default)]`: a field missing from the file
//! keeps the mixer's default, and a channel list shorter than the mixer
//! leaves the remaining channels untouched. Values are stored raw (packed
//! settings as integers, selectors as indices) and sanitised on
//! [`MixerState::apply`], so a file written by a different layout or a
//! newer version still loads.

use rackmix_core::{HPF_OFF_HZ, LPF_OFF_HZ, ParamBank};
use rackmix_mixer::{
    ChainMode, ClipMode, DEFAULT_DIM_GAIN_DB, EcoMode, FADE_PROFILE_RANGE, GlobalInfo,
    LocalSettings, MasterParams, Mixer, MixerLayout, MonoPanLaw, StereoPanLaw, StripParams,
};
use serde::{Deserialize, Serialize};

/// Mixer-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobalState {
    /// Mono pan law selector
    pub pan_law_mono: u8,
    /// Stereo pan law selector
    pub pan_law_stereo: u8,
    /// Mirror fades on reversal
    pub symmetrical_fade: bool,
    /// Control-rate divisor
    pub eco_divisor: u32,
    /// Chain input joins before the master gain
    pub chain_pre_master: bool,
    /// Mute unsoloed aux returns during a track or group solo
    pub aux_returns_muted_when_main_solo: bool,
    /// Aux solos silence the dry mix
    pub aux_solos_mute_dry: bool,
    /// Linked tracks and groups
    pub link_bit_mask: u32,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            pan_law_mono: MonoPanLaw::default().index(),
            pan_law_stereo: StereoPanLaw::default().index(),
            symmetrical_fade: false,
            eco_divisor: EcoMode::default().divisor(),
            chain_pre_master: false,
            aux_returns_muted_when_main_solo: false,
            aux_solos_mute_dry: false,
            link_bit_mask: 0,
        }
    }
}

/// One group bus or aux return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StripState {
    /// Fader position
    pub fader: f32,
    /// Pan position
    pub pan: f32,
    /// Mute button
    pub mute: bool,
    /// Solo button
    pub solo: bool,
    /// Fade time in seconds; below 0.1 mutes instantly
    pub fade_rate: f32,
    /// Fade curve, `-100` (log) to `+100` (exp)
    pub fade_profile: f32,
    /// Packed tap, pan-law override and filter position
    pub local: u32,
}

impl Default for StripState {
    fn default() -> Self {
        Self {
            fader: 1.0,
            pan: 0.5,
            mute: false,
            solo: false,
            fade_rate: 0.0,
            fade_profile: 0.0,
            local: LocalSettings::default().to_packed(),
        }
    }
}

/// One input track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackState {
    /// Fader position
    pub fader: f32,
    /// Pan position
    pub pan: f32,
    /// Mute button
    pub mute: bool,
    /// Solo button
    pub solo: bool,
    /// Fade time in seconds
    pub fade_rate: f32,
    /// Fade curve, `-100` (log) to `+100` (exp)
    pub fade_profile: f32,
    /// Packed tap, pan-law override and filter position
    pub local: u32,
    /// Group selector: 0 = none, `n` = group `n`
    pub group: u32,
    /// Input gain in dB
    pub gain_adjust_db: f32,
    /// Polarity invert
    pub invert: bool,
    /// Highpass cutoff in Hz
    pub hpf_cutoff: f32,
    /// Lowpass cutoff in Hz
    pub lpf_cutoff: f32,
}

impl Default for TrackState {
    fn default() -> Self {
        let strip = StripState::default();
        Self {
            fader: strip.fader,
            pan: strip.pan,
            mute: strip.mute,
            solo: strip.solo,
            fade_rate: strip.fade_rate,
            fade_profile: strip.fade_profile,
            local: strip.local,
            group: 0,
            gain_adjust_db: 0.0,
            invert: false,
            hpf_cutoff: HPF_OFF_HZ,
            lpf_cutoff: LPF_OFF_HZ,
        }
    }
}

impl TrackState {
    /// The fields a track shares with a bus.
    pub fn strip(&self) -> StripState {
        StripState {
            fader: self.fader,
            pan: self.pan,
            mute: self.mute,
            solo: self.solo,
            fade_rate: self.fade_rate,
            fade_profile: self.fade_profile,
            local: self.local,
        }
    }
}

/// The master bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MasterState {
    /// Fader position
    pub fader: f32,
    /// Mute button
    pub mute: bool,
    /// Dim button
    pub dim: bool,
    /// Mono button
    pub mono: bool,
    /// Fade time in seconds
    pub fade_rate: f32,
    /// Fade curve, `-100` (log) to `+100` (exp)
    pub fade_profile: f32,
    /// Dim attenuation in dB
    pub dim_gain_db: f32,
    /// DC blocker before the clipper
    pub dc_block: bool,
    /// Hard clip instead of the soft knee
    pub hard_clip: bool,
}

impl Default for MasterState {
    fn default() -> Self {
        Self {
            fader: 1.0,
            mute: false,
            dim: false,
            mono: false,
            fade_rate: 0.0,
            fade_profile: 0.0,
            dim_gain_db: DEFAULT_DIM_GAIN_DB,
            dc_block: false,
            hard_clip: false,
        }
    }
}

/// Complete persisted state of one mixer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MixerState {
    /// Mixer-wide settings
    pub global: GlobalState,
    /// Tracks in order
    pub tracks: Vec<TrackState>,
    /// Group buses in order
    pub groups: Vec<StripState>,
    /// Aux returns in order
    pub auxes: Vec<StripState>,
    /// Master bus
    pub master: MasterState,
}

fn profile_or_default(profile: f32) -> f32 {
    if profile.is_finite() {
        profile.clamp(-FADE_PROFILE_RANGE, FADE_PROFILE_RANGE)
    } else {
        0.0
    }
}

fn capture_strip(
    params: &ParamBank,
    p: &StripParams,
    local: LocalSettings,
    fade_profile: f32,
) -> StripState {
    StripState {
        fader: params.get(p.fader),
        pan: params.get(p.pan),
        mute: params.get_bool(p.mute),
        solo: params.get_bool(p.solo),
        fade_rate: params.get(p.fade_rate),
        fade_profile,
        local: local.to_packed(),
    }
}

fn apply_strip(params: &ParamBank, p: &StripParams, s: &StripState) {
    params.set(p.fader, s.fader);
    params.set(p.pan, s.pan);
    params.set_bool(p.mute, s.mute);
    params.set_bool(p.solo, s.solo);
    params.set(p.fade_rate, s.fade_rate);
}

impl GlobalState {
    fn capture(global: &GlobalInfo) -> Self {
        Self {
            pan_law_mono: global.pan_law_mono.index(),
            pan_law_stereo: global.pan_law_stereo.index(),
            symmetrical_fade: global.symmetrical_fade,
            eco_divisor: global.eco_mode.divisor(),
            chain_pre_master: global.chain_mode == ChainMode::PreMaster,
            aux_returns_muted_when_main_solo: global.aux_returns_muted_when_main_solo,
            aux_solos_mute_dry: global.aux_solos_mute_dry,
            link_bit_mask: global.link_bit_mask(),
        }
    }

    fn apply(&self, global: &mut GlobalInfo) {
        if let Some(law) = MonoPanLaw::from_index(self.pan_law_mono) {
            global.pan_law_mono = law;
        }
        if let Some(law) = StereoPanLaw::from_index(self.pan_law_stereo) {
            global.pan_law_stereo = law;
        }
        global.symmetrical_fade = self.symmetrical_fade;
        global.eco_mode = EcoMode::from_divisor(self.eco_divisor);
        global.chain_mode = if self.chain_pre_master {
            ChainMode::PreMaster
        } else {
            ChainMode::PostMaster
        };
        global.aux_returns_muted_when_main_solo = self.aux_returns_muted_when_main_solo;
        global.aux_solos_mute_dry = self.aux_solos_mute_dry;
        global.set_link_bit_mask(self.link_bit_mask);
    }
}

impl MasterState {
    fn apply_params(&self, params: &ParamBank, p: &MasterParams) {
        params.set(p.fader, self.fader);
        params.set_bool(p.mute, self.mute);
        params.set_bool(p.dim, self.dim);
        params.set_bool(p.mono, self.mono);
        params.set(p.fade_rate, self.fade_rate);
    }
}

impl MixerState {
    /// Default state with one entry per channel of `layout`.
    pub fn for_layout(layout: &MixerLayout) -> Self {
        Self {
            global: GlobalState::default(),
            tracks: vec![TrackState::default(); layout.tracks],
            groups: vec![StripState::default(); layout.groups],
            auxes: vec![StripState::default(); layout.auxes],
            master: MasterState::default(),
        }
    }

    /// Snapshot every persisted parameter and setting of `mixer`.
    pub fn capture(mixer: &Mixer) -> Self {
        let params = &**mixer.params();
        let tracks = mixer
            .tracks()
            .iter()
            .map(|t| {
                let p = t.params();
                let strip =
                    capture_strip(params, &p.strip, t.settings.local, t.settings.fade_profile);
                TrackState {
                    fader: strip.fader,
                    pan: strip.pan,
                    mute: strip.mute,
                    solo: strip.solo,
                    fade_rate: strip.fade_rate,
                    fade_profile: strip.fade_profile,
                    local: strip.local,
                    group: params.get(p.group) as u32,
                    gain_adjust_db: t.settings.gain_adjust_db,
                    invert: t.settings.invert,
                    hpf_cutoff: t.settings.hpf_cutoff,
                    lpf_cutoff: t.settings.lpf_cutoff,
                }
            })
            .collect();
        let groups = mixer
            .groups()
            .iter()
            .map(|g| capture_strip(params, g.params(), g.settings.local, g.settings.fade_profile))
            .collect();
        let auxes = mixer
            .auxes()
            .iter()
            .map(|a| capture_strip(params, a.params(), a.settings.local, a.settings.fade_profile))
            .collect();

        let master = mixer.master();
        let mp = master.params();
        let master = MasterState {
            fader: params.get(mp.fader),
            mute: params.get_bool(mp.mute),
            dim: params.get_bool(mp.dim),
            mono: params.get_bool(mp.mono),
            fade_rate: params.get(mp.fade_rate),
            fade_profile: master.settings.fade_profile,
            dim_gain_db: master.settings.dim_gain_db,
            dc_block: master.settings.dc_block,
            hard_clip: master.settings.clip_mode == ClipMode::Hard,
        };

        Self {
            global: GlobalState::capture(mixer.global()),
            tracks,
            groups,
            auxes,
            master,
        }
    }

    /// Write this state into `mixer`, then resync its transient state.
    ///
    /// Parameter values are clamped by the bank, unknown selectors keep the
    /// mixer's current value, and entries beyond the mixer's channel counts
    /// are ignored.
    pub fn apply(&self, mixer: &mut Mixer) {
        let params = std::sync::Arc::clone(mixer.params());

        for (i, s) in self.tracks.iter().enumerate() {
            let Some(track) = mixer.track_mut(i) else {
                break;
            };
            let p = *track.params();
            apply_strip(&params, &p.strip, &s.strip());
            params.set(p.group, s.group as f32);
            let settings = &mut track.settings;
            settings.local = LocalSettings::from_packed(s.local);
            settings.fade_profile = profile_or_default(s.fade_profile);
            settings.gain_adjust_db = s.gain_adjust_db;
            settings.invert = s.invert;
            settings.hpf_cutoff = s.hpf_cutoff;
            settings.lpf_cutoff = s.lpf_cutoff;
        }
        for (i, s) in self.groups.iter().enumerate() {
            let Some(group) = mixer.group_mut(i) else {
                break;
            };
            apply_strip(&params, group.params(), s);
            group.settings.local = LocalSettings::from_packed(s.local);
            group.settings.fade_profile = profile_or_default(s.fade_profile);
        }
        for (i, s) in self.auxes.iter().enumerate() {
            let Some(aux) = mixer.aux_mut(i) else {
                break;
            };
            apply_strip(&params, aux.params(), s);
            aux.settings.local = LocalSettings::from_packed(s.local);
            aux.settings.fade_profile = profile_or_default(s.fade_profile);
        }

        let master = mixer.master_mut();
        self.master.apply_params(&params, master.params());
        master.settings.fade_profile = profile_or_default(self.master.fade_profile);
        master.settings.dim_gain_db = self.master.dim_gain_db;
        master.settings.dc_block = self.master.dc_block;
        master.settings.clip_mode = if self.master.hard_clip {
            ClipMode::Hard
        } else {
            ClipMode::Soft
        };

        self.global.apply(mixer.global_mut());
        mixer.reset_non_json();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackmix_mixer::{MixerLayout, TapPoint};

    fn junior() -> Mixer {
        Mixer::new(MixerLayout::JUNIOR, 48000.0).unwrap()
    }

    #[test]
    fn defaults_match_fresh_mixer() {
        let mixer = junior();
        assert_eq!(MixerState::capture(&mixer), MixerState::for_layout(mixer.layout()));
    }

    #[test]
    fn capture_then_apply_restores() {
        let mut source = junior();
        let params = std::sync::Arc::clone(source.params());
        let map = source.param_map().clone();
        params.set(map.tracks[2].strip.fader, 0.4);
        params.set(map.tracks[2].group, 2.0);
        params.set_bool(map.groups[0].solo, true);
        if let Some(t) = source.track_mut(2) {
            t.settings.invert = true;
            t.settings.local.direct_out_tap = TapPoint::PreFader;
        }
        source.master_mut().settings.dc_block = true;
        source.global_mut().set_link_bit_mask(0b110);
        source.global_mut().pan_law_stereo = StereoPanLaw::TruePan;
        let state = MixerState::capture(&source);

        let mut target = junior();
        state.apply(&mut target);
        assert_eq!(MixerState::capture(&target), state);
        assert_eq!(target.global().track_group(2), Some(1));
        assert!(target.global().solo_bit_mask() != 0);
    }

    #[test]
    fn missing_channels_keep_defaults() {
        let mut mixer = junior();
        let state = MixerState {
            tracks: vec![TrackState {
                fader: 0.2,
                ..TrackState::default()
            }],
            ..MixerState::default()
        };
        state.apply(&mut mixer);
        let params = mixer.params();
        let map = mixer.param_map();
        assert_eq!(params.get(map.tracks[0].strip.fader), 0.2);
        assert_eq!(params.get(map.tracks[1].strip.fader), 1.0);
    }

    #[test]
    fn hostile_values_are_sanitised() {
        let mut mixer = junior();
        let mut state = MixerState::for_layout(&MixerLayout::FULL);
        state.tracks[0].fader = 50.0;
        state.tracks[0].pan = f32::NAN;
        state.tracks[0].fade_profile = 700.0;
        state.global.pan_law_mono = 200;
        state.global.eco_divisor = 1000;
        state.apply(&mut mixer);

        let params = mixer.params();
        let map = mixer.param_map();
        assert_eq!(params.get(map.tracks[0].strip.fader), rackmix_mixer::MAX_FADER);
        assert_eq!(params.get(map.tracks[0].strip.pan), 0.5);
        assert_eq!(mixer.tracks()[0].settings.fade_profile, 100.0);
        assert_eq!(mixer.global().pan_law_mono, MonoPanLaw::default());
        assert_eq!(mixer.global().eco_mode.divisor(), 32);
    }
}
