//! Input track strip.
//!
//! Signal chain, per sample:
//!
//! ```text
//! input (poly-summed, clamped) -> gain adjust / invert
//!   -> [HPF/LPF if pre-insert] -> pre-insert tap -> insert send
//!   -> insert return (if connected)
//!   -> [HPF/LPF if post-insert] -> pre-fader tap
//!   -> pan/fader matrix -> post-fader tap
//!   -> mute/solo/fade -> post-mute-solo tap -> group or main mix
//! ```

use rackmix_core::{
    AudioPort, CutFilter, CutKind, HPF_OFF_HZ, Jack, LPF_OFF_HZ, ParamBank, db_to_linear,
};

use crate::global::GlobalInfo;
use crate::pan_law::PanLawSignature;
use crate::params::TrackParams;
use crate::settings::{FilterPos, GAIN_ADJUST_RANGE_DB, HPF_MAX_HZ, LPF_MIN_HZ, TrackSettings};
use crate::strip::{StripCore, Taps, read_cv};

/// Jacks of one track.
#[derive(Debug, Clone, Default)]
pub struct TrackPorts<P = Jack> {
    /// Left (or mono) input
    pub left: P,
    /// Right input; unplugged means mono
    pub right: P,
    /// Fader CV, 0..10 V
    pub fader_cv: P,
    /// Pan CV, ±5 V
    pub pan_cv: P,
    /// Insert return left
    pub insert_return_left: P,
    /// Insert return right
    pub insert_return_right: P,
}

/// Solo resolution for one track.
///
/// Returns 1.0 when the track is audible under `solo_bit_mask`, 0.0 when it
/// is silenced. `group_usage[g]` holds the tracks routed to group `g`;
/// group `g` is bit `tracks + g` of the mask.
///
/// Tie-break order:
///
/// 1. Nothing soloed: audible.
/// 2. Track soloed: audible unless it is grouped, some group is soloed, and
///    that group is not its own.
/// 3. Track not soloed but its group is: audible only when no track of that
///    group is soloed individually.
/// 4. Otherwise silent.
pub fn calc_solo_gain(
    track: usize,
    group: Option<usize>,
    tracks: usize,
    solo_bit_mask: u32,
    group_usage: &[u32],
) -> f32 {
    if solo_bit_mask == 0 {
        return 1.0;
    }
    let own_group_bit = group.map(|g| 1u32 << (tracks + g));
    if solo_bit_mask & (1 << track) != 0 {
        let Some(bit) = own_group_bit else {
            return 1.0;
        };
        let any_group_soloed = solo_bit_mask.checked_shr(tracks as u32).unwrap_or(0) != 0;
        return if !any_group_soloed || solo_bit_mask & bit != 0 { 1.0 } else { 0.0 };
    }
    if let (Some(g), Some(bit)) = (group, own_group_bit) {
        let usage = group_usage.get(g).copied().unwrap_or(0);
        if solo_bit_mask & bit != 0 && usage & solo_bit_mask == 0 {
            return 1.0;
        }
    }
    0.0
}

fn sanitize_cutoff(cutoff: f32, min: f32, max: f32, off: f32) -> f32 {
    if cutoff.is_nan() { off } else { cutoff.clamp(min, max) }
}

/// One input track.
#[derive(Debug, Clone)]
pub struct MixerTrack {
    index: usize,
    params: TrackParams,
    /// Persisted options
    pub settings: TrackSettings,
    core: StripCore,
    hpf: CutFilter,
    lpf: CutFilter,
    input_gain: f32,
    group: Option<usize>,
    stereo: bool,
}

impl MixerTrack {
    /// Track number `index`, bound to its parameter handles.
    pub fn new(index: usize, params: TrackParams, sample_rate: f32) -> Self {
        let mut track = Self {
            index,
            params,
            settings: TrackSettings::default(),
            core: StripCore::new(),
            hpf: CutFilter::new(CutKind::Highpass, sample_rate),
            lpf: CutFilter::new(CutKind::Lowpass, sample_rate),
            input_gain: 1.0,
            group: None,
            stereo: false,
        };
        track.core.set_sample_time(1.0 / sample_rate);
        track
    }

    /// Zero-based track number, also its solo/link mask bit.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Parameter handles.
    pub fn params(&self) -> &TrackParams {
        &self.params
    }

    /// Gain, fade and meter state.
    pub fn core(&self) -> &StripCore {
        &self.core
    }

    /// Group this track feeds, as of the last eco tick.
    pub fn group(&self) -> Option<usize> {
        self.group
    }

    /// Whether the last frame was processed as stereo.
    pub fn is_stereo(&self) -> bool {
        self.stereo
    }

    /// Signal at the direct-out tap.
    pub fn direct_out(&self) -> (f32, f32) {
        self.core.taps().get(self.settings.local.direct_out_tap)
    }

    /// Signal sent to the insert effect.
    pub fn insert_send(&self) -> (f32, f32) {
        self.core.taps().pre_insert
    }

    /// Solo gain of this track under the current global state.
    pub fn calc_solo_gain(&self, global: &GlobalInfo) -> f32 {
        calc_solo_gain(
            self.index,
            global.track_group(self.index),
            global.layout().tracks,
            global.solo_bit_mask(),
            global.group_usage_table(),
        )
    }

    /// Restore default settings and clear transient state.
    pub fn on_reset(&mut self, params: &ParamBank) {
        self.settings = TrackSettings::default();
        self.reset_non_json(params);
    }

    /// Clear filters, slewers and meters; settle the fade at the current
    /// mute state.
    pub fn reset_non_json(&mut self, params: &ParamBank) {
        let fade_target = if params.get_bool(self.params.strip.mute) { 0.0 } else { 1.0 };
        self.core.reset_non_json(fade_target);
        self.hpf.reset();
        self.lpf.reset();
    }

    /// Recompute rate-dependent state.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.core.set_sample_time(1.0 / sample_rate);
        self.hpf.set_sample_rate(sample_rate);
        self.lpf.set_sample_rate(sample_rate);
    }

    fn update_slow<P: AudioPort>(
        &mut self,
        ports: &TrackPorts<P>,
        global: &GlobalInfo,
        params: &ParamBank,
    ) {
        let p = self.params.strip;
        self.group = global.track_group(self.index);

        let gain_db = if self.settings.gain_adjust_db.is_nan() {
            0.0
        } else {
            self.settings.gain_adjust_db.clamp(-GAIN_ADJUST_RANGE_DB, GAIN_ADJUST_RANGE_DB)
        };
        let polarity = if self.settings.invert { -1.0 } else { 1.0 };
        self.input_gain = db_to_linear(gain_db) * polarity;

        let hpf = sanitize_cutoff(self.settings.hpf_cutoff, HPF_OFF_HZ, HPF_MAX_HZ, HPF_OFF_HZ);
        let lpf = sanitize_cutoff(self.settings.lpf_cutoff, LPF_MIN_HZ, LPF_OFF_HZ, LPF_OFF_HZ);
        self.hpf.set_cutoff(hpf);
        self.lpf.set_cutoff(lpf);

        let signature = PanLawSignature {
            local: self.settings.local.pan_law_stereo,
            global_stereo: global.pan_law_stereo,
            global_mono: global.pan_law_mono,
            stereo: self.stereo,
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
            global.fade_other_linked_tracks(params, self.index, mute_target);
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

    #[inline]
    fn filter(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (l, r) = self.hpf.process(left, right, self.stereo);
        self.lpf.process(l, r, self.stereo)
    }

    /// Process one frame and return the post-mute-solo signal.
    ///
    /// The caller routes the result to [`group`](Self::group) or to the
    /// main mix.
    pub fn process<P: AudioPort>(
        &mut self,
        ports: &TrackPorts<P>,
        global: &GlobalInfo,
        params: &ParamBank,
        eco: bool,
    ) -> (f32, f32) {
        let insert_stereo =
            ports.insert_return_left.is_connected() && ports.insert_return_right.is_connected();
        self.stereo = ports.right.is_connected() || insert_stereo;
        if eco {
            self.update_slow(ports, global, params);
        }

        let left = ports.left.poly_sum();
        let right = if ports.right.is_connected() { ports.right.poly_sum() } else { left };
        let (mut l, mut r) = (left * self.input_gain, right * self.input_gain);

        let filter_pre = self.settings.local.filter_pos == FilterPos::PreInsert;
        if filter_pre {
            (l, r) = self.filter(l, r);
        }
        let pre_insert = (l, r);

        if ports.insert_return_left.is_connected() {
            l = ports.insert_return_left.poly_sum();
            r = if insert_stereo { ports.insert_return_right.poly_sum() } else { l };
        }
        if !filter_pre {
            (l, r) = self.filter(l, r);
        }
        let pre_fader = (l, r);

        let post_fader = self.core.apply_gain(l, r);
        let post_mute_solo = self.core.apply_mute_solo(post_fader.0, post_fader.1);
        self.core.finish(Taps {
            pre_insert,
            pre_fader,
            post_fader,
            post_mute_solo,
        });
        post_mute_solo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MixerLayout;
    use crate::params::ParamMap;

    const TRACKS: usize = 8;

    fn gain(track: usize, group: Option<usize>, mask: u32, usage: &[u32]) -> f32 {
        calc_solo_gain(track, group, TRACKS, mask, usage)
    }

    fn group_bit(g: usize) -> u32 {
        1 << (TRACKS + g)
    }

    #[test]
    fn nothing_soloed_everyone_plays() {
        assert_eq!(gain(3, None, 0, &[0; 3]), 1.0);
        assert_eq!(gain(3, Some(1), 0, &[0; 3]), 1.0);
    }

    #[test]
    fn self_solo_branches() {
        let usage = [0, 0b1000, 0, 0b1000];
        // Soloed, ungrouped
        assert_eq!(gain(3, None, 1 << 3, &usage), 1.0);
        // Soloed, grouped, no group soloed
        assert_eq!(gain(3, Some(1), 1 << 3, &usage), 1.0);
        // Soloed, grouped, own group soloed
        assert_eq!(gain(3, Some(1), (1 << 3) | group_bit(1), &usage), 1.0);
        // Soloed, grouped, a different group soloed
        assert_eq!(gain(3, Some(1), (1 << 3) | group_bit(0), &usage), 0.0);
    }

    #[test]
    fn group_solo_branches() {
        // Tracks 1 and 2 in group 0
        let usage = [0b110, 0, 0b110];
        let mask = group_bit(0);
        assert_eq!(gain(1, Some(0), mask, &usage), 1.0);
        assert_eq!(gain(2, Some(0), mask, &usage), 1.0);
        // Sibling 2 soloed inside the soloed group mutes track 1
        let mask = group_bit(0) | (1 << 2);
        assert_eq!(gain(1, Some(0), mask, &usage), 0.0);
        assert_eq!(gain(2, Some(0), mask, &usage), 1.0);
    }

    #[test]
    fn unsoloed_outsider_is_silent() {
        assert_eq!(gain(5, None, 1 << 0, &[0; 3]), 0.0);
        assert_eq!(gain(5, Some(1), group_bit(0), &[0b1, 0b10_0000, 0]), 0.0);
    }

    #[test]
    fn solo_scenario_track_and_group() {
        // Track 0 and group 1 soloed; tracks 0 and 2 in group 1
        let usage = [0, 0b101, 0b101];
        let mask = 1 | group_bit(1);
        assert_eq!(gain(0, Some(1), mask, &usage), 1.0);
        assert_eq!(gain(2, Some(1), mask, &usage), 0.0);
    }

    fn track_fixture() -> (ParamBank, ParamMap, GlobalInfo, MixerTrack) {
        let layout = MixerLayout::JUNIOR;
        let (bank, map) = ParamMap::build(&layout).unwrap();
        let mut global = GlobalInfo::new(layout, &map, 1000.0);
        global.on_reset(&bank);
        global.eco_mode = crate::global::EcoMode::OFF;
        let mut track = MixerTrack::new(0, map.tracks[0], 1000.0);
        track.on_reset(&bank);
        (bank, map, global, track)
    }

    fn settle(
        track: &mut MixerTrack,
        ports: &TrackPorts,
        global: &GlobalInfo,
        bank: &ParamBank,
    ) -> (f32, f32) {
        let mut out = (0.0, 0.0);
        for _ in 0..200 {
            out = track.process(ports, global, bank, true);
        }
        out
    }

    #[test]
    fn mono_input_centre_is_unity() {
        let (bank, _, global, mut track) = track_fixture();
        let ports = TrackPorts {
            left: Jack::mono(2.0),
            ..TrackPorts::default()
        };
        let (l, r) = settle(&mut track, &ports, &global, &bank);
        assert!((l - 2.0).abs() < 1e-5 && (r - 2.0).abs() < 1e-5, "{l} {r}");
        assert!(!track.is_stereo());
    }

    #[test]
    fn invert_and_gain_adjust() {
        let (bank, _, global, mut track) = track_fixture();
        track.settings.invert = true;
        track.settings.gain_adjust_db = 6.020_6;
        let ports = TrackPorts {
            left: Jack::mono(1.0),
            right: Jack::mono(0.5),
            ..TrackPorts::default()
        };
        let (l, r) = settle(&mut track, &ports, &global, &bank);
        assert!((l + 2.0).abs() < 1e-3 && (r + 1.0).abs() < 1e-3, "{l} {r}");
        assert_eq!(track.insert_send(), track.core().taps().pre_insert);
    }

    #[test]
    fn mute_silences_and_taps_follow_chain() {
        let (bank, map, global, mut track) = track_fixture();
        bank.set_bool(map.tracks[0].strip.mute, true);
        let ports = TrackPorts {
            left: Jack::mono(3.0),
            right: Jack::mono(3.0),
            ..TrackPorts::default()
        };
        let out = settle(&mut track, &ports, &global, &bank);
        assert_eq!(out, (0.0, 0.0));
        let taps = track.core().taps();
        assert_eq!(taps.pre_fader, (3.0, 3.0));
        assert!((taps.post_fader.0 - 3.0).abs() < 1e-5);
        assert_eq!(track.direct_out(), (0.0, 0.0));
    }

    #[test]
    fn insert_return_replaces_signal() {
        let (bank, _, global, mut track) = track_fixture();
        let ports = TrackPorts {
            left: Jack::mono(1.0),
            insert_return_left: Jack::mono(4.0),
            ..TrackPorts::default()
        };
        let (l, _) = settle(&mut track, &ports, &global, &bank);
        assert!((l - 4.0).abs() < 1e-5);
        assert_eq!(track.insert_send(), (1.0, 1.0));
    }

    #[test]
    fn fader_cv_halves_fader() {
        let (bank, _, global, mut track) = track_fixture();
        let ports = TrackPorts {
            left: Jack::mono(1.0),
            fader_cv: Jack::mono(5.0),
            ..TrackPorts::default()
        };
        let (l, _) = settle(&mut track, &ports, &global, &bank);
        assert_eq!(track.core().fader_with_cv(), 0.5);
        assert!((l - 0.125).abs() < 1e-5);
    }

    #[test]
    fn overloaded_input_is_clamped() {
        let (bank, _, global, mut track) = track_fixture();
        let ports = TrackPorts {
            left: Jack::mono(100.0),
            ..TrackPorts::default()
        };
        let (l, _) = settle(&mut track, &ports, &global, &bank);
        assert!((l - 20.0).abs() < 1e-4);
    }
}
