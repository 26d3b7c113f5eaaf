//! Property-based tests for rackmix-mixer.
//!
//! Covers pan matrix bounds, solo resolution, fade continuity, linked
//! fader clamping and output bounds of a whole mixer using proptest for
//! randomized inputs.

use std::sync::Arc;

use proptest::prelude::*;
use rackmix_core::{CLIP_CEILING_V, Jack};
use rackmix_mixer::{
    FadeEnvelope, GlobalInfo, MAX_FADER, Mixer, MixerInputs, MixerLayout, MixerOutputs, MonoPanLaw,
    ParamMap, StereoPanLaw, calc_aux_solo_gain, calc_solo_gain, mono_pan_matrix, stereo_pan_matrix,
};

const TRACKS: usize = 16;
const GROUPS: usize = 4;

fn mono_law() -> impl Strategy<Value = MonoPanLaw> {
    (0u8..4).prop_map(|i| MonoPanLaw::from_index(i).unwrap_or_default())
}

fn stereo_law() -> impl Strategy<Value = StereoPanLaw> {
    (0u8..3).prop_map(|i| StereoPanLaw::from_index(i).unwrap_or_default())
}

/// Group usage table consistent with `assignments` (one entry per track).
fn usage_for(assignments: &[Option<usize>]) -> Vec<u32> {
    let mut usage = vec![0u32; GROUPS + 1];
    for (t, g) in assignments.iter().enumerate() {
        if let Some(g) = *g {
            usage[g] |= 1 << t;
            usage[GROUPS] |= 1 << t;
        }
    }
    usage
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Mono matrices never cross-feed, never go negative and never exceed +6 dB.
    #[test]
    fn mono_pan_bounded(pan in -0.5f32..1.5f32, law in mono_law()) {
        let m = mono_pan_matrix(pan, law);
        prop_assert_eq!(m.0[2], 0.0);
        prop_assert_eq!(m.0[3], 0.0);
        for lane in &m.0[..2] {
            prop_assert!((0.0..=2.0 + 1e-5).contains(lane), "{:?}", m);
        }
    }

    /// Stereo matrices stay in `[0, √2]` on every lane.
    #[test]
    fn stereo_pan_bounded(pan in -0.5f32..1.5f32, law in stereo_law()) {
        let m = stereo_pan_matrix(pan, law);
        for lane in &m.0 {
            prop_assert!((0.0..=core::f32::consts::SQRT_2 + 1e-5).contains(lane), "{:?}", m);
        }
    }

    /// Every law leaves a centred source untouched.
    #[test]
    fn centre_is_unity(mono in mono_law(), stereo in stereo_law()) {
        let m = mono_pan_matrix(0.5, mono);
        prop_assert!((m.0[0] - 1.0).abs() < 1e-5 && (m.0[1] - 1.0).abs() < 1e-5);
        let s = stereo_pan_matrix(0.5, stereo);
        prop_assert!((s.0[0] - 1.0).abs() < 1e-5 && (s.0[1] - 1.0).abs() < 1e-5);
        prop_assert!(s.0[2].abs() < 1e-5 && s.0[3].abs() < 1e-5);
    }

    /// Solo gain is binary, and with nothing soloed everyone plays.
    #[test]
    fn solo_gain_binary(
        groups in prop::collection::vec(prop::option::of(0usize..GROUPS), TRACKS),
        mask in any::<u32>(),
        track in 0usize..TRACKS,
    ) {
        let mask = mask & ((1 << (TRACKS + GROUPS)) - 1);
        let usage = usage_for(&groups);
        let g = calc_solo_gain(track, groups[track], TRACKS, mask, &usage);
        prop_assert!(g == 0.0 || g == 1.0);
        prop_assert_eq!(calc_solo_gain(track, groups[track], TRACKS, 0, &usage), 1.0);
    }

    /// A soloed ungrouped track always plays.
    #[test]
    fn soloed_ungrouped_track_plays(mask in any::<u32>(), track in 0usize..TRACKS) {
        let mask = (mask & ((1 << (TRACKS + GROUPS)) - 1)) | (1 << track);
        prop_assert_eq!(calc_solo_gain(track, None, TRACKS, mask, &[0; GROUPS + 1]), 1.0);
    }

    /// Aux solo gain is binary and a soloed aux always plays.
    #[test]
    fn aux_solo_gain_binary(
        aux in 0usize..4,
        aux_mask in 0u32..16,
        mask in any::<u32>(),
        muted in any::<bool>(),
    ) {
        let g = calc_aux_solo_gain(aux, aux_mask, mask, muted);
        prop_assert!(g == 0.0 || g == 1.0);
        if aux_mask & (1 << aux) != 0 {
            prop_assert_eq!(g, 1.0);
        }
    }

    /// Fade gain stays in `[0, 1]` and never moves faster than the steepest
    /// fade curve allows, however often the target flips.
    #[test]
    fn fade_gain_continuous(
        targets in prop::collection::vec(any::<bool>(), 1..12),
        fade_rate in 0.1f32..5.0f32,
        profile in -1.0f32..1.0f32,
        symmetrical in any::<bool>(),
        hold in 10usize..400,
    ) {
        let step_time = 4.0 / 48000.0;
        // Steepest slope of any fade curve is 3
        let max_step = 3.0 * step_time / fade_rate + 1e-4;
        let mut fade = FadeEnvelope::new();
        let mut last = fade.gain();
        for open in targets {
            let target = if open { 1.0 } else { 0.0 };
            for _ in 0..hold {
                fade.process(target, fade_rate, profile, symmetrical, step_time);
                let g = fade.gain();
                prop_assert!((0.0..=1.0).contains(&g));
                prop_assert!((g - last).abs() <= max_step, "jump {} -> {}", last, g);
                last = g;
            }
        }
    }

    /// A linked fader pass keeps every fader in range, leaves unlinked
    /// faders alone and settles in one pass.
    #[test]
    fn linked_faders_clamped_and_settled(
        start in prop::collection::vec(0.0f32..MAX_FADER, 10),
        links in 0u32..1024,
        moved in 0usize..10,
        value in 0.0f32..MAX_FADER,
    ) {
        let layout = MixerLayout::JUNIOR;
        let (bank, map) = ParamMap::build(&layout).unwrap();
        let mut global = GlobalInfo::new(layout, &map, 48000.0);
        let fader = |c: usize| map.mask_strip(c).unwrap().fader;
        for (c, v) in start.iter().enumerate() {
            bank.set(fader(c), *v);
        }
        global.reset_linked_faders(&bank);
        global.set_link_bit_mask(links);

        bank.set(fader(moved), value);
        global.process_linked_faders(&bank);
        let after: Vec<f32> = (0..10).map(|c| bank.get(fader(c))).collect();
        for (c, v) in after.iter().enumerate() {
            prop_assert!((0.0..=MAX_FADER).contains(v));
            if c != moved && links & (1 << c) == 0 {
                prop_assert_eq!(*v, start[c]);
            }
        }
        prop_assert_eq!(after[moved], value);

        global.process_linked_faders(&bank);
        let again: Vec<f32> = (0..10).map(|c| bank.get(fader(c))).collect();
        prop_assert_eq!(again, after);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Whatever the inputs and settings, the main output is finite and
    /// inside the clip ceiling.
    #[test]
    fn main_output_bounded(
        voltages in prop::collection::vec(-40.0f32..40.0f32, 8),
        faders in prop::collection::vec(0.0f32..MAX_FADER, 8),
        pans in prop::collection::vec(0.0f32..1.0f32, 8),
        aux in -40.0f32..40.0f32,
        law in stereo_law(),
    ) {
        let layout = MixerLayout::JUNIOR;
        let mut mixer = Mixer::new(layout, 48000.0).unwrap();
        mixer.global_mut().pan_law_stereo = law;
        let params = Arc::clone(mixer.params());
        let map = mixer.param_map().clone();
        let mut inputs: MixerInputs = MixerInputs::new(&layout);
        let mut outputs = MixerOutputs::new(&layout);
        for t in 0..8 {
            params.set(map.tracks[t].strip.fader, faders[t]);
            params.set(map.tracks[t].strip.pan, pans[t]);
            inputs.tracks[t].left = Jack::mono(voltages[t]);
            if t % 2 == 1 {
                inputs.tracks[t].right = Jack::mono(-voltages[t]);
            }
        }
        inputs.auxes[0].left = Jack::mono(aux);
        for _ in 0..2048 {
            mixer.process(&inputs, &mut outputs);
            let (l, r) = outputs.main;
            prop_assert!(l.is_finite() && r.is_finite());
            prop_assert!(l.abs() <= CLIP_CEILING_V + 1e-4 && r.abs() <= CLIP_CEILING_V + 1e-4);
        }
    }
}
