//! Integration tests for rackmix-config.
//!
//! These tests verify end-to-end functionality across modules.

use std::sync::Arc;

use rackmix_config::{ConfigError, MixerState, Session};
use rackmix_core::Jack;
use rackmix_mixer::{Mixer, MixerInputs, MixerLayout, MixerOutputs, StereoPanLaw, TapPoint};
use tempfile::TempDir;

fn run(mixer: &mut Mixer, inputs: &MixerInputs, frames: usize) -> (f32, f32) {
    let mut outputs = MixerOutputs::new(mixer.layout());
    for _ in 0..frames {
        mixer.process(inputs, &mut outputs);
    }
    outputs.main
}

/// A configured mixer saved to disk and loaded back sounds the same.
#[test]
fn test_session_save_load_same_output() {
    let layout = MixerLayout::JUNIOR;
    let mut mixer = Mixer::new(layout, 48000.0).unwrap();
    let params = Arc::clone(mixer.params());
    let map = mixer.param_map().clone();
    params.set(map.tracks[0].strip.pan, 0.2);
    params.set(map.tracks[1].strip.fader, 0.6);
    params.set(map.tracks[1].group, 1.0);
    params.set(map.groups[0].pan, 0.8);
    params.set_bool(map.master.dim, true);
    mixer.global_mut().pan_law_stereo = StereoPanLaw::TruePan;
    if let Some(track) = mixer.track_mut(1) {
        track.settings.invert = true;
    }

    let mut inputs: MixerInputs = MixerInputs::new(&layout);
    inputs.tracks[0].left = Jack::mono(1.0);
    inputs.tracks[1].left = Jack::mono(0.5);
    inputs.tracks[1].right = Jack::mono(-0.25);
    let expected = run(&mut mixer, &inputs, 9600);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sessions").join("live.toml");
    Session::capture("Live", &mixer).save(&path).expect("save should create the directory");
    assert!(path.exists());

    let loaded = Session::load(&path).unwrap();
    assert!(loaded.issues().is_empty(), "{:?}", loaded.issues());
    let mut restored = loaded.build_mixer().unwrap();
    let actual = run(&mut restored, &inputs, 9600);
    assert!((actual.0 - expected.0).abs() < 1e-5, "{actual:?} vs {expected:?}");
    assert!((actual.1 - expected.1).abs() < 1e-5, "{actual:?} vs {expected:?}");
}

/// A half-log fade profile survives save and load, and a fade-out a
/// quarter of the way through sits halfway between the linear and full-log
/// curves.
#[test]
fn test_half_log_profile_round_trips() {
    let mut session = Session::new("Fade", MixerLayout::JUNIOR);
    session.state.tracks[0].fade_profile = -50.0;
    session.state.tracks[0].fade_rate = 1.0;
    session.state.global.eco_divisor = 1;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fade.toml");
    session.save(&path).unwrap();
    let loaded = Session::load(&path).unwrap();
    assert!(loaded.issues().is_empty(), "{:?}", loaded.issues());
    assert_eq!(loaded.state.tracks[0].fade_profile, -50.0);

    let mut mixer = loaded.build_mixer().unwrap();
    assert_eq!(mixer.tracks()[0].settings.fade_profile, -50.0);
    let params = Arc::clone(mixer.params());
    let mute = mixer.param_map().tracks[0].strip.mute;
    let inputs: MixerInputs = MixerInputs::new(mixer.layout());
    run(&mut mixer, &inputs, 1);

    // 0.25 s into a 1 s fade-out
    params.set_bool(mute, true);
    run(&mut mixer, &inputs, 12000);
    let gain = mixer.tracks()[0].core().fade().gain();
    let linear = 0.75;
    let full_log = 1.0 - 0.25f32.powi(3);
    assert!(gain > linear && gain < full_log, "{gain}");
    assert!((gain - 0.5 * (linear + full_log)).abs() < 2e-3, "{gain}");
}

/// Loading a session onto a running mixer replaces its state.
#[test]
fn test_apply_to_running_mixer() {
    let layout = MixerLayout::JUNIOR;
    let mut session = Session::new("Preset", layout);
    session.state.tracks[0].mute = true;
    session.state.tracks[2].local = rackmix_mixer::LocalSettings {
        direct_out_tap: TapPoint::PreFader,
        ..Default::default()
    }
    .to_packed();

    let mut mixer = Mixer::new(layout, 48000.0).unwrap();
    let mut inputs: MixerInputs = MixerInputs::new(&layout);
    inputs.tracks[0].left = Jack::mono(1.0);
    assert!((run(&mut mixer, &inputs, 4800).0 - 1.0).abs() < 1e-4);

    session.apply_to(&mut mixer).unwrap();
    assert!(run(&mut mixer, &inputs, 4800).0.abs() < 1e-6);
    assert_eq!(mixer.tracks()[2].settings.local.direct_out_tap, TapPoint::PreFader);
}

/// A file with bad values loads, reports them, and still builds a mixer.
#[test]
fn test_bad_values_load_with_warnings() {
    let toml = r#"
        name = "Damaged"

        [layout]
        tracks = 8
        groups = 2
        auxes = 2

        [state.global]
        pan_law_mono = 9

        [[state.tracks]]
        fader = 3.0
        hpf_cutoff = 5000.0
    "#;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("damaged.toml");
    std::fs::write(&path, toml).unwrap();

    let session = Session::load(&path).unwrap();
    assert_eq!(session.issues().len(), 3);
    let mixer = session.build_mixer().unwrap();
    assert_eq!(mixer.layout().auxes, 2);
    assert_eq!(
        mixer.params().get(mixer.param_map().tracks[0].strip.fader),
        rackmix_mixer::MAX_FADER
    );
}

/// Missing files and malformed TOML surface as distinct errors.
#[test]
fn test_load_errors() {
    let dir = TempDir::new().unwrap();
    let missing = Session::load(dir.path().join("nope.toml"));
    assert!(matches!(missing, Err(ConfigError::ReadFile { .. })));

    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "name = [unterminated").unwrap();
    assert!(matches!(Session::load(&path), Err(ConfigError::TomlParse(_))));
}

/// State captured from a fresh mixer is the documented default.
#[test]
fn test_fresh_capture_is_default() {
    let mixer = Mixer::new(MixerLayout::FULL, 48000.0).unwrap();
    let session = Session::capture("Fresh", &mixer);
    assert_eq!(session.state, MixerState::for_layout(&MixerLayout::FULL));
    assert_eq!(session, Session::new("Fresh", MixerLayout::FULL));
}
