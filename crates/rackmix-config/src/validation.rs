//! Session validation.
//!
//! Loading never fails on a bad value; [`MixerState::apply`] clamps or
//! ignores whatever it cannot use. Validation is the separate, explicit step
//! that reports those values, so tools can warn about a file instead of
//! silently rewriting it.
//!
//! # Example
//!
//! ```rust
//! use rackmix_config::{MixerState, state_issues};
//! use rackmix_mixer::MixerLayout;
//!
//! let mut state = MixerState::for_layout(&MixerLayout::JUNIOR);
//! state.tracks[0].pan = 1.5;
//! let issues = state_issues(&state, &MixerLayout::JUNIOR);
//! assert_eq!(issues.len(), 1);
//! assert!(issues[0].to_string().contains("tracks[0].pan"));
//! ```

use rackmix_core::{HPF_OFF_HZ, LPF_OFF_HZ};
use rackmix_mixer::{
    EcoMode, FADE_PROFILE_RANGE, FilterPos, MAX_FADE_RATE, MAX_FADER, MixerLayout, MonoPanLaw,
    StereoPanLaw, TapPoint,
    master::MIN_DIM_GAIN_DB,
    settings::{FOLLOW_GLOBAL, GAIN_ADJUST_RANGE_DB, HPF_MAX_HZ, LPF_MIN_HZ},
};
use thiserror::Error;

use crate::state::{MixerState, StripState, TrackState};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Value outside its range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Path of the field, e.g. `tracks[3].fader`.
        field: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Selector, packed setting or mask with no meaning.
    #[error("'{field}' has invalid value {value:#x}")]
    InvalidValue {
        /// Path of the field.
        field: String,
        /// The raw value.
        value: u32,
    },

    /// More channels than the layout has.
    #[error("{found} {kind} in session, layout has {expected}")]
    ChannelCount {
        /// Channel kind ("tracks", "groups" or "auxes").
        kind: &'static str,
        /// Count in the layout.
        expected: usize,
        /// Count in the session.
        found: usize,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", join_errors(.0))]
    Multiple(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

struct Checker {
    issues: Vec<ValidationError>,
}

impl Checker {
    fn range(&mut self, field: impl FnOnce() -> String, value: f32, min: f32, max: f32) {
        if !(min..=max).contains(&value) {
            self.issues.push(ValidationError::OutOfRange {
                field: field(),
                value,
                min,
                max,
            });
        }
    }

    fn valid(&mut self, field: impl FnOnce() -> String, value: u32, ok: bool) {
        if !ok {
            self.issues.push(ValidationError::InvalidValue { field: field(), value });
        }
    }

    fn count(&mut self, kind: &'static str, expected: usize, found: usize) {
        if found > expected {
            self.issues.push(ValidationError::ChannelCount { kind, expected, found });
        }
    }

    fn local(&mut self, prefix: &str, packed: u32) {
        let byte = |shift: u32| ((packed >> shift) & 0xFF) as u8;
        let law = byte(8);
        let ok = TapPoint::from_index(byte(0)).is_some()
            && (law == FOLLOW_GLOBAL || StereoPanLaw::from_index(law).is_some())
            && FilterPos::from_index(byte(16)).is_some()
            && packed >> 24 == 0;
        self.valid(|| format!("{prefix}.local"), packed, ok);
    }

    fn strip(&mut self, prefix: &str, s: &StripState) {
        self.range(|| format!("{prefix}.fader"), s.fader, 0.0, MAX_FADER);
        self.range(|| format!("{prefix}.pan"), s.pan, 0.0, 1.0);
        self.range(|| format!("{prefix}.fade_rate"), s.fade_rate, 0.0, MAX_FADE_RATE);
        self.range(
            || format!("{prefix}.fade_profile"),
            s.fade_profile,
            -FADE_PROFILE_RANGE,
            FADE_PROFILE_RANGE,
        );
        self.local(prefix, s.local);
    }

    fn track(&mut self, prefix: &str, t: &TrackState, groups: usize) {
        self.strip(prefix, &t.strip());
        self.valid(|| format!("{prefix}.group"), t.group, t.group as usize <= groups);
        self.range(
            || format!("{prefix}.gain_adjust_db"),
            t.gain_adjust_db,
            -GAIN_ADJUST_RANGE_DB,
            GAIN_ADJUST_RANGE_DB,
        );
        self.range(|| format!("{prefix}.hpf_cutoff"), t.hpf_cutoff, HPF_OFF_HZ, HPF_MAX_HZ);
        self.range(|| format!("{prefix}.lpf_cutoff"), t.lpf_cutoff, LPF_MIN_HZ, LPF_OFF_HZ);
    }
}

/// Every problem with `state` when applied to a mixer of `layout`.
pub fn state_issues(state: &MixerState, layout: &MixerLayout) -> Vec<ValidationError> {
    let mut c = Checker { issues: Vec::new() };

    let g = &state.global;
    c.valid(
        || "global.pan_law_mono".into(),
        u32::from(g.pan_law_mono),
        MonoPanLaw::from_index(g.pan_law_mono).is_some(),
    );
    c.valid(
        || "global.pan_law_stereo".into(),
        u32::from(g.pan_law_stereo),
        StereoPanLaw::from_index(g.pan_law_stereo).is_some(),
    );
    c.valid(
        || "global.eco_divisor".into(),
        g.eco_divisor,
        EcoMode::from_divisor(g.eco_divisor).divisor() == g.eco_divisor,
    );
    let mask_bits = layout.mask_channels();
    let link_ok = mask_bits >= 32 || g.link_bit_mask >> mask_bits == 0;
    c.valid(|| "global.link_bit_mask".into(), g.link_bit_mask, link_ok);

    c.count("tracks", layout.tracks, state.tracks.len());
    c.count("groups", layout.groups, state.groups.len());
    c.count("auxes", layout.auxes, state.auxes.len());
    for (i, t) in state.tracks.iter().enumerate() {
        c.track(&format!("tracks[{i}]"), t, layout.groups);
    }
    for (i, s) in state.groups.iter().enumerate() {
        c.strip(&format!("groups[{i}]"), s);
    }
    for (i, s) in state.auxes.iter().enumerate() {
        c.strip(&format!("auxes[{i}]"), s);
    }

    let m = &state.master;
    c.range(|| "master.fader".into(), m.fader, 0.0, MAX_FADER);
    c.range(|| "master.fade_rate".into(), m.fade_rate, 0.0, MAX_FADE_RATE);
    c.range(
        || "master.fade_profile".into(),
        m.fade_profile,
        -FADE_PROFILE_RANGE,
        FADE_PROFILE_RANGE,
    );
    c.range(|| "master.dim_gain_db".into(), m.dim_gain_db, MIN_DIM_GAIN_DB, 0.0);

    c.issues
}

/// Validate `state` against `layout`, failing on the first problem found
/// (or all of them, as [`ValidationError::Multiple`]).
pub fn validate_state(state: &MixerState, layout: &MixerLayout) -> ValidationResult<()> {
    let mut issues = state_issues(state, layout);
    match issues.len() {
        0 => Ok(()),
        1 => Err(issues.remove(0)),
        _ => Err(ValidationError::Multiple(issues)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: MixerLayout = MixerLayout::JUNIOR;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_state(&MixerState::for_layout(&LAYOUT), &LAYOUT), Ok(()));
        assert_eq!(validate_state(&MixerState::default(), &LAYOUT), Ok(()));
    }

    #[test]
    fn nan_is_out_of_range() {
        let mut state = MixerState::for_layout(&LAYOUT);
        state.groups[1].fader = f32::NAN;
        let issues = state_issues(&state, &LAYOUT);
        assert!(matches!(
            &issues[..],
            [ValidationError::OutOfRange { field, .. }] if field == "groups[1].fader"
        ));
    }

    #[test]
    fn group_selector_bounded_by_layout() {
        let mut state = MixerState::for_layout(&LAYOUT);
        state.tracks[4].group = 2;
        assert!(state_issues(&state, &LAYOUT).is_empty());
        state.tracks[4].group = 3;
        assert_eq!(
            state_issues(&state, &LAYOUT),
            vec![ValidationError::InvalidValue {
                field: "tracks[4].group".into(),
                value: 3
            }]
        );
    }

    #[test]
    fn packed_settings_checked_bytewise() {
        let mut state = MixerState::for_layout(&LAYOUT);
        state.auxes[0].local = 0x0001_0203;
        assert!(state_issues(&state, &LAYOUT).is_empty());
        state.auxes[0].local = 0x0001_0903;
        let err = validate_state(&state, &LAYOUT).unwrap_err();
        assert_eq!(err.to_string(), "'auxes[0].local' has invalid value 0x10903");
    }

    #[test]
    fn global_selectors_and_masks() {
        let mut state = MixerState::for_layout(&LAYOUT);
        state.global.eco_divisor = 6;
        state.global.pan_law_stereo = 3;
        state.global.link_bit_mask = 1 << 10;
        let err = validate_state(&state, &LAYOUT).unwrap_err();
        let ValidationError::Multiple(all) = err else {
            panic!("expected several issues");
        };
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn extra_channels_reported() {
        let state = MixerState::for_layout(&MixerLayout::FULL);
        let issues = state_issues(&state, &LAYOUT);
        assert!(issues.contains(&ValidationError::ChannelCount {
            kind: "tracks",
            expected: 8,
            found: 16
        }));
        assert!(issues.contains(&ValidationError::ChannelCount {
            kind: "groups",
            expected: 2,
            found: 4
        }));
        // 16 tracks against 2 groups: every track is still valid on its own
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn fade_profile_spans_plus_minus_hundred() {
        let mut state = MixerState::for_layout(&LAYOUT);
        state.tracks[0].fade_profile = -50.0;
        state.groups[0].fade_profile = 100.0;
        state.master.fade_profile = -100.0;
        assert!(state_issues(&state, &LAYOUT).is_empty());

        state.auxes[2].fade_profile = 150.0;
        assert_eq!(
            state_issues(&state, &LAYOUT),
            vec![ValidationError::OutOfRange {
                field: "auxes[2].fade_profile".into(),
                value: 150.0,
                min: -100.0,
                max: 100.0
            }]
        );
    }

    #[test]
    fn master_dim_range() {
        let mut state = MixerState::default();
        state.master.dim_gain_db = 3.0;
        assert!(validate_state(&state, &LAYOUT).is_err());
    }
}
