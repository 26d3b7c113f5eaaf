//! Session file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use rackmix_mixer::{Mixer, MixerLayout};

use crate::error::ConfigError;
use crate::state::MixerState;
use crate::validation::{ValidationError, state_issues};

/// Mixer dimensions as stored in a session file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Input tracks
    pub tracks: usize,
    /// Group buses
    pub groups: usize,
    /// Aux returns
    pub auxes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        MixerLayout::default().into()
    }
}

impl From<MixerLayout> for LayoutConfig {
    fn from(l: MixerLayout) -> Self {
        Self {
            tracks: l.tracks,
            groups: l.groups,
            auxes: l.auxes,
        }
    }
}

impl LayoutConfig {
    /// Validated mixer layout.
    pub fn to_layout(self) -> Result<MixerLayout, ConfigError> {
        Ok(MixerLayout::new(self.tracks, self.groups, self.auxes)?)
    }
}

/// A saved mixer: its dimensions, sample rate and full state.
///
/// # TOML Format
///
/// ```toml
/// name = "Live set"
/// sample_rate = 48000
///
/// [layout]
/// tracks = 8
/// groups = 2
/// auxes = 4
///
/// [state.global]
/// eco_divisor = 4
/// link_bit_mask = 3
///
/// [[state.tracks]]
/// fader = 0.8
/// group = 1
///
/// [state.master]
/// dim_gain_db = -20.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Name of the session.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sample rate to run at (defaults to 48000).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Mixer dimensions.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Persisted mixer state.
    #[serde(default)]
    pub state: MixerState,
}

fn default_sample_rate() -> u32 {
    48000
}

impl Session {
    /// A session with default state for `layout`.
    pub fn new(name: impl Into<String>, layout: MixerLayout) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: default_sample_rate(),
            layout: layout.into(),
            state: MixerState::for_layout(&layout),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Snapshot a running mixer.
    pub fn capture(name: impl Into<String>, mixer: &Mixer) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: mixer.sample_rate() as u32,
            layout: (*mixer.layout()).into(),
            state: MixerState::capture(mixer),
        }
    }

    /// Load a session from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let session: Session = toml::from_str(&content)?;
        Ok(session)
    }

    /// Load a session from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the session to a TOML file, creating the parent directory.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the session to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Convert the session to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every problem with the stored state.
    pub fn issues(&self) -> Vec<ValidationError> {
        match self.layout.to_layout() {
            Ok(layout) => state_issues(&self.state, &layout),
            Err(_) => vec![ValidationError::ChannelCount {
                kind: "channels",
                expected: rackmix_mixer::MAX_MASK_CHANNELS,
                found: self.layout.tracks + self.layout.groups,
            }],
        }
    }

    /// Build a mixer for this session and apply its state.
    pub fn build_mixer(&self) -> Result<Mixer, ConfigError> {
        let mut mixer = Mixer::new(self.layout.to_layout()?, self.sample_rate as f32)?;
        self.state.apply(&mut mixer);
        Ok(mixer)
    }

    /// Apply the state to an existing mixer of the same layout.
    pub fn apply_to(&self, mixer: &mut Mixer) -> Result<(), ConfigError> {
        let have = LayoutConfig::from(*mixer.layout());
        for (kind, expected, found) in [
            ("tracks", self.layout.tracks, have.tracks),
            ("groups", self.layout.groups, have.groups),
            ("auxes", self.layout.auxes, have.auxes),
        ] {
            if expected != found {
                return Err(ConfigError::LayoutMismatch { kind, expected, found });
            }
        }
        self.state.apply(mixer);
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new("Untitled", MixerLayout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_sized_for_layout() {
        let session = Session::new("Test", MixerLayout::JUNIOR);
        assert_eq!(session.layout.tracks, 8);
        assert_eq!(session.state.tracks.len(), 8);
        assert_eq!(session.state.groups.len(), 2);
        assert_eq!(session.sample_rate, 48000);
        assert!(session.issues().is_empty());
    }

    #[test]
    fn minimal_toml_loads_with_defaults() {
        let session = Session::from_toml("name = \"Bare\"").unwrap();
        assert_eq!(session.layout, LayoutConfig::default());
        assert_eq!(session.layout.tracks, 16);
        assert!(session.state.tracks.is_empty());
        let mixer = session.build_mixer().unwrap();
        assert_eq!(mixer.layout().tracks, 16);
    }

    #[test]
    fn partial_fields_load() {
        let toml = r#"
            name = "Partial"
            sample_rate = 44100

            [layout]
            tracks = 4
            groups = 1

            [state.global]
            link_bit_mask = 3
            some_future_option = true

            [[state.tracks]]
            fader = 0.5
            group = 1

            [[state.tracks]]
            mute = true
        "#;
        let session = Session::from_toml(toml).unwrap();
        assert_eq!(session.layout.auxes, 4);
        assert_eq!(session.state.tracks[0].fader, 0.5);
        assert_eq!(session.state.tracks[0].pan, 0.5);
        assert!(session.state.tracks[1].mute);

        let mixer = session.build_mixer().unwrap();
        assert_eq!(mixer.sample_rate(), 44100.0);
        assert_eq!(mixer.global().link_bit_mask(), 0b11);
        assert_eq!(mixer.global().track_group(0), Some(0));
    }

    #[test]
    fn impossible_layout_fails_to_build() {
        let mut session = Session::new("Huge", MixerLayout::JUNIOR);
        session.layout.tracks = 40;
        assert!(matches!(session.build_mixer(), Err(ConfigError::Mixer(_))));
        assert_eq!(session.issues().len(), 1);
    }

    #[test]
    fn apply_to_checks_layout() {
        let session = Session::new("Junior", MixerLayout::JUNIOR);
        let mut mixer = Mixer::new(MixerLayout::FULL, 48000.0).unwrap();
        let err = session.apply_to(&mut mixer).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::LayoutMismatch {
                kind: "tracks",
                expected: 8,
                found: 16
            }
        ));
    }

    #[test]
    fn toml_and_json_export() {
        let session = Session::new("Export", MixerLayout::JUNIOR).with_description("for tests");
        let toml = session.to_toml().unwrap();
        assert!(toml.contains("[layout]"));
        assert!(toml.contains("[[state.tracks]]"));
        assert_eq!(Session::from_toml(&toml).unwrap(), session);

        let json = session.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["layout"]["groups"], 2);
        assert_eq!(value["state"]["tracks"].as_array().map(Vec::len), Some(8));
    }
}
