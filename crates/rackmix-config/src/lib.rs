//! Session persistence for the rackmix mixer.
//!
//! A mixer's persisted state is a flat set of named fields: fader, pan,
//! mute and solo per channel, fade rate and profile, filter cutoffs, packed
//! per-channel options, pan-law selections and the link mask. This crate
//! stores them as TOML (with a JSON export), loads them field by field so
//! older and newer files both work, and validates them against a layout.
//!
//! # Features
//!
//! - **Sessions**: [`Session`] load/save with layout and sample rate
//! - **State**: [`MixerState`] capture from and apply to a running [`Mixer`](rackmix_mixer::Mixer)
//! - **Validation**: report out-of-range values without refusing the file
//!
//! # Example
//!
//! ```rust,no_run
//! use rackmix_config::Session;
//!
//! let session = Session::load("live.toml").unwrap();
//! for issue in session.issues() {
//!     eprintln!("warning: {issue}");
//! }
//! let mut mixer = session.build_mixer().unwrap();
//! ```

mod error;
mod session;
mod state;

/// Session validation.
pub mod validation;

pub use error::ConfigError;
pub use session::{LayoutConfig, Session};
pub use state::{GlobalState, MasterState, MixerState, StripState, TrackState};
pub use validation::{ValidationError, ValidationResult, state_issues, validate_state};
