//! CLI command implementations.

pub mod params;
pub mod render;
pub mod session;

use clap::Args;
use rackmix_mixer::MixerLayout;

/// Mixer dimensions shared by commands that build a layout from flags.
#[derive(Args, Debug, Clone, Copy)]
pub struct LayoutArgs {
    /// Number of input tracks
    #[arg(long, default_value_t = MixerLayout::FULL.tracks)]
    pub tracks: usize,

    /// Number of group buses
    #[arg(long, default_value_t = MixerLayout::FULL.groups)]
    pub groups: usize,

    /// Number of aux returns
    #[arg(long, default_value_t = MixerLayout::FULL.auxes)]
    pub auxes: usize,
}

impl LayoutArgs {
    /// Validated layout.
    pub fn to_layout(self) -> anyhow::Result<MixerLayout> {
        Ok(MixerLayout::new(self.tracks, self.groups, self.auxes)?)
    }
}
