//! Mixer-wide control state shared by every stage.
//!
//! [`GlobalInfo`] has no audio of its own. Once per eco tick, before any
//! stage runs, the [`Mixer`](crate::Mixer) asks it to:
//!
//! 1. rebuild the group-usage table if any track changed group,
//! 2. rescan the solo buttons into the solo bitmasks,
//! 3. propagate linked fader movements.
//!
//! Stages then read the results through `&GlobalInfo`. Bit `i` of the solo
//! and link masks is track `i` for `i < tracks` and group `i - tracks`
//! after that.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use rackmix_core::{ParamBank, ParamHandle};

use crate::fade::is_fade_rate;
use crate::layout::MixerLayout;
use crate::pan_law::{MonoPanLaw, StereoPanLaw};
use crate::params::{MAX_FADER, ParamMap, StripParams};

/// Control-rate sub-sampling: control work runs on one sample out of
/// every `divisor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EcoMode {
    divisor: u32,
}

impl EcoMode {
    /// Control work every sample.
    pub const OFF: Self = Self { divisor: 1 };

    /// Largest supported divisor.
    pub const MAX_DIVISOR: u32 = 32;

    /// Eco mode with `divisor` rounded down to a power of two in `1..=32`.
    pub fn from_divisor(divisor: u32) -> Self {
        let d = divisor.clamp(1, Self::MAX_DIVISOR);
        Self {
            divisor: 1 << (31 - d.leading_zeros()),
        }
    }

    /// Samples per control tick.
    #[inline]
    pub fn divisor(self) -> u32 {
        self.divisor
    }

    /// Whether sample number `counter` is a control tick.
    #[inline]
    pub fn is_tick(self, counter: u32) -> bool {
        counter & (self.divisor - 1) == 0
    }
}

impl Default for EcoMode {
    fn default() -> Self {
        Self { divisor: 4 }
    }
}

/// Where the chain input joins the master bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChainMode {
    /// Chained mix goes through the master fader, dim and mono
    PreMaster,
    /// Chained mix is added after the master gain, before clipping
    #[default]
    PostMaster,
}

/// Map a group selector value to a group index. 0 and anything outside
/// `1..=groups` mean "no group".
#[inline]
pub fn resolve_group(value: f32, groups: usize) -> Option<usize> {
    if value.is_nan() || value < 0.5 {
        return None;
    }
    let g = libm::roundf(value) as usize;
    (g <= groups).then_some(g - 1)
}

/// Shared control plane of one mixer.
#[derive(Debug, Clone)]
pub struct GlobalInfo {
    layout: MixerLayout,
    /// Pan law for mono sources
    pub pan_law_mono: MonoPanLaw,
    /// Pan law for stereo sources and buses without a local override
    pub pan_law_stereo: StereoPanLaw,
    /// Mirror fade position on reversal instead of restarting
    pub symmetrical_fade: bool,
    /// Control-rate divisor
    pub eco_mode: EcoMode,
    /// Chain input position on the master bus
    pub chain_mode: ChainMode,
    /// Aux returns that are not soloed go quiet while any track or group is soloed
    pub aux_returns_muted_when_main_solo: bool,
    /// Soloing an aux return silences the dry track and group signal
    pub aux_solos_mute_dry: bool,
    link_bit_mask: u32,
    solo_bit_mask: u32,
    aux_solo_bit_mask: u32,
    /// One entry per group plus an aggregate of all grouped tracks at the end
    group_usage: Vec<u32>,
    track_groups: Vec<Option<usize>>,
    old_faders: Vec<f32>,
    strips: Vec<StripParams>,
    group_selectors: Vec<ParamHandle>,
    aux_solos: Vec<ParamHandle>,
    sample_time: f32,
}

impl GlobalInfo {
    /// Build the control plane for `map`, with every setting at its default.
    pub fn new(layout: MixerLayout, map: &ParamMap, sample_rate: f32) -> Self {
        let strips = map
            .tracks
            .iter()
            .map(|t| t.strip)
            .chain(map.groups.iter().copied())
            .collect();
        Self {
            layout,
            pan_law_mono: MonoPanLaw::default(),
            pan_law_stereo: StereoPanLaw::default(),
            symmetrical_fade: false,
            eco_mode: EcoMode::default(),
            chain_mode: ChainMode::default(),
            aux_returns_muted_when_main_solo: false,
            aux_solos_mute_dry: false,
            link_bit_mask: 0,
            solo_bit_mask: 0,
            aux_solo_bit_mask: 0,
            group_usage: vec![0; layout.groups + 1],
            track_groups: vec![None; layout.tracks],
            old_faders: vec![1.0; layout.mask_channels()],
            strips,
            group_selectors: map.tracks.iter().map(|t| t.group).collect(),
            aux_solos: map.auxes.iter().map(|a| a.solo).collect(),
            sample_time: 1.0 / sample_rate,
        }
    }

    /// Mixer dimensions.
    pub fn layout(&self) -> &MixerLayout {
        &self.layout
    }

    /// Restore default settings and recompute every derived table from the
    /// current parameter values.
    pub fn on_reset(&mut self, params: &ParamBank) {
        self.pan_law_mono = MonoPanLaw::default();
        self.pan_law_stereo = StereoPanLaw::default();
        self.symmetrical_fade = false;
        self.eco_mode = EcoMode::default();
        self.chain_mode = ChainMode::default();
        self.aux_returns_muted_when_main_solo = false;
        self.aux_solos_mute_dry = false;
        self.link_bit_mask = 0;
        self.refresh(params);
        #[cfg(feature = "tracing")]
        tracing::debug!("global info reset");
    }

    /// Recompute group usage, solo masks and linked-fader history from the
    /// parameter values, leaving settings alone. Called after a session load.
    pub fn refresh(&mut self, params: &ParamBank) {
        self.update_group_usage(params);
        self.update_solo_bit_mask(params);
        self.update_aux_solo_bit_mask(params);
        self.reset_linked_faders(params);
    }

    // --- Timing ---

    /// Seconds per sample.
    #[inline]
    pub fn sample_time(&self) -> f32 {
        self.sample_time
    }

    /// Time covered by one control tick.
    #[inline]
    pub fn eco_step_time(&self) -> f32 {
        self.sample_time * self.eco_mode.divisor() as f32
    }

    /// Update the sample time for a new rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_time = 1.0 / sample_rate;
    }

    // --- Group usage ---

    /// Rebuild the group-usage table from every track's group selector.
    pub fn update_group_usage(&mut self, params: &ParamBank) {
        for (slot, &handle) in self.track_groups.iter_mut().zip(&self.group_selectors) {
            *slot = resolve_group(params.get(handle), self.layout.groups);
        }
        self.group_usage.fill(0);
        let aggregate = self.layout.groups;
        for (t, group) in self.track_groups.iter().enumerate() {
            if let Some(g) = *group {
                self.group_usage[g] |= 1 << t;
                self.group_usage[aggregate] |= 1 << t;
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(usage = ?self.group_usage, "group usage rebuilt");
    }

    /// Rebuild group usage only if some track's assignment changed.
    /// Returns whether a rebuild happened.
    pub fn refresh_group_usage(&mut self, params: &ParamBank) -> bool {
        let changed = self
            .track_groups
            .iter()
            .zip(&self.group_selectors)
            .any(|(&cached, &handle)| {
                resolve_group(params.get(handle), self.layout.groups) != cached
            });
        if changed {
            self.update_group_usage(params);
        }
        changed
    }

    /// Group of a track as of the last usage rebuild.
    #[inline]
    pub fn track_group(&self, track: usize) -> Option<usize> {
        self.track_groups.get(track).copied().flatten()
    }

    /// Tracks routed to `group`, one bit per track.
    #[inline]
    pub fn group_usage(&self, group: usize) -> u32 {
        self.group_usage.get(group).copied().unwrap_or(0)
    }

    /// Tracks routed to any group.
    pub fn grouped_tracks(&self) -> u32 {
        self.group_usage[self.layout.groups]
    }

    /// The whole usage table, aggregate last.
    pub fn group_usage_table(&self) -> &[u32] {
        &self.group_usage
    }

    // --- Solo ---

    /// Rescan every track and group solo button. Returns whether the mask changed.
    pub fn update_solo_bit_mask(&mut self, params: &ParamBank) -> bool {
        let mask = self
            .strips
            .iter()
            .enumerate()
            .filter(|(_, strip)| params.get_bool(strip.solo))
            .fold(0u32, |m, (i, _)| m | (1 << i));
        let changed = mask != self.solo_bit_mask;
        if changed {
            #[cfg(feature = "tracing")]
            tracing::debug!(mask, "solo mask changed");
            self.solo_bit_mask = mask;
        }
        changed
    }

    /// Rescan every aux return solo button. Returns whether the mask changed.
    pub fn update_aux_solo_bit_mask(&mut self, params: &ParamBank) -> bool {
        let mask = self
            .aux_solos
            .iter()
            .enumerate()
            .filter(|(_, h)| params.get_bool(**h))
            .fold(0u32, |m, (i, _)| m | (1 << i));
        let changed = mask != self.aux_solo_bit_mask;
        self.aux_solo_bit_mask = mask;
        changed
    }

    /// Soloed tracks and groups.
    #[inline]
    pub fn solo_bit_mask(&self) -> u32 {
        self.solo_bit_mask
    }

    /// Soloed aux returns.
    #[inline]
    pub fn aux_solo_bit_mask(&self) -> u32 {
        self.aux_solo_bit_mask
    }

    /// Mask bits belonging to groups.
    #[inline]
    pub fn group_bits(&self) -> u32 {
        let groups = ((1u64 << self.layout.groups) - 1) as u32;
        groups.checked_shl(self.layout.tracks as u32).unwrap_or(0)
    }

    /// Gain applied to tracks and groups on top of their own solo state:
    /// 0 while an aux solo silences the dry signal.
    #[inline]
    pub fn dry_gain(&self) -> f32 {
        if self.aux_solos_mute_dry && self.aux_solo_bit_mask != 0 {
            0.0
        } else {
            1.0
        }
    }

    // --- Linked faders ---

    /// Channels whose faders move together.
    #[inline]
    pub fn link_bit_mask(&self) -> u32 {
        self.link_bit_mask
    }

    /// Replace the link mask. Bits past the last group are dropped.
    pub fn set_link_bit_mask(&mut self, mask: u32) {
        let width = self.layout.mask_channels();
        let valid = if width >= 32 { u32::MAX } else { (1u32 << width) - 1 };
        self.link_bit_mask = mask & valid;
    }

    /// Whether mask channel `channel` is linked.
    #[inline]
    pub fn is_linked(&self, channel: usize) -> bool {
        channel < 32 && self.link_bit_mask & (1 << channel) != 0
    }

    /// Add or remove one channel from the link set.
    pub fn set_linked(&mut self, channel: usize, linked: bool) {
        if channel >= self.layout.mask_channels() {
            return;
        }
        if linked {
            self.link_bit_mask |= 1 << channel;
        } else {
            self.link_bit_mask &= !(1 << channel);
        }
    }

    /// Record the current fader of every channel as its previous value, so
    /// the next [`process_linked`](Self::process_linked) sees no movement.
    pub fn reset_linked_faders(&mut self, params: &ParamBank) {
        for (old, strip) in self.old_faders.iter_mut().zip(&self.strips) {
            *old = params.get(strip.fader);
        }
    }

    /// Handle a fader move on mask channel `channel`.
    ///
    /// If the channel is linked, the difference from its previous value is
    /// added to every other linked fader, clamped to `[0, MAX_FADER]`. The
    /// clamped value written becomes that channel's previous value, so when
    /// its own turn comes in the same pass it sees no movement and nothing
    /// propagates back.
    pub fn process_linked(&mut self, params: &ParamBank, channel: usize, new_fader: f32) {
        let Some(&old) = self.old_faders.get(channel) else {
            return;
        };
        let delta = new_fader - old;
        if delta != 0.0 && self.is_linked(channel) {
            #[cfg(feature = "tracing")]
            tracing::trace!(channel, delta, "linked fader moved");
            for (other, strip) in self.strips.iter().enumerate() {
                if other == channel || !self.is_linked(other) {
                    continue;
                }
                let moved = (params.get(strip.fader) + delta).clamp(0.0, MAX_FADER);
                params.set(strip.fader, moved);
                self.old_faders[other] = moved;
            }
        }
        self.old_faders[channel] = new_fader;
    }

    /// Run [`process_linked`](Self::process_linked) for every track and group.
    pub fn process_linked_faders(&mut self, params: &ParamBank) {
        for channel in 0..self.strips.len() {
            let fader = params.get(self.strips[channel].fader);
            self.process_linked(params, channel, fader);
        }
    }

    /// Propagate a mute change on linked channel `channel` to the other
    /// linked channels so their timed fades run together.
    ///
    /// Only applies when `channel` itself has a timed fade rate, and only
    /// reaches channels whose fade rate is timed too.
    pub fn fade_other_linked_tracks(
        &self,
        params: &ParamBank,
        channel: usize,
        new_mute_target: f32,
    ) {
        let Some(strip) = self.strips.get(channel) else {
            return;
        };
        if !self.is_linked(channel) || !is_fade_rate(params.get(strip.fade_rate)) {
            return;
        }
        let mute = new_mute_target < 0.5;
        for (other, other_strip) in self.strips.iter().enumerate() {
            if other != channel
                && self.is_linked(other)
                && is_fade_rate(params.get(other_strip.fade_rate))
            {
                params.set_bool(other_strip.mute, mute);
            }
        }
    }
}
