//! Parameter table of the mixer: one flat [`ParamBank`], many typed views.
//!
//! [`ParamMap::build`] lays out every slot for a [`MixerLayout`] in a fixed
//! order (tracks, groups, aux returns, master) and resolves each slot into a
//! [`ParamHandle`] exactly once. Stages then hold small `Copy` structs of
//! handles ([`TrackParams`], [`StripParams`], [`MasterParams`]) instead of
//! indices or references into the bank.

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, vec::Vec};

use rackmix_core::{ParamBank, ParamDescriptor, ParamHandle, ParamUnit};

use crate::error::MixerError;
use crate::layout::{ChannelId, MixerLayout};

/// Fader position is mapped to linear gain as `fader^3`.
pub const FADER_SCALING_EXPONENT: f32 = 3.0;

/// Top of the fader travel: `2^(1/3)`, i.e. +6 dB of linear gain.
pub const MAX_FADER: f32 = 1.259_921;

/// Fade rates below this (seconds) mean instant mute.
pub const MIN_FADE_RATE: f32 = 0.1;

/// Longest configurable fade, in seconds.
pub const MAX_FADE_RATE: f32 = 30.0;

const FADER: ParamDescriptor =
    ParamDescriptor::continuous("Fader", 0.0, MAX_FADER, 1.0, ParamUnit::None);
const PAN: ParamDescriptor = ParamDescriptor::continuous("Pan", 0.0, 1.0, 0.5, ParamUnit::None);
const MUTE: ParamDescriptor = ParamDescriptor::toggle("Mute");
const SOLO: ParamDescriptor = ParamDescriptor::toggle("Solo");
const FADE_RATE: ParamDescriptor =
    ParamDescriptor::continuous("Fade rate", 0.0, MAX_FADE_RATE, 0.0, ParamUnit::Seconds);
const DIM: ParamDescriptor = ParamDescriptor::toggle("Dim");
const MONO: ParamDescriptor = ParamDescriptor::toggle("Mono");

/// Handles shared by every fader strip (tracks, groups, aux returns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripParams {
    /// Fader, `0..=MAX_FADER`
    pub fader: ParamHandle,
    /// Pan, `0..=1`, 0.5 = centre
    pub pan: ParamHandle,
    /// Mute button
    pub mute: ParamHandle,
    /// Solo button
    pub solo: ParamHandle,
    /// Mute fade time in seconds
    pub fade_rate: ParamHandle,
}

/// Track handles: a strip plus the group selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackParams {
    /// Shared strip controls
    pub strip: StripParams,
    /// Group assignment, 0 = none, `1..=groups`
    pub group: ParamHandle,
}

/// Master bus handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterParams {
    /// Master fader
    pub fader: ParamHandle,
    /// Master mute
    pub mute: ParamHandle,
    /// Dim switch
    pub dim: ParamHandle,
    /// Mono switch
    pub mono: ParamHandle,
    /// Master mute fade time
    pub fade_rate: ParamHandle,
}

/// Typed view over the mixer's [`ParamBank`].
#[derive(Debug, Clone)]
pub struct ParamMap {
    /// One entry per track
    pub tracks: Vec<TrackParams>,
    /// One entry per group
    pub groups: Vec<StripParams>,
    /// One entry per aux return
    pub auxes: Vec<StripParams>,
    /// Master bus
    pub master: MasterParams,
    labels: Vec<String>,
}

struct TableBuilder {
    descriptors: Vec<ParamDescriptor>,
    labels: Vec<String>,
}

impl TableBuilder {
    fn push(&mut self, channel: ChannelId, descriptor: ParamDescriptor) -> usize {
        self.labels.push(format!("{channel} {}", descriptor.name));
        self.descriptors.push(descriptor);
        self.descriptors.len() - 1
    }

    fn strip(&mut self, channel: ChannelId) -> [usize; 5] {
        [
            self.push(channel, FADER),
            self.push(channel, PAN),
            self.push(channel, MUTE),
            self.push(channel, SOLO),
            self.push(channel, FADE_RATE),
        ]
    }
}

fn resolve(bank: &ParamBank, index: usize) -> Result<ParamHandle, MixerError> {
    bank.handle(index).ok_or(MixerError::ParamOutOfRange(index))
}

fn resolve_strip(bank: &ParamBank, slots: [usize; 5]) -> Result<StripParams, MixerError> {
    Ok(StripParams {
        fader: resolve(bank, slots[0])?,
        pan: resolve(bank, slots[1])?,
        mute: resolve(bank, slots[2])?,
        solo: resolve(bank, slots[3])?,
        fade_rate: resolve(bank, slots[4])?,
    })
}

impl ParamMap {
    /// Lay out the parameter table for `layout` and return the bank with
    /// every slot at its default, plus the typed map into it.
    pub fn build(layout: &MixerLayout) -> Result<(ParamBank, Self), MixerError> {
        layout.validate()?;
        let mut table = TableBuilder {
            descriptors: Vec::new(),
            labels: Vec::new(),
        };

        let group_selector = ParamDescriptor::selector("Group", layout.groups as f32);
        let track_slots: Vec<([usize; 5], usize)> = (0..layout.tracks)
            .map(|t| {
                let strip = table.strip(ChannelId::Track(t));
                let group = table.push(ChannelId::Track(t), group_selector);
                (strip, group)
            })
            .collect();
        let group_slots: Vec<[usize; 5]> = (0..layout.groups)
            .map(|g| table.strip(ChannelId::Group(g)))
            .collect();
        let aux_slots: Vec<[usize; 5]> = (0..layout.auxes)
            .map(|a| table.strip(ChannelId::Aux(a)))
            .collect();
        let master_slots = [
            table.push(ChannelId::Master, FADER),
            table.push(ChannelId::Master, MUTE),
            table.push(ChannelId::Master, DIM),
            table.push(ChannelId::Master, MONO),
            table.push(ChannelId::Master, FADE_RATE),
        ];

        let TableBuilder {
            descriptors,
            labels,
        } = table;
        let bank = ParamBank::new(descriptors);

        let tracks = track_slots
            .into_iter()
            .map(|(strip, group)| {
                Ok(TrackParams {
                    strip: resolve_strip(&bank, strip)?,
                    group: resolve(&bank, group)?,
                })
            })
            .collect::<Result<Vec<_>, MixerError>>()?;
        let groups = group_slots
            .into_iter()
            .map(|slots| resolve_strip(&bank, slots))
            .collect::<Result<Vec<_>, MixerError>>()?;
        let auxes = aux_slots
            .into_iter()
            .map(|slots| resolve_strip(&bank, slots))
            .collect::<Result<Vec<_>, MixerError>>()?;
        let master = MasterParams {
            fader: resolve(&bank, master_slots[0])?,
            mute: resolve(&bank, master_slots[1])?,
            dim: resolve(&bank, master_slots[2])?,
            mono: resolve(&bank, master_slots[3])?,
            fade_rate: resolve(&bank, master_slots[4])?,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            tracks = layout.tracks,
            groups = layout.groups,
            auxes = layout.auxes,
            slots = bank.len(),
            "parameter table built"
        );

        Ok((
            bank,
            Self {
                tracks,
                groups,
                auxes,
                master,
                labels,
            },
        ))
    }

    /// Full display label of a slot, e.g. `"Track 3 Fader"`.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Fader/mute/solo/fade handles of a track or group by solo/link mask
    /// index (tracks first, then groups).
    pub fn mask_strip(&self, mask_index: usize) -> Option<&StripParams> {
        if mask_index < self.tracks.len() {
            Some(&self.tracks[mask_index].strip)
        } else {
            self.groups.get(mask_index - self.tracks.len())
        }
    }

    /// Strip handles of any channel except master.
    pub fn strip(&self, channel: ChannelId) -> Option<&StripParams> {
        match channel {
            ChannelId::Track(t) => self.tracks.get(t).map(|p| &p.strip),
            ChannelId::Group(g) => self.groups.get(g),
            ChannelId::Aux(a) => self.auxes.get(a),
            ChannelId::Master => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_count_and_order() {
        let (bank, map) = ParamMap::build(&MixerLayout::JUNIOR).unwrap();
        // 8 tracks x 6 + 2 groups x 5 + 4 auxes x 5 + master 5
        assert_eq!(bank.len(), 48 + 10 + 20 + 5);
        assert_eq!(map.tracks[0].strip.fader.index(), 0);
        assert_eq!(map.tracks[1].strip.fader.index(), 6);
        assert_eq!(map.groups[0].fader.index(), 48);
        assert_eq!(map.master.fade_rate.index(), bank.len() - 1);
    }

    #[test]
    fn labels_are_one_based() {
        let (_, map) = ParamMap::build(&MixerLayout::JUNIOR).unwrap();
        assert_eq!(map.label(0), Some("Track 1 Fader"));
        assert_eq!(map.label(5), Some("Track 1 Group"));
        assert_eq!(map.label(48), Some("Group 1 Fader"));
        assert_eq!(map.label(1000), None);
    }

    #[test]
    fn group_selector_spans_layout() {
        let (bank, map) = ParamMap::build(&MixerLayout::FULL).unwrap();
        let sel = map.tracks[0].group;
        bank.set(sel, 9.0);
        assert_eq!(bank.get(sel), 4.0);
    }

    #[test]
    fn defaults_are_unity_centre_unmuted() {
        let (bank, map) = ParamMap::build(&MixerLayout::JUNIOR).unwrap();
        let strip = map.tracks[3].strip;
        assert_eq!(bank.get(strip.fader), 1.0);
        assert_eq!(bank.get(strip.pan), 0.5);
        assert!(!bank.get_bool(strip.mute));
        assert_eq!(bank.get(strip.fade_rate), 0.0);
    }

    #[test]
    fn mask_strip_spans_tracks_then_groups() {
        let (_, map) = ParamMap::build(&MixerLayout::JUNIOR).unwrap();
        assert_eq!(map.mask_strip(8), Some(&map.groups[0]));
        assert_eq!(map.mask_strip(10), None);
    }

    #[test]
    fn max_fader_is_plus_six_db() {
        let gain = rackmix_core::fader_to_gain(MAX_FADER, FADER_SCALING_EXPONENT);
        assert!((gain - 2.0).abs() < 1e-5);
    }
}
