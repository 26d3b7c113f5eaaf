//! The mixer: all stages plus their shared control plane.
//!
//! One call to [`Mixer::process`] runs one audio frame in a fixed order:
//!
//! 1. On an eco tick, the control plane: group usage, solo masks, linked
//!    faders (see [`GlobalInfo`]).
//! 2. Tracks, each depositing into its group's input or the main mix.
//! 3. Groups, each depositing into the main mix.
//! 4. Aux returns, depositing into the main mix.
//! 5. Master.
//!
//! Nothing on this path allocates. Meter levels are published to a
//! [`SnapshotCell`] every [`METER_PUBLISH_INTERVAL`] samples for a GUI
//! thread to pick up.

#[cfg(not(feature = "std"))]
use alloc::{sync::Arc, vec, vec::Vec};
#[cfg(feature = "std")]
use std::sync::Arc;

use rackmix_core::{AudioPort, Jack, ParamBank, SnapshotCell};

use crate::aux_return::{AuxPorts, MixerAux};
use crate::error::MixerError;
use crate::global::GlobalInfo;
use crate::group::{GroupPorts, MixerGroup};
use crate::layout::{ChannelId, MixerLayout};
use crate::master::{MasterPorts, MixerMaster};
use crate::params::ParamMap;
use crate::track::{MixerTrack, TrackPorts};

/// Samples between meter snapshots.
pub const METER_PUBLISH_INTERVAL: u32 = 256;

/// Floats per channel in the meter snapshot: peak L, peak R, RMS L, RMS R.
pub const METER_STRIDE: usize = 4;

/// Every input jack of a mixer, one entry per channel.
#[derive(Debug, Clone)]
pub struct MixerInputs<P = Jack> {
    /// Track jacks
    pub tracks: Vec<TrackPorts<P>>,
    /// Group CV jacks
    pub groups: Vec<GroupPorts<P>>,
    /// Aux return jacks
    pub auxes: Vec<AuxPorts<P>>,
    /// Master jacks
    pub master: MasterPorts<P>,
}

impl<P: Default> MixerInputs<P> {
    /// All jacks unplugged.
    pub fn new(layout: &MixerLayout) -> Self {
        Self {
            tracks: (0..layout.tracks).map(|_| TrackPorts::default()).collect(),
            groups: (0..layout.groups).map(|_| GroupPorts::default()).collect(),
            auxes: (0..layout.auxes).map(|_| AuxPorts::default()).collect(),
            master: MasterPorts::default(),
        }
    }
}

/// Every output of a mixer for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MixerOutputs {
    /// Main stereo output
    pub main: (f32, f32),
    /// Per-track direct outs at each track's selected tap
    pub track_direct: Vec<(f32, f32)>,
    /// Per-track insert sends
    pub insert_sends: Vec<(f32, f32)>,
    /// Per-group direct outs
    pub group_direct: Vec<(f32, f32)>,
}

impl MixerOutputs {
    /// Silent outputs sized for `layout`.
    pub fn new(layout: &MixerLayout) -> Self {
        Self {
            main: (0.0, 0.0),
            track_direct: vec![(0.0, 0.0); layout.tracks],
            insert_sends: vec![(0.0, 0.0); layout.tracks],
            group_direct: vec![(0.0, 0.0); layout.groups],
        }
    }
}

#[inline]
fn accumulate(acc: &mut (f32, f32), add: (f32, f32)) {
    acc.0 += add.0;
    acc.1 += add.1;
}

fn check_sample_rate(sample_rate: f32) -> Result<f32, MixerError> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(sample_rate)
    } else {
        Err(MixerError::InvalidSampleRate(sample_rate))
    }
}

/// A complete mixer instance.
#[derive(Debug)]
pub struct Mixer {
    layout: MixerLayout,
    params: Arc<ParamBank>,
    map: ParamMap,
    global: GlobalInfo,
    tracks: Vec<MixerTrack>,
    groups: Vec<MixerGroup>,
    auxes: Vec<MixerAux>,
    master: MixerMaster,
    group_inputs: Vec<(f32, f32)>,
    eco_counter: u32,
    sample_rate: f32,
    meters: Arc<SnapshotCell>,
    meter_scratch: Vec<f32>,
    meter_countdown: u32,
}

impl Mixer {
    /// Build a mixer for `layout` with every parameter and setting at its default.
    ///
    /// ```rust
    /// use rackmix_mixer::{Mixer, MixerInputs, MixerLayout, MixerOutputs};
    /// use rackmix_core::Jack;
    ///
    /// let layout = MixerLayout::JUNIOR;
    /// let mut mixer = Mixer::new(layout, 48000.0).unwrap();
    /// let mut inputs: MixerInputs = MixerInputs::new(&layout);
    /// let mut outputs = MixerOutputs::new(&layout);
    /// inputs.tracks[0].left = Jack::mono(1.0);
    /// for _ in 0..4800 {
    ///     mixer.process(&inputs, &mut outputs);
    /// }
    /// assert!((outputs.main.0 - 1.0).abs() < 1e-4);
    /// ```
    pub fn new(layout: MixerLayout, sample_rate: f32) -> Result<Self, MixerError> {
        let sample_rate = check_sample_rate(sample_rate)?;
        let (bank, map) = ParamMap::build(&layout)?;
        let params = Arc::new(bank);
        let global = GlobalInfo::new(layout, &map, sample_rate);

        let tracks = map
            .tracks
            .iter()
            .enumerate()
            .map(|(i, p)| MixerTrack::new(i, *p, sample_rate))
            .collect();
        let groups = map
            .groups
            .iter()
            .enumerate()
            .map(|(i, p)| MixerGroup::new(i, layout.tracks, *p, sample_rate))
            .collect();
        let auxes = map
            .auxes
            .iter()
            .enumerate()
            .map(|(i, p)| MixerAux::new(i, *p, sample_rate))
            .collect();
        let master = MixerMaster::new(map.master, sample_rate);

        let meter_len = (layout.tracks + layout.groups + layout.auxes + 1) * METER_STRIDE;
        let mut mixer = Self {
            layout,
            params,
            map,
            global,
            tracks,
            groups,
            auxes,
            master,
            group_inputs: vec![(0.0, 0.0); layout.groups],
            eco_counter: 0,
            sample_rate,
            meters: Arc::new(SnapshotCell::new(meter_len)),
            meter_scratch: vec![0.0; meter_len],
            meter_countdown: METER_PUBLISH_INTERVAL,
        };
        mixer.on_reset();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            tracks = layout.tracks,
            groups = layout.groups,
            auxes = layout.auxes,
            sample_rate,
            "mixer created"
        );
        Ok(mixer)
    }

    // --- Accessors ---

    /// Mixer dimensions.
    pub fn layout(&self) -> &MixerLayout {
        &self.layout
    }

    /// Shared parameter bank. Clone the `Arc` to hand it to a UI thread.
    pub fn params(&self) -> &Arc<ParamBank> {
        &self.params
    }

    /// Typed handles into [`params`](Self::params).
    pub fn param_map(&self) -> &ParamMap {
        &self.map
    }

    /// Shared control state.
    pub fn global(&self) -> &GlobalInfo {
        &self.global
    }

    /// Shared control state, for settings changes between frames.
    pub fn global_mut(&mut self) -> &mut GlobalInfo {
        &mut self.global
    }

    /// All tracks.
    pub fn tracks(&self) -> &[MixerTrack] {
        &self.tracks
    }

    /// One track.
    pub fn track(&self, index: usize) -> Option<&MixerTrack> {
        self.tracks.get(index)
    }

    /// One track, for settings changes.
    pub fn track_mut(&mut self, index: usize) -> Option<&mut MixerTrack> {
        self.tracks.get_mut(index)
    }

    /// All groups.
    pub fn groups(&self) -> &[MixerGroup] {
        &self.groups
    }

    /// One group, for settings changes.
    pub fn group_mut(&mut self, index: usize) -> Option<&mut MixerGroup> {
        self.groups.get_mut(index)
    }

    /// All aux returns.
    pub fn auxes(&self) -> &[MixerAux] {
        &self.auxes
    }

    /// One aux return, for settings changes.
    pub fn aux_mut(&mut self, index: usize) -> Option<&mut MixerAux> {
        self.auxes.get_mut(index)
    }

    /// Master bus.
    pub fn master(&self) -> &MixerMaster {
        &self.master
    }

    /// Master bus, for settings changes.
    pub fn master_mut(&mut self) -> &mut MixerMaster {
        &mut self.master
    }

    /// Current sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Meter snapshot cell. Readers use [`SnapshotCell::try_read`].
    pub fn meters(&self) -> Arc<SnapshotCell> {
        Arc::clone(&self.meters)
    }

    /// Offset of a channel's four meter values in the snapshot.
    pub fn meter_offset(&self, channel: ChannelId) -> Option<usize> {
        let l = &self.layout;
        let slot = match channel {
            ChannelId::Track(t) if t < l.tracks => t,
            ChannelId::Group(g) if g < l.groups => l.tracks + g,
            ChannelId::Aux(a) if a < l.auxes => l.tracks + l.groups + a,
            ChannelId::Master => l.tracks + l.groups + l.auxes,
            _ => return None,
        };
        Some(slot * METER_STRIDE)
    }

    // --- Lifecycle ---

    /// Restore every parameter and setting to its default and clear all
    /// transient state.
    pub fn on_reset(&mut self) {
        let params = &*self.params;
        params.reset();
        self.global.on_reset(params);
        for track in &mut self.tracks {
            track.on_reset(params);
        }
        for group in &mut self.groups {
            group.on_reset(params);
        }
        for aux in &mut self.auxes {
            aux.on_reset(params);
        }
        self.master.on_reset(params);
        self.eco_counter = 0;
        #[cfg(feature = "tracing")]
        tracing::debug!("mixer reset");
    }

    /// Clear filters, slewers, meters and fades without touching persisted
    /// state, and resync the control plane with the current parameters.
    /// Call after loading a session.
    pub fn reset_non_json(&mut self) {
        let params = &*self.params;
        self.global.refresh(params);
        for track in &mut self.tracks {
            track.reset_non_json(params);
        }
        for group in &mut self.groups {
            group.reset_non_json(params);
        }
        for aux in &mut self.auxes {
            aux.reset_non_json(params);
        }
        self.master.reset_non_json(params);
        self.eco_counter = 0;
    }

    /// Change the sample rate. All time constants are rescaled and
    /// transient state is cleared.
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<(), MixerError> {
        let sample_rate = check_sample_rate(sample_rate)?;
        self.sample_rate = sample_rate;
        self.global.set_sample_rate(sample_rate);
        for track in &mut self.tracks {
            track.set_sample_rate(sample_rate);
        }
        for group in &mut self.groups {
            group.set_sample_rate(sample_rate);
        }
        for aux in &mut self.auxes {
            aux.set_sample_rate(sample_rate);
        }
        self.master.set_sample_rate(sample_rate);
        self.reset_non_json();
        #[cfg(feature = "tracing")]
        tracing::debug!(sample_rate, "sample rate changed");
        Ok(())
    }

    // --- Processing ---

    /// Process one frame, ticking the control plane per the eco mode.
    #[inline]
    pub fn process<P: AudioPort>(&mut self, inputs: &MixerInputs<P>, outputs: &mut MixerOutputs) {
        let eco = self.global.eco_mode.is_tick(self.eco_counter);
        self.eco_counter = self.eco_counter.wrapping_add(1);
        self.process_frame(inputs, outputs, eco);
    }

    /// Process one frame with a caller-supplied eco tick.
    ///
    /// Hosts that schedule control work themselves call this instead of
    /// [`process`](Self::process). Fade timing still assumes one tick every
    /// `eco_mode.divisor()` samples.
    pub fn process_frame<P: AudioPort>(
        &mut self,
        inputs: &MixerInputs<P>,
        outputs: &mut MixerOutputs,
        eco: bool,
    ) {
        let params = &*self.params;
        if eco {
            self.global.refresh_group_usage(params);
            self.global.update_solo_bit_mask(params);
            self.global.update_aux_solo_bit_mask(params);
            self.global.process_linked_faders(params);
        }
        let global = &self.global;

        self.group_inputs.fill((0.0, 0.0));
        let mut mix = (0.0, 0.0);

        for (i, (track, ports)) in self.tracks.iter_mut().zip(&inputs.tracks).enumerate() {
            let out = track.process(ports, global, params, eco);
            match track.group().and_then(|g| self.group_inputs.get_mut(g)) {
                Some(acc) => accumulate(acc, out),
                None => accumulate(&mut mix, out),
            }
            if let Some(slot) = outputs.track_direct.get_mut(i) {
                *slot = track.direct_out();
            }
            if let Some(slot) = outputs.insert_sends.get_mut(i) {
                *slot = track.insert_send();
            }
        }

        for (i, (group, ports)) in self.groups.iter_mut().zip(&inputs.groups).enumerate() {
            let out = group.process(self.group_inputs[i], ports, global, params, eco);
            accumulate(&mut mix, out);
            if let Some(slot) = outputs.group_direct.get_mut(i) {
                *slot = group.direct_out();
            }
        }

        for (aux, ports) in self.auxes.iter_mut().zip(&inputs.auxes) {
            accumulate(&mut mix, aux.process(ports, global, params, eco));
        }

        outputs.main = self.master.process(mix, &inputs.master, global, params, eco);

        self.meter_countdown = self.meter_countdown.saturating_sub(1);
        if self.meter_countdown == 0 {
            self.meter_countdown = METER_PUBLISH_INTERVAL;
            self.publish_meters();
        }
    }

    /// Copy every meter into the snapshot cell. Skipped silently if a
    /// reader holds the cell.
    pub fn publish_meters(&mut self) -> bool {
        let levels = self
            .tracks
            .iter()
            .map(|t| t.core().vu_levels())
            .chain(self.groups.iter().map(|g| g.core().vu_levels()))
            .chain(self.auxes.iter().map(|a| a.core().vu_levels()))
            .chain(core::iter::once(self.master.vu_levels()));
        for (chunk, level) in self.meter_scratch.chunks_exact_mut(METER_STRIDE).zip(levels) {
            chunk.copy_from_slice(&level.to_array());
        }
        self.meters.try_publish(&self.meter_scratch)
    }
}
