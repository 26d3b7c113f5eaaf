//! Host parameter storage: one flat array, many typed views.
//!
//! A rack module exposes its knobs and buttons as a flat, index-addressed
//! array of `f32` values. The GUI thread writes them while the audio thread
//! reads them once per control tick. [`ParamBank`] stores each value as the
//! bit pattern of an `f32` in an [`AtomicU32`], so a read or write of a single
//! parameter is always whole and never blocks.
//!
//! Consumers never index the array directly. They hold [`ParamHandle`]s,
//! which only the bank can mint and which are bounds-checked once, when the
//! handle is created.
//!
//! # Example
//!
//! ```rust
//! use rackmix_core::{ParamBank, ParamDescriptor, ParamUnit};
//!
//! let bank = ParamBank::new(vec![
//!     ParamDescriptor::continuous("Fader", 0.0, 1.26, 1.0, ParamUnit::None),
//!     ParamDescriptor::toggle("Mute"),
//! ]);
//! let fader = bank.handle(0).unwrap();
//! bank.set(fader, 3.0); // clamped to the descriptor range
//! assert_eq!(bank.get(fader), 1.26);
//! assert!(bank.handle(2).is_none());
//! ```

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

/// Unit of a parameter value, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels
    Decibels,
    /// Hertz
    Hertz,
    /// Seconds
    Seconds,
    /// Percent
    Percent,
    /// No unit (faders, pan, toggles)
    None,
}

impl ParamUnit {
    /// Display suffix, including the leading space where one belongs.
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Seconds => " s",
            ParamUnit::Percent => "%",
            ParamUnit::None => "",
        }
    }
}

/// Static metadata for one parameter slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Display name, without the channel prefix.
    pub name: &'static str,
    /// Minimum value.
    pub min: f32,
    /// Maximum value.
    pub max: f32,
    /// Value restored by reset.
    pub default: f32,
    /// Display unit.
    pub unit: ParamUnit,
    /// Integer-valued (buttons, selectors).
    pub stepped: bool,
}

impl ParamDescriptor {
    /// A continuous knob or fader.
    pub const fn continuous(
        name: &'static str,
        min: f32,
        max: f32,
        default: f32,
        unit: ParamUnit,
    ) -> Self {
        Self {
            name,
            min,
            max,
            default,
            unit,
            stepped: false,
        }
    }

    /// An on/off button, default off.
    pub const fn toggle(name: &'static str) -> Self {
        Self {
            name,
            min: 0.0,
            max: 1.0,
            default: 0.0,
            unit: ParamUnit::None,
            stepped: true,
        }
    }

    /// An integer selector in `0..=max`, default 0.
    pub const fn selector(name: &'static str, max: f32) -> Self {
        Self {
            name,
            min: 0.0,
            max,
            default: 0.0,
            unit: ParamUnit::None,
            stepped: true,
        }
    }

    /// Clamp to `[min, max]`, rounding stepped parameters. NaN reads as default.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        let v = value.clamp(self.min, self.max);
        if self.stepped { libm::roundf(v) } else { v }
    }
}

/// Validated index into a [`ParamBank`].
///
/// Only [`ParamBank::handle`] creates these, so a handle is always in range
/// for the bank that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamHandle(u32);

impl ParamHandle {
    /// Position in the flat parameter array.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Flat array of atomically readable and writable parameters.
#[derive(Debug)]
pub struct ParamBank {
    descriptors: Vec<ParamDescriptor>,
    values: Vec<AtomicU32>,
}

impl ParamBank {
    /// Create a bank with every slot at its default.
    pub fn new(descriptors: Vec<ParamDescriptor>) -> Self {
        let values = descriptors
            .iter()
            .map(|d| AtomicU32::new(d.default.to_bits()))
            .collect();
        Self {
            descriptors,
            values,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a bank with no slots.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mint a handle for `index`, or `None` if it is out of range.
    pub fn handle(&self, index: usize) -> Option<ParamHandle> {
        if index < self.values.len() {
            u32::try_from(index).ok().map(ParamHandle)
        } else {
            None
        }
    }

    /// Read a value.
    #[inline]
    pub fn get(&self, handle: ParamHandle) -> f32 {
        self.values
            .get(handle.index())
            .map_or(0.0, |v| f32::from_bits(v.load(Ordering::Relaxed)))
    }

    /// Read a toggle as a bool (`>= 0.5`).
    #[inline]
    pub fn get_bool(&self, handle: ParamHandle) -> bool {
        self.get(handle) >= 0.5
    }

    /// Write a value, clamped to the slot's descriptor.
    #[inline]
    pub fn set(&self, handle: ParamHandle, value: f32) {
        if let (Some(slot), Some(desc)) = (
            self.values.get(handle.index()),
            self.descriptors.get(handle.index()),
        ) {
            slot.store(desc.clamp(value).to_bits(), Ordering::Relaxed);
        }
    }

    /// Write a toggle.
    #[inline]
    pub fn set_bool(&self, handle: ParamHandle, on: bool) {
        self.set(handle, if on { 1.0 } else { 0.0 });
    }

    /// Descriptor for a slot.
    pub fn descriptor(&self, handle: ParamHandle) -> Option<&ParamDescriptor> {
        self.descriptors.get(handle.index())
    }

    /// All descriptors in index order.
    pub fn descriptors(&self) -> &[ParamDescriptor] {
        &self.descriptors
    }

    /// Restore every slot to its default.
    pub fn reset(&self) {
        for (slot, desc) in self.values.iter().zip(&self.descriptors) {
            slot.store(desc.default.to_bits(), Ordering::Relaxed);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(slots = self.values.len(), "parameter bank reset");
    }
}
