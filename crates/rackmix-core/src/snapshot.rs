//! Non-blocking multi-value exchange between the audio thread and the GUI.
//!
//! A single atomic parameter is enough for one knob, but some data only makes
//! sense as a consistent group (all meter levels of one frame, a curve's
//! points). [`SnapshotCell`] guards a fixed block of `f32` slots with a
//! compare-and-swap busy flag and a version counter:
//!
//! - [`try_publish`](SnapshotCell::try_publish) takes the flag, writes every
//!   slot, bumps the version and releases. If the flag is already taken it
//!   returns `false` immediately and the frame's update is simply skipped.
//! - [`try_read`](SnapshotCell::try_read) takes the flag, copies the slots
//!   into the caller's [`Snapshot`] and releases. If the flag is taken the
//!   caller keeps the last good copy it already holds.
//!
//! Neither side ever spins or sleeps, so the audio thread cannot be held up
//! by a slow reader.

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec, vec::Vec};
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Lock-free, try-only exchange cell over a fixed number of `f32` slots.
#[derive(Debug)]
pub struct SnapshotCell {
    busy: AtomicBool,
    version: AtomicU32,
    slots: Box<[AtomicU32]>,
}

/// Reader-side copy of a [`SnapshotCell`].
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Values as of `version`.
    pub values: Vec<f32>,
    /// Publish count at the time of the copy (0 = never published).
    pub version: u32,
}

impl Snapshot {
    /// An empty snapshot sized for `cell`.
    pub fn for_cell(cell: &SnapshotCell) -> Self {
        Self {
            values: vec![0.0; cell.len()],
            version: 0,
        }
    }
}

impl SnapshotCell {
    /// Create a cell with `len` zeroed slots.
    pub fn new(len: usize) -> Self {
        Self {
            busy: AtomicBool::new(false),
            version: AtomicU32::new(0),
            slots: (0..len).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True for a zero-slot cell.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Publish count so far.
    pub fn version(&self) -> u32 {
        self.version.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    /// Write `values` into the leading slots. Returns `false` without
    /// touching anything when a reader holds the cell.
    pub fn try_publish(&self, values: &[f32]) -> bool {
        if !self.try_acquire() {
            return false;
        }
        for (slot, v) in self.slots.iter().zip(values) {
            slot.store(v.to_bits(), Ordering::Relaxed);
        }
        self.version.fetch_add(1, Ordering::Release);
        self.release();
        true
    }

    /// Refresh `last` from the cell. Returns `false` and leaves `last`
    /// untouched when a writer holds the cell.
    pub fn try_read(&self, last: &mut Snapshot) -> bool {
        if !self.try_acquire() {
            return false;
        }
        last.values.resize(self.slots.len(), 0.0);
        for (dst, slot) in last.values.iter_mut().zip(self.slots.iter()) {
            *dst = f32::from_bits(slot.load(Ordering::Relaxed));
        }
        last.version = self.version.load(Ordering::Relaxed);
        self.release();
        true
    }

    /// Hold the cell busy for the lifetime of the returned guard.
    ///
    /// Used by tests to simulate a contending thread.
    pub fn hold(&self) -> Option<HoldGuard<'_>> {
        if self.try_acquire() {
            Some(HoldGuard { cell: self })
        } else {
            None
        }
    }
}

/// Keeps a [`SnapshotCell`] busy until dropped.
#[derive(Debug)]
pub struct HoldGuard<'a> {
    cell: &'a SnapshotCell,
}

impl Drop for HoldGuard<'_> {
    fn drop(&mut self) {
        self.cell.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_then_read() {
        let cell = SnapshotCell::new(3);
        let mut snap = Snapshot::for_cell(&cell);
        assert!(cell.try_publish(&[1.0, 2.0, 3.0]));
        assert!(cell.try_read(&mut snap));
        assert_eq!(snap.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(snap.version, 1);
    }

    #[test]
    fn contended_reader_keeps_stale_value() {
        let cell = SnapshotCell::new(2);
        let mut snap = Snapshot::for_cell(&cell);
        cell.try_publish(&[0.5, 0.25]);
        cell.try_read(&mut snap);

        let guard = cell.hold().unwrap();
        assert!(!cell.try_publish(&[9.0, 9.0]), "writer must skip, not block");
        assert!(!cell.try_read(&mut snap));
        assert_eq!(snap.values, vec![0.5, 0.25]);
        drop(guard);

        assert!(cell.try_publish(&[7.0, 8.0]));
        assert!(cell.try_read(&mut snap));
        assert_eq!(snap.values, vec![7.0, 8.0]);
        assert_eq!(snap.version, 2);
    }

    #[test]
    fn short_publish_only_touches_leading_slots() {
        let cell = SnapshotCell::new(3);
        cell.try_publish(&[1.0, 1.0, 1.0]);
        cell.try_publish(&[2.0]);
        let mut snap = Snapshot::for_cell(&cell);
        cell.try_read(&mut snap);
        assert_eq!(snap.values, vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn cross_thread_exchange() {
        use std::sync::Arc;
        let cell = Arc::new(SnapshotCell::new(4));
        let writer = {
            let cell = Arc::clone(&cell);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    let v = i as f32;
                    cell.try_publish(&[v, v, v, v]);
                }
            })
        };
        let mut snap = Snapshot::for_cell(&cell);
        for _ in 0..1000 {
            if cell.try_read(&mut snap) {
                // All four slots always come from the same publish
                assert!(snap.values.iter().all(|&x| x == snap.values[0]));
            }
        }
        writer.join().unwrap();
    }
}
