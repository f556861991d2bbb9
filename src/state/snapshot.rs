//! Single-slot handoff of sound list snapshots from the watcher thread to
//! the UI thread.
//!
//! The producer publishes whole lists; an unconsumed snapshot is replaced by
//! the next one. Each snapshot carries a generation number that grows with
//! every publish, so the consumer can refuse anything older than what it
//! already shows.

use parking_lot::Mutex;

use crate::library::SoundEntry;

/// A complete sound list as of one directory scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySnapshot {
    /// Publish order, starting at 1.
    pub generation: u64,
    /// The sounds found by the scan.
    pub entries: Vec<SoundEntry>,
}

#[derive(Debug, Default)]
struct SlotInner {
    last_generation: u64,
    pending: Option<LibrarySnapshot>,
}

/// Holds at most one unconsumed snapshot.
#[derive(Debug, Default)]
pub struct SnapshotSlot {
    inner: Mutex<SlotInner>,
}

impl SnapshotSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new snapshot, replacing any unconsumed one.
    ///
    /// # Returns
    ///
    /// The generation assigned to the snapshot.
    pub fn publish(&self, entries: Vec<SoundEntry>) -> u64 {
        let mut inner = self.inner.lock();
        inner.last_generation += 1;
        let generation = inner.last_generation;
        inner.pending = Some(LibrarySnapshot {
            generation,
            entries,
        });
        generation
    }

    /// Takes the pending snapshot, leaving the slot empty.
    pub fn take(&self) -> Option<LibrarySnapshot> {
        self.inner.lock().pending.take()
    }

    /// Gets the generation of the most recent publish (0 if none).
    #[must_use]
    pub fn last_generation(&self) -> u64 {
        self.inner.lock().last_generation
    }
}
