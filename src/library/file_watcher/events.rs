//! Folder change events and their coalesced batches.

use std::path::PathBuf;

/// A single entry appearing in or disappearing from the watched folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file was created or moved into the folder.
    Created(PathBuf),
    /// A file was deleted or moved out of the folder.
    Removed(PathBuf),
}

impl WatchEvent {
    /// Gets the path the event refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            WatchEvent::Created(path) | WatchEvent::Removed(path) => path,
        }
    }
}

/// Every event observed since the previous batch, in arrival order.
///
/// A batch is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBatch {
    events: Vec<WatchEvent>,
}

impl WatchBatch {
    /// Wraps a list of events, or returns `None` if there are none.
    pub fn from_events(events: Vec<WatchEvent>) -> Option<Self> {
        (!events.is_empty()).then_some(Self { events })
    }

    /// Gets the events in this batch.
    pub fn events(&self) -> &[WatchEvent] {
        &self.events
    }

    /// Gets the number of events in this batch.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always `false`; batches are never empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Message passed from the notify callback to the batching side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawEvent {
    /// A relevant folder change.
    Change(WatchEvent),
    /// The watch can no longer deliver events.
    Failed(String),
}
