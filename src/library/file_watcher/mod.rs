//! Folder change detection using the `notify` crate.
//!
//! The watcher registers a non-recursive watch on the sound directory and
//! hands out coalesced batches of create/delete events. Pulling the next
//! batch blocks until the OS reports at least one change.

use std::path::{Path, PathBuf};

use {
    async_channel::{Receiver, Sender, TryRecvError, unbounded},
    notify::{
        Config, Error, Event, RecommendedWatcher,
        RecursiveMode::NonRecursive,
        Watcher,
        event::{EventKind, ModifyKind, RenameMode},
    },
    tracing::{debug, error},
};

use crate::{error::domain::SoundboardError, library::sound_library::has_sound_suffix};

mod config;
mod events;
#[cfg(test)]
mod tests;

pub(crate) use events::RawEvent;
pub use {
    config::FolderWatcherConfig,
    events::{WatchBatch, WatchEvent},
};

/// Blocking source of coalesced folder change batches.
///
/// Iterating yields `Ok(batch)` for every group of changes and
/// `Err(WatchRegistrationFailure)` once if the watch breaks, after which the
/// sequence ends. The sequence cannot be restarted.
pub struct FolderWatcher {
    /// Internal notify watcher. Dropping it ends the watch.
    _watcher: RecommendedWatcher,
    /// Watched directory.
    directory: PathBuf,
    /// Coalesces raw events into batches.
    batcher: WatchBatcher,
}

impl FolderWatcher {
    /// Starts watching a directory.
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory to watch. Subdirectories are not watched.
    /// * `config` - Optional configuration (uses defaults if None).
    ///
    /// # Returns
    ///
    /// A `Result` containing the `FolderWatcher` or a `SoundboardError`.
    ///
    /// # Errors
    ///
    /// Returns `SoundboardError::WatchRegistrationFailure` if the watch
    /// cannot be registered.
    pub fn watch(
        directory: &Path,
        config: Option<FolderWatcherConfig>,
    ) -> Result<Self, SoundboardError> {
        let config = config.unwrap_or_default();
        let (sender, receiver) = unbounded();

        let handler_directory = directory.to_path_buf();
        let sounds_only = config.sounds_only;
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, Error>| {
                Self::handle_raw_event(res, &handler_directory, sounds_only, &sender);
            },
            Config::default(),
        )
        .map_err(|e| {
            SoundboardError::watch_failure(format!("Failed to create folder watcher: {e}"))
        })?;

        watcher.watch(directory, NonRecursive).map_err(|e| {
            SoundboardError::watch_failure(format!(
                "Failed to watch directory {directory:?}: {e}"
            ))
        })?;

        debug!("Started watching directory: {:?}", directory);
        Ok(Self {
            _watcher: watcher,
            directory: directory.to_path_buf(),
            batcher: WatchBatcher::new(receiver),
        })
    }

    /// Gets the watched directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Handles raw events from the notify crate.
    fn handle_raw_event(
        res: Result<Event, Error>,
        directory: &Path,
        sounds_only: bool,
        sender: &Sender<RawEvent>,
    ) {
        let raw_events = match res {
            Ok(event) => {
                debug!("Raw file system event: {:?}", event);
                classify_event(&event, directory, sounds_only)
            }
            Err(e) => {
                error!("File system watcher error: {}", e);
                vec![RawEvent::Failed(e.to_string())]
            }
        };

        for raw_event in raw_events {
            // Unbounded, so this only fails once the watcher is gone
            let _ = sender.try_send(raw_event);
        }
    }
}

impl Iterator for FolderWatcher {
    type Item = Result<WatchBatch, SoundboardError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.batcher.next_batch()
    }
}

/// Turns the raw event stream into batches.
pub(crate) struct WatchBatcher {
    receiver: Receiver<RawEvent>,
    failed: bool,
}

impl WatchBatcher {
    pub(crate) fn new(receiver: Receiver<RawEvent>) -> Self {
        Self {
            receiver,
            failed: false,
        }
    }

    /// Blocks for the next change, then drains everything already queued.
    ///
    /// Returns `None` when the sender side is gone or after a failure has
    /// been reported.
    pub(crate) fn next_batch(&mut self) -> Option<Result<WatchBatch, SoundboardError>> {
        if self.failed {
            return None;
        }

        let first = self.receiver.recv_blocking().ok()?;
        let mut raw_events = vec![first];
        loop {
            match self.receiver.try_recv() {
                Ok(raw_event) => raw_events.push(raw_event),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        let mut events = Vec::with_capacity(raw_events.len());
        for raw_event in raw_events {
            match raw_event {
                RawEvent::Change(event) => events.push(event),
                RawEvent::Failed(reason) => {
                    self.failed = true;
                    return Some(Err(SoundboardError::watch_failure(reason)));
                }
            }
        }

        let batch = WatchBatch::from_events(events)?;
        debug!("Folder change batch with {} events", batch.len());
        Some(Ok(batch))
    }
}

/// Maps a notify event to the changes the soundboard cares about.
///
/// Creations, deletions and renames count. Content writes, metadata and
/// access events do not. With `sounds_only`, paths that could never be
/// listed as a sound are dropped using the same suffix rule as the library.
/// Losing the watched directory itself is a failure.
pub(crate) fn classify_event(
    event: &Event,
    directory: &Path,
    sounds_only: bool,
) -> Vec<RawEvent> {
    let removes_directory = matches!(
        event.kind,
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From))
    ) && event.paths.iter().any(|path| path == directory);
    if removes_directory {
        return vec![RawEvent::Failed(format!(
            "Watched directory {directory:?} was removed"
        ))];
    }

    let relevant = |path: &&PathBuf| !sounds_only || has_sound_suffix(path);
    let created = |path: &PathBuf| RawEvent::Change(WatchEvent::Created(path.clone()));
    let removed = |path: &PathBuf| RawEvent::Change(WatchEvent::Removed(path.clone()));

    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.iter().filter(relevant).map(created).collect()
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.iter().filter(relevant).map(removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // notify reports [from, to]
            let mut changes = Vec::new();
            if let Some(from) = event.paths.first().filter(|path| relevant(path)) {
                changes.push(removed(from));
            }
            changes.extend(event.paths.iter().skip(1).filter(relevant).map(created));
            changes
        }
        EventKind::Modify(ModifyKind::Name(_)) => {
            event.paths.iter().filter(relevant).map(created).collect()
        }
        _ => {
            debug!("Ignoring event kind {:?}", event.kind);
            Vec::new()
        }
    }
}
