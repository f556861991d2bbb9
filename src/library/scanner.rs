//! The watch loop that keeps the sound list in sync with the directory.
//!
//! The scanner first re-lists the directory once to catch changes made
//! before the watch was registered. After that, for every change batch it
//! re-lists the directory once, publishes the result into the snapshot slot,
//! and wakes the UI. It then pauses for the throttle interval so a burst of
//! file operations lands in one batch.

use std::{thread::sleep, time::Duration};

use {
    async_channel::{Sender, TrySendError},
    tracing::{debug, info},
};

use crate::{
    error::domain::SoundboardError,
    library::{
        file_watcher::{FolderWatcherConfig, WatchBatch},
        sound_library::SoundLibrary,
    },
    state::snapshot::SnapshotSlot,
};

/// Runs the watch loop over a source of change batches.
pub struct LibraryScanner<W> {
    /// Library re-listed on every batch.
    library: SoundLibrary,
    /// Blocking source of change batches, usually a `FolderWatcher`.
    batches: W,
    /// Pause after each publish.
    throttle: Duration,
}

impl<W> LibraryScanner<W>
where
    W: Iterator<Item = Result<WatchBatch, SoundboardError>>,
{
    /// Creates a new scanner.
    ///
    /// # Arguments
    ///
    /// * `library` - Library to refresh.
    /// * `batches` - Source of change batches.
    /// * `config` - Watcher configuration; supplies the throttle interval.
    pub fn new(library: SoundLibrary, batches: W, config: &FolderWatcherConfig) -> Self {
        Self {
            library,
            batches,
            throttle: Duration::from_millis(config.throttle_ms),
        }
    }

    /// Runs until the batch source ends or the UI stops listening.
    ///
    /// Blocks the calling thread for the whole time; run it on a dedicated
    /// worker.
    ///
    /// # Arguments
    ///
    /// * `slot` - Where new sound lists are published.
    /// * `wake` - Signals the UI that the slot holds something. A full
    ///   channel means a wake-up is already pending.
    ///
    /// # Returns
    ///
    /// The number of refreshes performed, including the initial one.
    ///
    /// # Errors
    ///
    /// Returns `SoundboardError` if the watch breaks or the directory can no
    /// longer be listed.
    pub fn run(self, slot: &SnapshotSlot, wake: &Sender<()>) -> Result<u64, SoundboardError> {
        let Self {
            library,
            batches,
            throttle,
        } = self;

        let mut refreshes = 1;
        if !publish(&library, slot, wake, throttle)? {
            return Ok(refreshes);
        }

        for batch in batches {
            let batch = batch?;
            debug!("Processing {} folder changes", batch.len());

            refreshes += 1;
            if !publish(&library, slot, wake, throttle)? {
                return Ok(refreshes);
            }
        }

        debug!("Folder watcher ended after {} refreshes", refreshes);
        Ok(refreshes)
    }
}

/// Re-lists the directory, publishes the result, wakes the UI and waits out
/// the throttle.
///
/// Returns `false` once the UI has stopped listening.
fn publish(
    library: &SoundLibrary,
    slot: &SnapshotSlot,
    wake: &Sender<()>,
    throttle: Duration,
) -> Result<bool, SoundboardError> {
    let entries = library.refresh()?;
    let generation = slot.publish(entries);
    info!("Updating sound list (generation {})", generation);

    match wake.try_send(()) {
        Ok(()) | Err(TrySendError::Full(())) => {}
        Err(TrySendError::Closed(())) => {
            debug!("UI stopped listening, ending watch loop");
            return Ok(false);
        }
    }

    sleep(throttle);
    Ok(true)
}
