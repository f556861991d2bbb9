//! Application state owned by the UI thread.
//!
//! `AppState` ties the persisted settings, the device registry, and the
//! visible sound list together. Every user action goes through it, and
//! every mutation of a persisted value is written back immediately.

use std::{
    io::{Error, ErrorKind::NotFound},
    path::Path,
};

use tracing::{debug, info, warn};

use crate::{
    audio::registry::{AudioBackend, DeviceRegistry, DeviceState},
    config::settings::{Settings, SettingsStore},
    error::{
        domain::SoundboardError,
        operational::{Disposition, ErrorPolicy, ErrorReporter},
    },
    library::sound_library::{SoundEntry, SoundLibrary},
    state::snapshot::LibrarySnapshot,
};

/// Central state container for the soundboard window.
pub struct AppState<B: AudioBackend> {
    /// Where settings are persisted.
    store: SettingsStore,
    /// Settings as last loaded or changed. The stored device name can differ
    /// from the active device; it only changes on a successful selection.
    settings: Settings,
    /// Active output device and playing sound.
    registry: DeviceRegistry<B>,
    /// Sounds currently shown, in listing order.
    sounds: Vec<SoundEntry>,
    /// Generation of the snapshot `sounds` came from (0 for the initial list).
    generation: u64,
    /// Decides which errors end the application.
    policy: ErrorPolicy,
}

impl<B: AudioBackend> AppState<B> {
    /// Creates a new application state with default settings and no device.
    ///
    /// # Arguments
    ///
    /// * `store` - Settings file to restore from and persist to.
    /// * `backend` - Audio backend used for device access.
    /// * `policy` - Error policy for reported failures.
    ///
    /// # Returns
    ///
    /// A new `AppState` instance. Call `restore` to apply persisted settings.
    pub fn new(store: SettingsStore, backend: B, policy: ErrorPolicy) -> Self {
        Self {
            store,
            settings: Settings::default(),
            registry: DeviceRegistry::new(backend),
            sounds: Vec::new(),
            generation: 0,
            policy,
        }
    }

    /// Loads persisted settings and reopens the stored device.
    ///
    /// A stored device that can no longer be opened is logged and left
    /// closed. It stays in the settings, so later saves keep it and
    /// replugging it restores it on the next start.
    ///
    /// # Returns
    ///
    /// The effective settings.
    pub fn restore(&mut self) -> &Settings {
        self.settings = self.store.load();

        if let Some(name) = self.settings.device_name.clone() {
            match self.registry.select_device(&name) {
                Ok(()) => info!("Restored output device: {}", name),
                Err(e) => ErrorReporter::warn(&e, "Failed to restore output device"),
            }
        }

        &self.settings
    }

    /// Selects an output device and persists the choice.
    ///
    /// Only a successful selection is stored. If the old device was closed
    /// but the new one failed to open, the registry has no device and the
    /// previously stored name is kept.
    ///
    /// # Errors
    ///
    /// Returns `SoundboardError::DeviceUnavailable` if the device cannot be
    /// selected.
    pub fn select_device(&mut self, name: &str) -> Result<(), SoundboardError> {
        self.registry.select_device(name)?;

        if self.settings.device_name.as_deref() != Some(name) {
            self.settings.device_name = Some(name.to_string());
            self.persist();
        }
        Ok(())
    }

    /// Changes the always-on-top flag and persists it.
    pub fn set_always_on_top(&mut self, always_on_top: bool) {
        if self.settings.always_on_top == always_on_top {
            return;
        }
        debug!("Always on top: {}", always_on_top);
        self.settings.always_on_top = always_on_top;
        self.persist();
    }

    /// Plays the sound at a position in the current list.
    ///
    /// # Errors
    ///
    /// Returns `SoundboardError::IoFailure` if the index is past the end of
    /// the list, otherwise whatever `play_path` returns.
    pub fn play(&mut self, index: usize) -> Result<(), SoundboardError> {
        let path = self
            .sounds
            .get(index)
            .map(|entry| entry.path.clone())
            .ok_or_else(|| {
                SoundboardError::IoFailure(Error::new(
                    NotFound,
                    format!("no sound at position {index}"),
                ))
            })?;
        self.play_path(&path)
    }

    /// Plays a file on the active device.
    ///
    /// # Errors
    ///
    /// Returns `SoundboardError` if no device is selected or the file cannot
    /// be played.
    pub fn play_path(&mut self, path: &Path) -> Result<(), SoundboardError> {
        self.registry.play(path)
    }

    /// Stops the playing sound, if any.
    pub fn stop(&mut self) {
        self.registry.stop();
    }

    /// Populates the sound list from the directory.
    ///
    /// # Errors
    ///
    /// Returns `SoundboardError::DirectoryUnavailable` if the directory
    /// cannot be listed.
    pub fn load_sounds(&mut self, library: &SoundLibrary) -> Result<&[SoundEntry], SoundboardError> {
        self.sounds = library.refresh()?;
        debug!("Loaded {} sounds", self.sounds.len());
        Ok(&self.sounds)
    }

    /// Replaces the sound list with a newer snapshot.
    ///
    /// # Returns
    ///
    /// `true` if the snapshot was applied, `false` if it was not newer than
    /// the list already shown.
    pub fn apply_snapshot(&mut self, snapshot: LibrarySnapshot) -> bool {
        if snapshot.generation <= self.generation {
            debug!(
                "Ignoring stale snapshot {} (showing {})",
                snapshot.generation, self.generation
            );
            return false;
        }
        self.generation = snapshot.generation;
        self.sounds = snapshot.entries;
        true
    }

    /// Logs an error and decides whether the application can continue.
    pub fn report(&self, error: &SoundboardError, context: &str) -> Disposition {
        self.policy.report(error, context)
    }

    /// Lists every output device by name.
    ///
    /// # Errors
    ///
    /// Returns `SoundboardError::DeviceUnavailable` if enumeration fails.
    pub fn list_outputs(&self) -> Result<Vec<String>, SoundboardError> {
        self.registry.list_outputs()
    }

    pub fn sounds(&self) -> &[SoundEntry] {
        &self.sounds
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn device_state(&self) -> DeviceState {
        self.registry.state()
    }

    pub fn active_device(&self) -> Option<&str> {
        self.registry.active_device()
    }

    pub fn always_on_top(&self) -> bool {
        self.settings.always_on_top
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &DeviceRegistry<B> {
        &self.registry
    }

    fn persist(&self) {
        match self.store.save(&self.settings) {
            Ok(()) => debug!("Persisted settings: {:?}", self.settings),
            Err(e) => warn!("Failed to save settings to {:?}: {}", self.store.path(), e),
        }
    }
}
