//! Soundboard - a minimal desktop soundboard.
//!
//! Lists the `.wav` files in `~/soundboard`, keeps the list in sync with the
//! folder while running, and plays a clicked sound on a user-selected output
//! device. The chosen device and the always-on-top flag survive restarts.

pub mod audio;
pub mod config;
pub mod error;
pub mod library;
pub mod state;
#[cfg(feature = "gui")]
pub mod ui;

// Re-export key types for convenience
pub use {
    audio::{CpalBackend, DeviceRegistry, DeviceState},
    config::{Settings, SettingsStore},
    error::{Disposition, ErrorPolicy, SoundboardError},
    library::{FolderWatcher, SoundEntry, SoundLibrary},
    state::{AppState, LibrarySnapshot, SnapshotSlot},
};

#[cfg(feature = "gui")]
pub use ui::SoundboardApplication;
