//! Sound directory location and persisted settings.

pub mod settings;

pub use settings::{
    Settings, SettingsError, SettingsStore, ensure_sound_dir, get_sound_dir,
};
