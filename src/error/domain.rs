//! Domain-specific error types using `thiserror`.
//!
//! `SoundboardError` is the taxonomy every component operation reports
//! through. Module-level errors from the decoder, the audio output and the
//! settings store convert into it so the shell only ever matches on one enum.

use std::{
    io::{Error as StdError, ErrorKind::UnexpectedEof},
    path::PathBuf,
    result::Result as StdResult,
};

use thiserror::Error;

use crate::{
    audio::{decoder::DecoderError, output::OutputError},
    config::settings::SettingsError,
};

/// Errors produced by soundboard operations.
#[derive(Error, Debug)]
pub enum SoundboardError {
    /// The sound directory could not be created or listed.
    #[error("Sound directory unavailable: {path:?}: {source}")]
    DirectoryUnavailable {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: StdError,
    },
    /// The directory watch could not be registered or stopped working.
    #[error("Directory watch failed: {reason}")]
    WatchRegistrationFailure { reason: String },
    /// No output endpoint with the requested name could be opened.
    #[error("Output device unavailable: {name} ({reason})")]
    DeviceUnavailable { name: String, reason: String },
    /// Playback was requested before any device was selected.
    #[error("Select a device first!")]
    NoDeviceSelected,
    /// The file is not a playable WAV file.
    #[error("Unsupported audio format: {path:?} ({reason})")]
    UnsupportedFormat { path: PathBuf, reason: String },
    /// Reading or writing a file failed.
    #[error("IO error: {0}")]
    IoFailure(#[from] StdError),
    /// The settings file exists but cannot be parsed.
    #[error("Settings file is corrupt: {reason}")]
    SettingsCorrupt { reason: String },
}

impl SoundboardError {
    /// Creates a new `DeviceUnavailable` error.
    pub fn device_unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `WatchRegistrationFailure` error.
    pub fn watch_failure(reason: impl Into<String>) -> Self {
        Self::WatchRegistrationFailure {
            reason: reason.into(),
        }
    }
}

impl From<DecoderError> for SoundboardError {
    fn from(error: DecoderError) -> Self {
        match error {
            // A truncated header reads as EOF; that is a bad file, not a bad disk
            DecoderError::IoError { path, source } if source.kind() == UnexpectedEof => {
                Self::UnsupportedFormat {
                    path,
                    reason: source.to_string(),
                }
            }
            DecoderError::IoError { source, .. } => Self::IoFailure(source),
            DecoderError::UnsupportedFormat { path, reason } => {
                Self::UnsupportedFormat { path, reason }
            }
            DecoderError::NoAudioTrack { path } => Self::UnsupportedFormat {
                path,
                reason: "no audio track found".to_string(),
            },
        }
    }
}

impl From<SettingsError> for SoundboardError {
    fn from(error: SettingsError) -> Self {
        match error {
            SettingsError::IoError(source) => Self::IoFailure(source),
            SettingsError::Corrupt { reason } | SettingsError::InvalidValue { reason } => {
                Self::SettingsCorrupt { reason }
            }
        }
    }
}

impl OutputError {
    /// Converts an output error into the domain taxonomy for a named device.
    ///
    /// Stream configuration failures caused by the file (no matching sample
    /// rate) become `UnsupportedFormat`; everything else means the device
    /// could not be used.
    pub fn into_domain(self, device: &str, path: Option<PathBuf>) -> SoundboardError {
        match (self, path) {
            (OutputError::UnsupportedStreamConfig { reason }, Some(path)) => {
                SoundboardError::UnsupportedFormat { path, reason }
            }
            (error, _) => SoundboardError::device_unavailable(device, error.to_string()),
        }
    }
}

/// Result alias for soundboard operations.
pub type Result<T> = StdResult<T, SoundboardError>;
