//! Persisted soundboard settings.
//!
//! Settings live in a hidden two-line file inside the sound directory: the
//! selected output device name, then `true` or `false` for the always-on-top
//! flag. Lines are CRLF-terminated.

use std::{
    env::var,
    fs::{create_dir_all, read_to_string, rename, write},
    io::{Error as StdError, ErrorKind::NotFound},
    path::{Path, PathBuf},
};

use {
    thiserror::Error,
    tracing::{debug, warn},
};

use crate::error::domain::SoundboardError;

/// Name of the sound directory inside the user's home directory.
pub const SOUND_DIR_NAME: &str = "soundboard";

/// Name of the hidden settings file inside the sound directory.
pub const SETTINGS_FILE_NAME: &str = ".settings";

/// Line terminator used in the settings file.
const LINE_ENDING: &str = "\r\n";

/// Error type for settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read or write settings file.
    #[error("IO error: {0}")]
    IoError(#[from] StdError),
    /// The settings file exists but does not hold a valid record.
    #[error("Corrupt settings file: {reason}")]
    Corrupt { reason: String },
    /// Invalid settings value.
    #[error("Invalid settings value: {reason}")]
    InvalidValue { reason: String },
}

/// Settings restored at start-up and saved whenever they change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Output device name exactly as returned by enumeration.
    pub device_name: Option<String>,
    /// Whether the window should stay above other windows.
    pub always_on_top: bool,
}

impl Settings {
    /// Parses the two-line settings record.
    ///
    /// An empty first line means no device. The second line must be `true`
    /// or `false` (ASCII case-insensitive). Lines after the second are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Corrupt` if either line is missing or the
    /// flag is not a boolean literal.
    pub fn parse(contents: &str) -> Result<Self, SettingsError> {
        let mut lines = contents.lines();

        let device_line = lines.next().ok_or_else(|| SettingsError::Corrupt {
            reason: "file is empty".to_string(),
        })?;
        let flag_line = lines.next().ok_or_else(|| SettingsError::Corrupt {
            reason: "missing always-on-top line".to_string(),
        })?;

        let device_name = device_line.trim_end_matches('\r');
        let flag = flag_line.trim();
        let always_on_top = if flag.eq_ignore_ascii_case("true") {
            true
        } else if flag.eq_ignore_ascii_case("false") {
            false
        } else {
            return Err(SettingsError::Corrupt {
                reason: format!("expected true or false, found {flag:?}"),
            });
        };

        Ok(Self {
            device_name: (!device_name.is_empty()).then(|| device_name.to_string()),
            always_on_top,
        })
    }

    /// Renders the settings record.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` if the device name contains a
    /// line break, which the format cannot represent.
    pub fn render(&self) -> Result<String, SettingsError> {
        let device_name = self.device_name.as_deref().unwrap_or_default();
        if device_name.contains(['\r', '\n']) {
            return Err(SettingsError::InvalidValue {
                reason: format!("device name {device_name:?} contains a line break"),
            });
        }

        Ok(format!(
            "{device_name}{LINE_ENDING}{}{LINE_ENDING}",
            self.always_on_top
        ))
    }
}

/// Reads and writes the hidden settings file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    /// Path to the settings file on disk.
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store for the settings file inside `sound_dir`.
    #[must_use]
    pub fn new(sound_dir: &Path) -> Self {
        Self::with_path(sound_dir.join(SETTINGS_FILE_NAME))
    }

    /// Creates a store for an explicit settings file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Gets the settings file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings file strictly.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the file does not exist, `Ok(Some(settings))` when it
    /// parses.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the file cannot be read or is malformed.
    pub fn read(&self) -> Result<Option<Settings>, SettingsError> {
        let contents = match read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Settings::parse(&contents).map(Some)
    }

    /// Loads the settings, falling back to defaults.
    ///
    /// A missing file yields defaults silently. A file that exists but cannot
    /// be read or parsed is logged and also yields defaults.
    #[must_use]
    pub fn load(&self) -> Settings {
        match self.read() {
            Ok(Some(settings)) => {
                debug!("Loaded settings from {:?}: {:?}", self.path, settings);
                settings
            }
            Ok(None) => {
                debug!("No settings file at {:?}, using defaults", self.path);
                Settings::default()
            }
            Err(e) => {
                let error = SoundboardError::from(e);
                warn!("Ignoring settings file {:?}: {}", self.path, error);
                Settings::default()
            }
        }
    }

    /// Overwrites the settings file.
    ///
    /// The record is written to a temporary sibling file which then replaces
    /// the settings file, so readers never observe a half-written record.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the record cannot be rendered or written.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let contents = settings.render()?;
        let temp_path = self.temp_path();

        debug!("Saving settings to file: {:?}", self.path);
        write(&temp_path, contents)?;
        rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| SETTINGS_FILE_NAME.into());
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }
}

/// Gets the sound directory path (`<home>/soundboard`).
#[must_use]
pub fn get_sound_dir() -> PathBuf {
    let mut sound_dir = get_home_dir();
    sound_dir.push(SOUND_DIR_NAME);
    sound_dir
}

/// Creates the sound directory if it does not exist yet.
///
/// # Errors
///
/// Returns `SoundboardError::DirectoryUnavailable` if the directory cannot
/// be created.
pub fn ensure_sound_dir(path: &Path) -> Result<(), SoundboardError> {
    create_dir_all(path).map_err(|source| SoundboardError::DirectoryUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Gets the user's home directory.
///
/// Uses `HOME`, then `USERPROFILE`, then the current directory.
fn get_home_dir() -> PathBuf {
    for key in ["HOME", "USERPROFILE"] {
        if let Ok(home) = var(key)
            && !home.is_empty()
        {
            return PathBuf::from(home);
        }
    }

    PathBuf::from(".")
}
