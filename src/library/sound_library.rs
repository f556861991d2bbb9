//! The list of playable sounds in the sound directory.

use std::{
    borrow::Cow,
    fs::read_dir,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::domain::SoundboardError;

/// File name suffix of playable sounds. Matched case-sensitively.
pub const SOUND_SUFFIX: &str = ".wav";

/// A playable sound file.
///
/// Two entries are the same sound if and only if their paths are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SoundEntry {
    /// Path to the `.wav` file.
    pub path: PathBuf,
}

impl SoundEntry {
    /// Creates an entry for a path.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Gets the name shown in the list, which is the file's base name.
    #[must_use]
    pub fn display_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map_or_else(|| self.path.to_string_lossy(), |name| name.to_string_lossy())
    }
}

/// Lists the `.wav` files of one directory.
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    /// Directory holding the sounds.
    directory: PathBuf,
}

impl SoundLibrary {
    /// Creates a library over `directory`. The directory must already exist.
    #[must_use]
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    /// Gets the directory this library lists.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Re-scans the directory.
    ///
    /// Only the directory itself is listed, not subdirectories. Entries come
    /// back in the order the OS yields them.
    ///
    /// # Returns
    ///
    /// Every regular file whose name ends in `.wav`.
    ///
    /// # Errors
    ///
    /// Returns `SoundboardError::DirectoryUnavailable` if the directory
    /// cannot be listed.
    pub fn refresh(&self) -> Result<Vec<SoundEntry>, SoundboardError> {
        let unavailable = |source| SoundboardError::DirectoryUnavailable {
            path: self.directory.clone(),
            source,
        };

        let mut sounds = Vec::new();
        for entry in read_dir(&self.directory).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;
            let path = entry.path();
            if is_sound_file(&path) {
                sounds.push(SoundEntry::new(path));
            }
        }

        debug!(
            "Listed {} sounds in {:?}",
            sounds.len(),
            self.directory
        );
        Ok(sounds)
    }
}

/// Checks if a path names a playable sound.
///
/// The file must exist as a regular file and its name must end in `.wav`.
/// `.WAV` and other spellings do not count.
pub fn is_sound_file(path: &Path) -> bool {
    has_sound_suffix(path) && path.is_file()
}

/// Checks the file name suffix only, without touching the filesystem.
pub fn has_sound_suffix(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.as_encoded_bytes().ends_with(SOUND_SUFFIX.as_bytes()))
}
