//! The sound directory: listing, change detection, and the watch loop.

pub mod file_watcher;
pub mod scanner;
pub mod sound_library;

pub use {
    file_watcher::{FolderWatcher, FolderWatcherConfig, WatchBatch, WatchEvent},
    scanner::LibraryScanner,
    sound_library::{SoundEntry, SoundLibrary},
};
