//! Configuration for folder watcher behavior.

/// Configuration for folder watcher behavior.
#[derive(Debug, Clone)]
pub struct FolderWatcherConfig {
    /// Pause after each refresh so a burst of changes coalesces into the
    /// next batch instead of triggering one refresh per file.
    pub throttle_ms: u64,
    /// Whether to drop events for files without the sound suffix, such as
    /// the settings file. Hidden `.wav` files still count.
    pub sounds_only: bool,
}

impl Default for FolderWatcherConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 100,
            sounds_only: true,
        }
    }
}
