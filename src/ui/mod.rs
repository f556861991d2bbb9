//! Soundboard window built with Libadwaita.
//!
//! This module provides the main application window and the output device
//! picker. It is only compiled with the `gui` feature.

#[cfg(test)]
mod tests;

pub mod application;
pub mod device_dialog;

pub use {
    application::{SharedState, SoundboardApplication},
    device_dialog::DeviceDialog,
};
