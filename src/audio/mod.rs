//! Audio playback system.
//!
//! Plays one WAV file at a time on a user-selected output device using cpal,
//! symphonia, and rtrb. Includes the device registry, the WAV decoder, and
//! the cpal output backend.

pub mod decoder;
pub mod output;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    decoder::{AudioFormat, DecoderError, WavDecoder},
    output::{CpalBackend, CpalOutputDevice, CpalSession, OutputError},
    registry::{AudioBackend, DeviceRegistry, DeviceState, OutputDevice},
};
