//! Output device selection and single-sound playback.
//!
//! The registry owns at most one open output device and at most one playing
//! sound. Selecting a device closes the previous one first; playing a sound
//! stops the previous one first. Hardware access goes through the
//! `AudioBackend` and `OutputDevice` traits so the state machine does not
//! depend on a particular audio API.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::{
    audio::{decoder::WavDecoder, output::OutputError},
    error::domain::SoundboardError,
};

/// Enumerates and opens output devices.
pub trait AudioBackend {
    /// Device type produced by `open_device`.
    type Device: OutputDevice;

    /// Lists every output-capable device by name, in enumeration order.
    ///
    /// # Errors
    ///
    /// Returns `OutputError` if the host cannot enumerate devices.
    fn list_outputs(&self) -> Result<Vec<String>, OutputError>;

    /// Opens the output device with the given name.
    ///
    /// # Errors
    ///
    /// Returns `OutputError` if no such device exists or it cannot be opened.
    fn open_device(&self, name: &str) -> Result<Self::Device, OutputError>;
}

/// An open output device. Dropping it releases the device.
pub trait OutputDevice {
    /// A sound playing on this device. Dropping it stops playback.
    type Session;

    /// Gets the name the device was opened by.
    fn name(&self) -> &str;

    /// Starts playing a file from the beginning.
    ///
    /// # Errors
    ///
    /// Returns `OutputError` if the device cannot play the file.
    fn start(&mut self, decoder: WavDecoder) -> Result<Self::Session, OutputError>;
}

/// Which device, if any, is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    /// No device selected; playback is unavailable.
    NoDevice,
    /// The named device is open.
    DeviceOpen(String),
}

type SessionOf<B> = <<B as AudioBackend>::Device as OutputDevice>::Session;

/// Owns the active output device and the playing sound.
pub struct DeviceRegistry<B: AudioBackend> {
    /// Source of devices.
    backend: B,
    /// The open device, if any.
    active: Option<B::Device>,
    /// The playing sound, if any.
    session: Option<SessionOf<B>>,
}

impl<B: AudioBackend> DeviceRegistry<B> {
    /// Creates a registry with no device selected.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            active: None,
            session: None,
        }
    }

    /// Lists every output device by name.
    ///
    /// # Errors
    ///
    /// Returns `SoundboardError::DeviceUnavailable` if enumeration fails.
    pub fn list_outputs(&self) -> Result<Vec<String>, SoundboardError> {
        self.backend
            .list_outputs()
            .map_err(|e| SoundboardError::device_unavailable("output devices", e.to_string()))
    }

    /// Makes the named device the active one.
    ///
    /// The name is checked against a fresh enumeration before anything is
    /// closed, so an unknown name leaves the current selection in place. If
    /// the device is listed but then fails to open, the previous device has
    /// already been released and no device is selected.
    ///
    /// # Errors
    ///
    /// Returns `SoundboardError::DeviceUnavailable` if the device is not
    /// listed or cannot be opened.
    pub fn select_device(&mut self, name: &str) -> Result<(), SoundboardError> {
        let outputs = self.list_outputs()?;
        if !outputs.iter().any(|output| output == name) {
            return Err(SoundboardError::device_unavailable(
                name,
                "not an available output device",
            ));
        }

        self.close();

        let device = self
            .backend
            .open_device(name)
            .map_err(|e| e.into_domain(name, None))?;
        info!("Selected output device: {}", device.name());
        self.active = Some(device);
        Ok(())
    }

    /// Plays a file on the active device, stopping whatever was playing.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `SoundboardError::NoDeviceSelected` if no device is open; nothing
    ///   changes in that case
    /// - `SoundboardError::UnsupportedFormat` if the file is not a playable WAV
    /// - `SoundboardError::IoFailure` if the file cannot be read
    /// - `SoundboardError::DeviceUnavailable` if the device rejects the stream
    pub fn play(&mut self, path: &Path) -> Result<(), SoundboardError> {
        let Some(device) = self.active.as_mut() else {
            warn!("Cannot play {:?}: no output device selected", path);
            return Err(SoundboardError::NoDeviceSelected);
        };

        if self.session.take().is_some() {
            debug!("Stopped previous sound");
        }

        let decoder = WavDecoder::open(path)?;
        let device_name = device.name().to_string();
        let session = device
            .start(decoder)
            .map_err(|e| e.into_domain(&device_name, Some(path.to_path_buf())))?;
        info!("Playing {:?} on {}", path, device_name);
        self.session = Some(session);
        Ok(())
    }

    /// Stops the playing sound, if any.
    pub fn stop(&mut self) {
        self.session = None;
    }

    /// Stops playback and releases the active device.
    pub fn close(&mut self) {
        self.stop();
        if let Some(device) = self.active.take() {
            debug!("Closed output device: {}", device.name());
        }
    }

    /// Gets the selection state.
    pub fn state(&self) -> DeviceState {
        match &self.active {
            Some(device) => DeviceState::DeviceOpen(device.name().to_string()),
            None => DeviceState::NoDevice,
        }
    }

    /// Gets the name of the active device.
    pub fn active_device(&self) -> Option<&str> {
        self.active.as_ref().map(OutputDevice::name)
    }

    /// Checks if a sound session is open.
    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    /// Gets the playing session.
    pub fn session(&self) -> Option<&SessionOf<B>> {
        self.session.as_ref()
    }

    /// Gets the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: AudioBackend> Drop for DeviceRegistry<B> {
    fn drop(&mut self) {
        self.close();
    }
}
