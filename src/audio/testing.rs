//! In-memory output backend and WAV fixtures for tests.

use std::{
    cell::{Cell, RefCell},
    path::{Path, PathBuf},
    rc::Rc,
};

use hound::{SampleFormat::Int, WavSpec, WavWriter};

use crate::audio::{
    decoder::WavDecoder,
    output::OutputError,
    registry::{AudioBackend, OutputDevice},
};

/// Sample rate the mock devices refuse to play.
pub const UNPLAYABLE_RATE: u32 = 8000;

/// Writes a short 16-bit PCM file.
pub fn write_wav(path: &Path, channels: u16, sample_rate: u32) {
    write_wav_frames(path, channels, sample_rate, 256);
}

/// Writes a 16-bit PCM file of a given length.
pub fn write_wav_frames(path: &Path, channels: u16, sample_rate: u32, frames: u32) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for frame in 0..frames {
        for _ in 0..channels {
            writer.write_sample((frame % 256) as i16 * 64).unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// Shared record of which mock devices are open.
#[derive(Debug, Default)]
pub struct OpenDevices {
    open: RefCell<Vec<String>>,
    peak: Cell<usize>,
    opened_total: Cell<usize>,
}

impl OpenDevices {
    pub fn open_names(&self) -> Vec<String> {
        self.open.borrow().clone()
    }

    /// Most devices ever open at the same moment.
    pub fn peak(&self) -> usize {
        self.peak.get()
    }

    pub fn opened_total(&self) -> usize {
        self.opened_total.get()
    }

    fn opened(&self, name: &str) {
        let mut open = self.open.borrow_mut();
        open.push(name.to_string());
        self.peak.set(self.peak.get().max(open.len()));
        self.opened_total.set(self.opened_total.get() + 1);
    }

    fn closed(&self, name: &str) {
        let mut open = self.open.borrow_mut();
        if let Some(index) = open.iter().position(|open_name| open_name == name) {
            open.remove(index);
        }
    }
}

/// Backend with a fixed device list.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub outputs: RefCell<Vec<String>>,
    /// Devices that are listed but fail to open.
    pub broken: Vec<String>,
    pub devices: Rc<OpenDevices>,
}

impl MockBackend {
    pub fn with_outputs(names: &[&str]) -> Self {
        Self {
            outputs: RefCell::new(names.iter().map(|name| name.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Unplugs a device so it no longer enumerates.
    pub fn unplug(&self, name: &str) {
        self.outputs.borrow_mut().retain(|output| output != name);
    }
}

impl AudioBackend for MockBackend {
    type Device = MockDevice;

    fn list_outputs(&self) -> Result<Vec<String>, OutputError> {
        Ok(self.outputs.borrow().clone())
    }

    fn open_device(&self, name: &str) -> Result<Self::Device, OutputError> {
        if !self.outputs.borrow().iter().any(|output| output == name) {
            return Err(OutputError::DeviceNotFound {
                name: name.to_string(),
            });
        }
        if self.broken.iter().any(|broken| broken == name) {
            return Err(OutputError::EnumerationFailed(format!("{name} is busy")));
        }
        self.devices.opened(name);
        Ok(MockDevice {
            name: name.to_string(),
            devices: Rc::clone(&self.devices),
        })
    }
}

#[derive(Debug)]
pub struct MockDevice {
    name: String,
    devices: Rc<OpenDevices>,
}

impl OutputDevice for MockDevice {
    type Session = MockSession;

    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, decoder: WavDecoder) -> Result<Self::Session, OutputError> {
        if decoder.format().sample_rate == UNPLAYABLE_RATE {
            return Err(OutputError::UnsupportedStreamConfig {
                reason: format!("no output range contains {UNPLAYABLE_RATE} Hz"),
            });
        }
        Ok(MockSession {
            path: decoder.path().to_path_buf(),
        })
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.devices.closed(&self.name);
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockSession {
    pub path: PathBuf,
}
