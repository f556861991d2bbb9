//! Audio output using the `cpal` crate.
//!
//! This module enumerates output devices, opens one by name, and plays a
//! decoded WAV file on it. Decoding runs on a producer thread that feeds a
//! lock-free ring buffer; the device callback drains the buffer and converts
//! samples to whatever format the device wants.

use std::{
    path::{Path, PathBuf},
    thread::{JoinHandle, sleep, spawn},
    time::Duration,
};

use {
    cpal::{
        BufferSize::Default as CpalDefault,
        BuildStreamError, Device, FromSample, Host, OutputCallbackInfo, PlayStreamError,
        SampleFormat::{self, F32, I16, I32, U16},
        SizedSample, Stream, StreamConfig, SupportedStreamConfigRange, default_host,
        traits::{DeviceTrait, HostTrait, StreamTrait},
    },
    rtrb::{Consumer, PopError::Empty, Producer, PushError::Full, RingBuffer},
    thiserror::Error,
    tracing::{debug, error, info, warn},
};

use crate::audio::{
    decoder::{AudioFormat, DecoderError, WavDecoder},
    registry::{AudioBackend, OutputDevice},
};

/// Ring buffer capacity in samples.
const RING_BUFFER_SIZE: usize = 16384;

/// Sleep duration when producer buffer is full.
const PRODUCER_SLEEP_DURATION: Duration = Duration::from_micros(100);

/// Error type for audio output operations.
#[derive(Error, Debug)]
pub enum OutputError {
    /// The host could not list its devices.
    #[error("Failed to enumerate output devices: {0}")]
    EnumerationFailed(String),
    /// No output device with the requested name exists.
    #[error("Output device not found: {name}")]
    DeviceNotFound { name: String },
    /// The device cannot play the file's sample rate.
    #[error("Unsupported stream configuration: {reason}")]
    UnsupportedStreamConfig { reason: String },
    /// CPAL stream construction error.
    #[error("Audio output error: {0}")]
    CpalError(#[from] BuildStreamError),
    /// Failed to start audio stream.
    #[error("Failed to start audio stream: {0}")]
    StreamStartError(#[from] PlayStreamError),
    /// Unsupported sample format.
    #[error("Unsupported sample format: {format:?}")]
    UnsupportedSampleFormat { format: SampleFormat },
}

/// Audio backend for the platform's default `cpal` host.
pub struct CpalBackend {
    /// The CPAL host instance.
    host: Host,
}

impl CpalBackend {
    /// Creates a backend on the default host.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: default_host(),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    type Device = CpalOutputDevice;

    fn list_outputs(&self) -> Result<Vec<String>, OutputError> {
        let devices = self
            .host
            .output_devices()
            .map_err(|e| OutputError::EnumerationFailed(e.to_string()))?;
        Ok(devices.filter_map(|device| device_name(&device)).collect())
    }

    fn open_device(&self, name: &str) -> Result<Self::Device, OutputError> {
        let device = self
            .host
            .output_devices()
            .map_err(|e| OutputError::EnumerationFailed(e.to_string()))?
            .find(|device| device_name(device).as_deref() == Some(name))
            .ok_or_else(|| OutputError::DeviceNotFound {
                name: name.to_string(),
            })?;

        info!("Opened output device: {}", name);
        Ok(CpalOutputDevice {
            name: name.to_string(),
            device,
        })
    }
}

/// Gets the name a device is listed and persisted under.
fn device_name(device: &Device) -> Option<String> {
    device.description().ok().map(|desc| desc.to_string())
}

/// An opened `cpal` output device.
pub struct CpalOutputDevice {
    /// Name the device was opened by.
    name: String,
    /// The CPAL device.
    device: Device,
}

impl OutputDevice for CpalOutputDevice {
    type Session = CpalSession;

    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, decoder: WavDecoder) -> Result<Self::Session, OutputError> {
        let format = decoder.format();
        let ranges: Vec<SupportedStreamConfigRange> = self
            .device
            .supported_output_configs()
            .map_err(|e| OutputError::UnsupportedStreamConfig {
                reason: e.to_string(),
            })?
            .collect();
        let (stream_config, sample_format) = choose_stream_config(&ranges, &format)?;
        let output_channels = usize::from(stream_config.channels);

        let (producer, consumer) = RingBuffer::<f32>::new(RING_BUFFER_SIZE);
        let stream = match sample_format {
            F32 => build_stream::<f32>(&self.device, &stream_config, consumer)?,
            I16 => build_stream::<i16>(&self.device, &stream_config, consumer)?,
            I32 => build_stream::<i32>(&self.device, &stream_config, consumer)?,
            U16 => build_stream::<u16>(&self.device, &stream_config, consumer)?,
            other => return Err(OutputError::UnsupportedSampleFormat { format: other }),
        };

        let path = decoder.path().to_path_buf();
        let producer = ClipProducer::new(decoder, producer, output_channels);
        let producer_handle = spawn(move || producer.run());

        stream.play()?;
        debug!(
            "Playing {:?} on {} ({} Hz, {} channels, {:?})",
            path, self.name, stream_config.sample_rate, output_channels, sample_format
        );

        Ok(CpalSession {
            path,
            stream: Some(stream),
            producer_handle: Some(producer_handle),
        })
    }
}

/// Picks the stream configuration for a file.
///
/// The range must contain the file's sample rate; no resampling is done.
/// A range with the file's channel count wins, otherwise the range with the
/// most channels.
///
/// # Errors
///
/// Returns `OutputError::UnsupportedStreamConfig` if no range contains the
/// sample rate in a supported sample format.
pub fn choose_stream_config(
    ranges: &[SupportedStreamConfigRange],
    format: &AudioFormat,
) -> Result<(StreamConfig, SampleFormat), OutputError> {
    let rate = format.sample_rate;
    let playable = |range: &&SupportedStreamConfigRange| {
        range.min_sample_rate() <= rate
            && rate <= range.max_sample_rate()
            && matches!(range.sample_format(), F32 | I16 | I32 | U16)
    };

    let chosen = ranges
        .iter()
        .filter(playable)
        .find(|range| usize::from(range.channels()) == format.channels)
        .or_else(|| {
            ranges
                .iter()
                .filter(playable)
                .max_by_key(|range| range.channels())
        })
        .ok_or_else(|| OutputError::UnsupportedStreamConfig {
            reason: format!("no output configuration plays {rate} Hz"),
        })?;

    Ok((
        StreamConfig {
            channels: chosen.channels(),
            sample_rate: rate,
            buffer_size: CpalDefault,
        },
        chosen.sample_format(),
    ))
}

/// Creates an output stream that drains the ring buffer.
fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut consumer: Consumer<f32>,
) -> Result<Stream, OutputError>
where
    T: SizedSample + FromSample<f32>,
{
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &OutputCallbackInfo| {
            for sample in data.iter_mut() {
                *sample = match consumer.pop() {
                    Ok(value) => T::from_sample(value.clamp(-1.0, 1.0)),
                    // Underrun or end of clip
                    Err(Empty) => T::EQUILIBRIUM,
                };
            }
        },
        |err| error!("Audio stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

/// Maps one input frame onto one output channel.
///
/// Equal layouts copy, mono input is duplicated, mono output averages, and
/// output channels beyond the input's are silent.
#[must_use]
pub fn map_channel(frame: &[f32], output_channel: usize, output_channels: usize) -> f32 {
    match (frame.len(), output_channels) {
        (0, _) => 0.0,
        (1, _) => frame[0],
        (input_channels, 1) => frame.iter().sum::<f32>() / input_channels as f32,
        _ => frame.get(output_channel).copied().unwrap_or(0.0),
    }
}

/// Feeds decoded samples into the ring buffer.
struct ClipProducer {
    /// The decoder that provides samples.
    decoder: WavDecoder,
    /// Ring buffer producer for writing converted samples.
    producer: Producer<f32>,
    /// Channel count of the output stream.
    output_channels: usize,
}

impl ClipProducer {
    fn new(decoder: WavDecoder, producer: Producer<f32>, output_channels: usize) -> Self {
        Self {
            decoder,
            producer,
            output_channels,
        }
    }

    /// Decodes until the end of the file or until the stream goes away.
    fn run(mut self) -> Result<(), DecoderError> {
        let input_channels = self.decoder.format().channels;

        while let Some(samples) = self.decoder.next_samples()? {
            for frame in samples.chunks_exact(input_channels) {
                for channel in 0..self.output_channels {
                    let sample = map_channel(frame, channel, self.output_channels);
                    if !self.push(sample) {
                        return Ok(());
                    }
                }
            }
        }

        debug!("Finished decoding {:?}", self.decoder.path());
        Ok(())
    }

    /// Pushes one sample, waiting while the buffer is full.
    ///
    /// Returns `false` once the consumer side has been dropped.
    fn push(&mut self, sample: f32) -> bool {
        loop {
            if self.producer.is_abandoned() {
                return false;
            }
            match self.producer.push(sample) {
                Ok(()) => return true,
                Err(Full(_)) => sleep(PRODUCER_SLEEP_DURATION),
            }
        }
    }
}

/// A sound playing on a `cpal` device.
///
/// Dropping the session stops playback and joins the decoder thread.
pub struct CpalSession {
    /// File being played.
    path: PathBuf,
    /// The CPAL audio stream.
    stream: Option<Stream>,
    /// Join handle for the decoder thread.
    producer_handle: Option<JoinHandle<Result<(), DecoderError>>>,
}

impl CpalSession {
    /// Gets the file being played.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CpalSession {
    fn drop(&mut self) {
        // Dropping the stream drops the consumer, which releases the producer
        drop(self.stream.take());

        if let Some(handle) = self.producer_handle.take() {
            match handle.join() {
                Ok(Ok(())) => debug!("Stopped playback of {:?}", self.path),
                Ok(Err(e)) => warn!("Decoder for {:?} stopped with error: {}", self.path, e),
                Err(_) => error!("Decoder thread for {:?} panicked", self.path),
            }
        }
    }
}
