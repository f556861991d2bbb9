//! WAV decoding using the `symphonia` crate.
//!
//! Opening a file probes its container and builds a decoder up front, so a
//! file that is not a playable WAV is rejected before any device stream is
//! created. Samples are then pulled packet by packet as interleaved `f32`.

use std::{
    fs::File,
    io::{Error as StdError, ErrorKind::UnexpectedEof},
    path::{Path, PathBuf},
};

use {
    symphonia::{
        core::{
            audio::SampleBuffer,
            codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions},
            errors::Error as SymphoniaError,
            formats::{FormatOptions, FormatReader},
            io::{MediaSourceStream, MediaSourceStreamOptions},
            meta::MetadataOptions,
            probe::Hint,
        },
        default::{get_codecs, get_probe},
    },
    thiserror::Error,
    tracing::{debug, warn},
};

/// Error type for audio decoding operations.
#[derive(Error, Debug)]
pub enum DecoderError {
    /// Failed to open or read the audio file.
    #[error("IO error reading {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: StdError,
    },
    /// The file is not a WAV file symphonia can decode.
    #[error("Unsupported audio format in {path:?}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },
    /// No audio track found in file.
    #[error("No audio track found in {path:?}")]
    NoAudioTrack { path: PathBuf },
}

/// Sample rate and channel layout of a decoded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: usize,
}

/// Streaming decoder for a single WAV file.
pub struct WavDecoder {
    /// Path the decoder was opened from.
    path: PathBuf,
    /// The underlying format reader.
    format_reader: Box<dyn FormatReader>,
    /// The active audio decoder.
    decoder: Box<dyn Decoder>,
    /// Track whose packets are decoded.
    track_id: u32,
    /// Audio format information.
    format: AudioFormat,
}

impl WavDecoder {
    /// Opens a file and prepares it for decoding from the beginning.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the `.wav` file.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `WavDecoder` or a `DecoderError`.
    ///
    /// # Errors
    ///
    /// Returns `DecoderError` if:
    /// - The file cannot be opened or read
    /// - The file is not a supported WAV file
    /// - No audio track is found in the file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DecoderError> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path).map_err(|source| DecoderError::IoError {
            path: path.clone(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        hint.with_extension("wav");

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Self::map_error(&path, e))?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecoderError::NoAudioTrack { path: path.clone() })?;
        let codec_params = &track.codec_params;

        let sample_rate =
            codec_params
                .sample_rate
                .ok_or_else(|| DecoderError::UnsupportedFormat {
                    path: path.clone(),
                    reason: "missing sample rate".to_string(),
                })?;
        let channels = codec_params
            .channels
            .map(|channels| channels.count())
            .filter(|&count| count > 0)
            .ok_or_else(|| DecoderError::UnsupportedFormat {
                path: path.clone(),
                reason: "missing channel layout".to_string(),
            })?;
        let track_id = track.id;

        let decoder = get_codecs()
            .make(codec_params, &DecoderOptions::default())
            .map_err(|e| Self::map_error(&path, e))?;

        debug!(
            "Opened {:?}: {} Hz, {} channels",
            path, sample_rate, channels
        );

        Ok(Self {
            path,
            format_reader,
            decoder,
            track_id,
            format: AudioFormat {
                sample_rate,
                channels,
            },
        })
    }

    /// Gets the path the decoder was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the sample rate and channel count.
    #[must_use]
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Decodes the next packet.
    ///
    /// # Returns
    ///
    /// Interleaved samples, or `None` at the end of the file.
    ///
    /// # Errors
    ///
    /// Returns `DecoderError` if reading fails. Corrupt packets are skipped.
    pub fn next_samples(&mut self) -> Result<Option<Vec<f32>>, DecoderError> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == UnexpectedEof => {
                    return Ok(None);
                }
                Err(e) => return Err(Self::map_error(&self.path, e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut buffer =
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                    buffer.copy_interleaved_ref(decoded);
                    return Ok(Some(buffer.samples().to_vec()));
                }
                Err(SymphoniaError::DecodeError(reason)) => {
                    warn!("Skipping corrupt packet in {:?}: {}", self.path, reason);
                }
                Err(e) => return Err(Self::map_error(&self.path, e)),
            }
        }
    }

    fn map_error(path: &Path, error: SymphoniaError) -> DecoderError {
        match error {
            SymphoniaError::IoError(source) => DecoderError::IoError {
                path: path.to_path_buf(),
                source,
            },
            other => DecoderError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        }
    }
}
