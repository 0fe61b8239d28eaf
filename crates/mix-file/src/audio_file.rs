//! Audio file decoding
//!
//! Supports the PCM containers accepted as mix stems:
//! - WAV (8/16/24/32-bit int, 32-bit float) through hound
//! - AIFF and FLAC through symphonia
//!
//! Samples are decoded as-is. No resampling or loudness normalization is
//! applied, so the source sample rate is reported but never corrected.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::{FileError, FileResult};

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIO FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// Audio container format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Aiff,
    Flac,
    Unknown,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "wav" | "wave" => Self::Wav,
            "aif" | "aiff" => Self::Aiff,
            "flac" => Self::Flac,
            _ => Self::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Whether the pipeline accepts files of this format
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIO DATA CONTAINER
// ═══════════════════════════════════════════════════════════════════════════════

/// Decoded audio
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Samples, deinterleaved, one Vec per channel
    pub channels: Vec<Vec<f32>>,
    /// Source sample rate in Hz
    pub sample_rate: u32,
    /// Container the samples came from
    pub format: AudioFormat,
}

impl AudioData {
    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames
    pub fn num_frames(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_frames() as f64 / self.sample_rate as f64
    }

    fn from_interleaved(
        samples: &[f32],
        num_channels: usize,
        sample_rate: u32,
        format: AudioFormat,
    ) -> Self {
        let num_frames = samples.len() / num_channels.max(1);
        let mut channels = vec![Vec::with_capacity(num_frames); num_channels];

        for chunk in samples.chunks_exact(num_channels.max(1)) {
            for (ch, &sample) in chunk.iter().enumerate() {
                channels[ch].push(sample);
            }
        }

        Self {
            channels,
            sample_rate,
            format,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WAV READING (hound)
// ═══════════════════════════════════════════════════════════════════════════════

/// Read WAV file using hound
pub fn read_wav<P: AsRef<Path>>(path: P) -> FileResult<AudioData> {
    let reader = hound::WavReader::open(path.as_ref())?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_value))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(AudioData::from_interleaved(
        &samples,
        spec.channels as usize,
        spec.sample_rate,
        AudioFormat::Wav,
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYMPHONIA READING (AIFF, FLAC)
// ═══════════════════════════════════════════════════════════════════════════════

/// Read any supported audio file. WAV goes through hound, the rest through
/// symphonia.
pub fn read_audio<P: AsRef<Path>>(path: P) -> FileResult<AudioData> {
    let path = path.as_ref();
    let format = AudioFormat::from_path(path);

    if !format.is_supported() {
        return Err(FileError::UnsupportedFormat(path.display().to_string()));
    }

    if format == AudioFormat::Wav {
        return read_wav(path);
    }

    let file = File::open(path).map_err(|_| FileError::NotFound(path.display().to_string()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| FileError::DecodeError(e.to_string()))?;

    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| FileError::InvalidFile("No audio track found".to_string()))?;

    let track_id = track.id;
    let mut num_channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| FileError::DecodeError(e.to_string()))?;

    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(FileError::DecodeError(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                num_channels = spec.channels.count();
                sample_rate = spec.rate;

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            Err(e) => {
                return Err(FileError::DecodeError(format!("{}: {}", path.display(), e)));
            }
        }
    }

    if num_channels == 0 {
        return Err(FileError::InvalidFile(format!(
            "{}: no channel layout",
            path.display()
        )));
    }

    Ok(AudioData::from_interleaved(
        &interleaved,
        num_channels,
        sample_rate,
        format,
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
