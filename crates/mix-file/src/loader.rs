//! Fixed-window stem loader
//!
//! Every stem handed to the model is a stereo buffer of exactly
//! [`WINDOW_LEN`] samples per channel: mono sources are duplicated, short
//! sources zero-padded, long ones truncated.

use std::path::Path;

use crate::{FileError, FileResult, read_audio};

/// Samples per channel the mix model was trained on
pub const WINDOW_LEN: usize = 485_052;

/// Stereo stem fitted to the model window
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    /// Rate of the source file. Informational only, never corrected.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Samples per channel
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Loads a batch of stems into uniform [`AudioBuffer`]s
#[derive(Debug, Clone)]
pub struct AudioSampleLoader {
    window_len: usize,
}

impl Default for AudioSampleLoader {
    fn default() -> Self {
        Self::new(WINDOW_LEN)
    }
}

impl AudioSampleLoader {
    pub fn new(window_len: usize) -> Self {
        Self { window_len }
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Load every path in order. The first unreadable file fails the whole
    /// batch.
    pub fn load<P: AsRef<Path>>(&self, paths: &[P]) -> FileResult<Vec<AudioBuffer>> {
        paths.iter().map(|p| self.load_one(p.as_ref())).collect()
    }

    /// Load a single stem
    pub fn load_one(&self, path: &Path) -> FileResult<AudioBuffer> {
        let data = read_audio(path)?;
        log::debug!(
            "Loaded {} ({} Hz, {} frames, {:.2}s)",
            path.display(),
            data.sample_rate,
            data.num_frames(),
            data.duration()
        );

        let mut channels = data.channels.into_iter();
        let left = channels
            .next()
            .ok_or_else(|| FileError::InvalidFile(format!("{}: no audio channels", path.display())))?;
        let right = channels.next().unwrap_or_else(|| left.clone());

        Ok(AudioBuffer {
            left: fit_window(left, self.window_len),
            right: fit_window(right, self.window_len),
            sample_rate: data.sample_rate,
        })
    }
}

/// Zero-pad or truncate to `len`
fn fit_window(mut samples: Vec<f32>, len: usize) -> Vec<f32> {
    samples.resize(len, 0.0);
    samples
}
