//! Track list and job snapshot types exchanged with clients

use std::path::PathBuf;

use mix_file::SampleEntry;
use mix_ml::slot_label;
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Job lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Processing,
    Completed,
    Failed,
}

/// Units of a completed track list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterScale {
    /// Model output: gain in [0, 1] on the -48..+6 dB scale, pan in [-1, 1]
    Normalized,
    /// Preset output: gain in dB, pan in percent (-100..100)
    Decibels,
}

/// One mixer slot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// 1-based slot number
    pub id: String,
    pub display_name: String,
    pub instrument_label: String,
    pub source_path: PathBuf,
    pub gain: Option<f32>,
    pub pan: Option<f32>,
}

impl Track {
    /// Slot `index` for a sample, without parameters
    pub fn from_sample(index: usize, sample: &SampleEntry) -> Self {
        Self {
            id: (index + 1).to_string(),
            display_name: sample.name.clone(),
            instrument_label: slot_label(index).to_string(),
            source_path: sample.path.clone(),
            gain: None,
            pan: None,
        }
    }

    pub fn has_params(&self) -> bool {
        self.gain.is_some() && self.pan.is_some()
    }
}

/// Parameter-less track list for a sample batch
pub fn listing_tracks(samples: &[SampleEntry]) -> Vec<Track> {
    samples
        .iter()
        .enumerate()
        .map(|(index, sample)| Track::from_sample(index, sample))
        .collect()
}

/// Point-in-time copy of the live job, as served to pollers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixSnapshot {
    pub job_id: u64,
    pub status: JobStatus,
    pub is_processing: bool,
    pub genre: Option<String>,
    pub tracks: Vec<Track>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub scale: Option<ParameterScale>,
}
