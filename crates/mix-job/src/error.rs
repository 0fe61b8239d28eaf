//! Job error taxonomy

use std::time::Duration;

use mix_file::FileError;
use mix_ml::MlError;
use serde::Serialize;
use thiserror::Error;

/// Coarse error classes reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing genre or no eligible samples
    Input,
    /// Sample file unreadable or undecodable
    Io,
    /// Batch rejected by the tensor builder
    Shape,
    /// Model artifact missing or malformed
    ModelLoad,
    /// Forward pass failed
    ModelExecution,
    /// Trigger while a job is processing
    Conflict,
    /// Job exceeded its time limit
    Timeout,
    /// Worker task died
    Worker,
}

/// Mix job errors
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Genre is required")]
    MissingGenre,

    #[error("No audio samples found")]
    NoSamples,

    #[error("Audio error: {0}")]
    Audio(#[from] FileError),

    #[error(transparent)]
    Model(#[from] MlError),

    #[error("A mix job is already processing (genre: {genre})")]
    Conflict { genre: String },

    #[error("Mix job timed out after {limit:?}")]
    Timeout { limit: Duration },

    #[error("Mix worker failed: {0}")]
    Worker(String),
}

impl JobError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingGenre | Self::NoSamples => ErrorKind::Input,
            Self::Audio(_) => ErrorKind::Io,
            Self::Model(e) if e.is_shape_error() => ErrorKind::Shape,
            Self::Model(e) if e.is_load_error() => ErrorKind::ModelLoad,
            Self::Model(_) => ErrorKind::ModelExecution,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Worker(_) => ErrorKind::Worker,
        }
    }
}

/// Result type for job operations
pub type JobResult<T> = Result<T, JobError>;
