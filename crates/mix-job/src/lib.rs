//! # AutoMix job layer
//!
//! Runs the mix pipeline as single-flight background jobs:
//! - [`MixJobCoordinator`]: trigger, conflict detection, timeout, lazy start
//! - [`MixParameterStore`]: latest tracks and status for pollers
//! - [`MixBackend`]: ONNX model or genre presets

mod backend;
mod config;
mod coordinator;
mod error;
mod store;
mod track;

pub use backend::{FallbackBackend, MixBackend, MixPrediction, ModelBackend, select_backend};
pub use config::JobConfig;
pub use coordinator::{JobTicket, MixJobCoordinator};
pub use error::{ErrorKind, JobError, JobResult};
pub use store::{JobId, MixParameterStore};
pub use track::{JobStatus, MixSnapshot, ParameterScale, Track, listing_tracks};

pub use mix_file::SampleEntry;
pub use mix_ml::{MAX_TRACKS, MixParams};
