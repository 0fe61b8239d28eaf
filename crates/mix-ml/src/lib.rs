//! # AutoMix model layer
//!
//! Everything between decoded stems and engineering-unit mix parameters:
//! - Genre and instrument vocabularies (model codes)
//! - Feature tensor assembly with shape validation
//! - ONNX inference through tract (pure Rust)
//! - Output denormalization to gain / pan
//! - Deterministic presets for deployments without a model

mod denorm;
mod error;
mod fallback;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;
mod inference;
mod tensor;
mod vocab;

pub use denorm::{
    GAIN_FLOOR_DB, MixParams, TARGET_SPAN_DB, TRAINING_SPAN_DB, denorm_gain, denorm_pan,
    denormalize,
};
pub use error::{MlError, MlResult};
pub use fallback::{FALLBACK_PANS, fallback_gains};
pub use inference::{InferenceEngine, ModelSignature, SlotInfo, slots};
pub use tensor::{FeatureTensorBuilder, FeatureTensors, StemInput};
pub use vocab::{
    Genre, INSTRUMENT_KEYS, MISC_INSTRUMENT, OTHER_LABEL, SLOT_LABELS, genre_code,
    instrument_code, instrument_key, slot_label,
};

/// Tracks processed per job
pub const MAX_TRACKS: usize = 8;

/// Channels per track (stereo)
pub const NUM_CHANNELS: usize = 2;

/// Values the model must emit: gains then pans, one per track slot
pub const OUTPUT_LEN: usize = MAX_TRACKS * 2;

/// Model artifact locations
pub mod models {
    /// Default mix model artifact, relative to the working directory
    pub const MIX_MODEL: &str = "AImix_model.onnx";
}
