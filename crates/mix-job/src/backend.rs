//! Mix backends
//!
//! A backend turns a genre and a sample batch into per-track parameters.
//! The model backend runs the ONNX pipeline; the preset backend serves
//! fixed per-genre values when no artifact is deployed.

use std::path::PathBuf;
use std::sync::Arc;

use mix_file::{AudioSampleLoader, SampleEntry, WINDOW_LEN};
use mix_ml::{
    FALLBACK_PANS, FeatureTensorBuilder, FeatureTensors, InferenceEngine, MAX_TRACKS, MixParams,
    StemInput, denormalize, fallback_gains,
};

use crate::error::JobResult;
use crate::track::ParameterScale;

/// Parameters for a batch, in slot order
#[derive(Debug, Clone, PartialEq)]
pub struct MixPrediction {
    pub params: Vec<MixParams>,
    pub scale: ParameterScale,
}

/// Produces mix parameters for a sample batch.
///
/// Called from a blocking worker thread; implementations may block.
pub trait MixBackend: Send + Sync {
    /// Backend name for logs and health reporting
    fn name(&self) -> &'static str;

    /// Parameters for `samples` (at most [`MAX_TRACKS`], non-empty)
    fn predict(&self, genre: &str, samples: &[SampleEntry]) -> JobResult<MixPrediction>;
}

/// Decode, tensorize, infer, denormalize
pub struct ModelBackend {
    loader: AudioSampleLoader,
    builder: FeatureTensorBuilder,
    engine: InferenceEngine,
}

impl ModelBackend {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self::with_window_len(model_path, WINDOW_LEN)
    }

    /// Backend with a non-default analysis window
    pub fn with_window_len<P: Into<PathBuf>>(model_path: P, window_len: usize) -> Self {
        Self {
            loader: AudioSampleLoader::new(window_len),
            builder: FeatureTensorBuilder::new(window_len),
            engine: InferenceEngine::new(model_path),
        }
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Load the batch and assemble model inputs
    pub fn prepare(&self, genre: &str, samples: &[SampleEntry]) -> JobResult<FeatureTensors> {
        let paths: Vec<&std::path::Path> = samples.iter().map(|s| s.path.as_path()).collect();
        let buffers = self.loader.load(&paths)?;

        let stems: Vec<StemInput<'_>> = buffers
            .iter()
            .zip(samples)
            .map(|(buffer, sample)| StemInput {
                left: &buffer.left,
                right: &buffer.right,
                instrument: sample.stem(),
            })
            .collect();

        Ok(self.builder.build(genre, &stems)?)
    }
}

impl MixBackend for ModelBackend {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn predict(&self, genre: &str, samples: &[SampleEntry]) -> JobResult<MixPrediction> {
        let tensors = self.prepare(genre, samples)?;
        let raw = self.engine.infer(&tensors)?;

        log::debug!(
            "{} output: {:?}",
            self.engine.model_path().display(),
            &raw[..raw.len().min(mix_ml::OUTPUT_LEN)]
        );

        Ok(MixPrediction {
            params: denormalize(&raw, samples.len()),
            scale: ParameterScale::Normalized,
        })
    }
}

/// Per-genre presets in dB / percent
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackBackend;

impl MixBackend for FallbackBackend {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn predict(&self, genre: &str, samples: &[SampleEntry]) -> JobResult<MixPrediction> {
        let gains = fallback_gains(genre);
        let params = gains
            .iter()
            .zip(FALLBACK_PANS.iter())
            .take(samples.len().min(MAX_TRACKS))
            .map(|(&gain, &pan)| MixParams { gain, pan })
            .collect();

        Ok(MixPrediction {
            params,
            scale: ParameterScale::Decibels,
        })
    }
}

/// Model backend if the artifact exists, presets otherwise
pub fn select_backend<P: Into<PathBuf>>(model_path: P) -> Arc<dyn MixBackend> {
    let model_path = model_path.into();
    if model_path.exists() {
        log::info!("Using ONNX mix model {}", model_path.display());
        Arc::new(ModelBackend::new(model_path))
    } else {
        log::warn!(
            "Mix model {} not found, serving genre presets",
            model_path.display()
        );
        Arc::new(FallbackBackend)
    }
}
