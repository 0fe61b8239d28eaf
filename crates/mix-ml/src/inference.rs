//! ONNX inference engine
//!
//! Wraps a tract model that is parsed lazily on first use and kept for the
//! life of the process. A failed load is remembered, so later calls fail
//! fast instead of re-reading a broken artifact.
//!
//! Inputs are bound by name. Typed plans are specialised per batch shape
//! and cached, since the track count varies between jobs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tract_onnx::prelude::*;

use crate::error::{MlError, MlResult};
use crate::tensor::FeatureTensors;
use crate::{NUM_CHANNELS, OUTPUT_LEN};

/// Model input slot names
pub mod slots {
    pub const GENRE: &str = "genre";
    pub const TRACKS: &str = "tracks";
    pub const INSTRUMENTS: &str = "instruments";
    pub const VALID_MASK: &str = "valid_mask";

    /// Every slot the artifact must expose
    pub const ALL: [&str; 4] = [GENRE, TRACKS, INSTRUMENTS, VALID_MASK];
}

type TractPlan = tract_onnx::prelude::SimplePlan<
    tract_onnx::prelude::TypedFact,
    Box<dyn tract_onnx::prelude::TypedOp>,
    tract_onnx::prelude::Graph<
        tract_onnx::prelude::TypedFact,
        Box<dyn tract_onnx::prelude::TypedOp>,
    >,
>;

/// (track count, window length)
type PlanKey = (usize, usize);

/// Name and declared fact of one model input or output
#[derive(Debug, Clone, Serialize)]
pub struct SlotInfo {
    pub name: String,
    pub fact: String,
}

/// Model inputs and outputs as declared by the artifact
#[derive(Debug, Clone, Serialize)]
pub struct ModelSignature {
    pub inputs: Vec<SlotInfo>,
    pub outputs: Vec<SlotInfo>,
}

/// Parsed artifact plus its per-shape plans
struct LoadedModel {
    model: InferenceModel,
    input_names: Vec<String>,
    plans: Mutex<HashMap<PlanKey, Arc<TractPlan>>>,
}

impl LoadedModel {
    fn load(path: &Path) -> MlResult<Self> {
        if !path.exists() {
            return Err(MlError::ModelNotFound {
                path: path.display().to_string(),
            });
        }

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| MlError::ModelLoadFailed {
                reason: e.to_string(),
            })?;

        let input_names: Vec<String> = model
            .input_outlets()
            .map_err(|e| MlError::ModelLoadFailed {
                reason: e.to_string(),
            })?
            .iter()
            .map(|outlet| model.node(outlet.node).name.clone())
            .collect();

        for slot in slots::ALL {
            if !input_names.iter().any(|n| n == slot) {
                return Err(MlError::ModelLoadFailed {
                    reason: format!("model has no '{slot}' input (inputs: {input_names:?})"),
                });
            }
        }

        Ok(Self {
            model,
            input_names,
            plans: Mutex::new(HashMap::new()),
        })
    }

    fn plan(&self, num_tracks: usize, window_len: usize) -> MlResult<Arc<TractPlan>> {
        let key = (num_tracks, window_len);
        let mut plans = self.plans.lock();
        if let Some(plan) = plans.get(&key) {
            return Ok(plan.clone());
        }

        let mut model = self.model.clone();
        for (index, name) in self.input_names.iter().enumerate() {
            let fact: InferenceFact = match name.as_str() {
                slots::GENRE => i64::fact([1usize, 1]).into(),
                slots::TRACKS => f32::fact([1, num_tracks, NUM_CHANNELS, window_len]).into(),
                slots::INSTRUMENTS => i64::fact([1, num_tracks]).into(),
                slots::VALID_MASK => bool::fact([1, num_tracks]).into(),
                other => {
                    return Err(MlError::ModelLoadFailed {
                        reason: format!("unexpected model input '{other}'"),
                    });
                }
            };
            model = model.with_input_fact(index, fact).map_err(tract_err)?;
        }

        let plan = model
            .into_optimized()
            .map_err(tract_err)?
            .into_runnable()
            .map_err(tract_err)?;

        log::info!(
            "Built inference plan for {} tracks x {} samples",
            num_tracks,
            window_len
        );

        let plan = Arc::new(plan);
        plans.insert(key, plan.clone());
        Ok(plan)
    }

    fn signature(&self) -> MlResult<ModelSignature> {
        let describe = |outlets: &[OutletId]| -> MlResult<Vec<SlotInfo>> {
            outlets
                .iter()
                .map(|outlet| {
                    let fact = self.model.outlet_fact(*outlet).map_err(tract_err)?;
                    Ok(SlotInfo {
                        name: self.model.node(outlet.node).name.clone(),
                        fact: format!("{fact:?}"),
                    })
                })
                .collect()
        };

        Ok(ModelSignature {
            inputs: describe(self.model.input_outlets().map_err(tract_err)?)?,
            outputs: describe(self.model.output_outlets().map_err(tract_err)?)?,
        })
    }
}

enum ModelState {
    Unloaded,
    Ready(Arc<LoadedModel>),
    Unavailable(String),
}

/// Lazily-loaded mix model
pub struct InferenceEngine {
    model_path: PathBuf,
    state: Mutex<ModelState>,
}

impl InferenceEngine {
    /// Create an engine for the artifact at `model_path`. Nothing is read
    /// until the first inference.
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            state: Mutex::new(ModelState::Unloaded),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// True once the artifact has been parsed successfully
    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.lock(), ModelState::Ready(_))
    }

    /// True once a load attempt has failed
    pub fn is_unavailable(&self) -> bool {
        matches!(*self.state.lock(), ModelState::Unavailable(_))
    }

    fn loaded(&self) -> MlResult<Arc<LoadedModel>> {
        let mut state = self.state.lock();
        match &*state {
            ModelState::Ready(model) => return Ok(model.clone()),
            ModelState::Unavailable(reason) => {
                return Err(MlError::ModelUnavailable {
                    reason: reason.clone(),
                });
            }
            ModelState::Unloaded => {}
        }

        log::info!("Loading mix model {}", self.model_path.display());

        match LoadedModel::load(&self.model_path) {
            Ok(model) => {
                let model = Arc::new(model);
                *state = ModelState::Ready(model.clone());
                Ok(model)
            }
            Err(e) => {
                log::error!("Mix model unavailable: {}", e);
                *state = ModelState::Unavailable(e.to_string());
                Err(e)
            }
        }
    }

    /// Declared inputs and outputs of the artifact
    pub fn describe(&self) -> MlResult<ModelSignature> {
        self.loaded()?.signature()
    }

    /// Run one forward pass. Returns the first output flattened; it holds at
    /// least [`OUTPUT_LEN`] values.
    pub fn infer(&self, tensors: &FeatureTensors) -> MlResult<Vec<f32>> {
        let model = self.loaded()?;
        let plan = model.plan(tensors.num_tracks(), tensors.window_len())?;

        let inputs: TVec<TValue> = model
            .input_names
            .iter()
            .map(|name| input_tensor(name, tensors).map(TValue::from))
            .collect::<MlResult<_>>()?;

        let outputs = plan.run(inputs).map_err(|e| MlError::InferenceFailed {
            reason: e.to_string(),
        })?;

        let first = outputs.first().ok_or_else(|| MlError::InferenceFailed {
            reason: "No output from model".into(),
        })?;

        let raw: Vec<f32> = first
            .to_array_view::<f32>()
            .map_err(tract_err)?
            .iter()
            .copied()
            .collect();

        if raw.len() < OUTPUT_LEN {
            return Err(MlError::InvalidOutputShape {
                expected: format!("at least {OUTPUT_LEN} values"),
                got: format!("{} values", raw.len()),
            });
        }

        Ok(raw)
    }
}

fn input_tensor(name: &str, tensors: &FeatureTensors) -> MlResult<Tensor> {
    match name {
        slots::GENRE => array_tensor(&tensors.genre),
        slots::TRACKS => array_tensor(&tensors.tracks),
        slots::INSTRUMENTS => array_tensor(&tensors.instruments),
        slots::VALID_MASK => array_tensor(&tensors.valid_mask),
        other => Err(MlError::InferenceFailed {
            reason: format!("no tensor for model input '{other}'"),
        }),
    }
}

/// Copy a standard-layout ndarray into a tract tensor
fn array_tensor<T, D>(array: &ndarray::Array<T, D>) -> MlResult<Tensor>
where
    T: Datum + Copy,
    D: ndarray::Dimension,
{
    let data = array.as_slice().ok_or_else(|| MlError::InvalidInputShape {
        expected: "contiguous tensor".into(),
        got: format!("strided tensor {:?}", array.shape()),
    })?;
    Tensor::from_shape(array.shape(), data).map_err(tract_err)
}

fn tract_err(e: TractError) -> MlError {
    MlError::TractError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::write_mix_model;
    use crate::tensor::{FeatureTensorBuilder, StemInput};

    const WINDOW: usize = 32;

    /// `num_tracks` stems filled with `value`
    fn tensors(num_tracks: usize, value: f32) -> FeatureTensors {
        let samples = vec![value; WINDOW];
        let stems: Vec<StemInput<'_>> = (0..num_tracks)
            .map(|_| StemInput {
                left: &samples,
                right: &samples,
                instrument: "Vocal_Lead",
            })
            .collect();
        FeatureTensorBuilder::new(WINDOW).build("Pop", &stems).unwrap()
    }

    fn engine_with_output(dir: &Path, base: &[f32]) -> InferenceEngine {
        let path = dir.join("AImix_model.onnx");
        write_mix_model(&path, base).unwrap();
        InferenceEngine::new(path)
    }

    #[test]
    fn test_engine_is_lazy() {
        let engine = InferenceEngine::new("/nonexistent/AImix_model.onnx");
        assert!(!engine.is_loaded());
        assert!(!engine.is_unavailable());
    }

    #[test]
    fn test_missing_model_is_cached_as_unavailable() {
        let engine = InferenceEngine::new("/nonexistent/AImix_model.onnx");

        let first = engine.describe().unwrap_err();
        assert!(matches!(first, MlError::ModelNotFound { .. }));
        assert!(engine.is_unavailable());

        let second = engine.describe().unwrap_err();
        assert!(matches!(second, MlError::ModelUnavailable { .. }));
        assert!(second.is_load_error());
    }

    #[test]
    fn test_malformed_model_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AImix_model.onnx");
        std::fs::write(&path, b"this is not a protobuf").unwrap();

        let engine = InferenceEngine::new(&path);
        let err = engine.describe().unwrap_err();
        assert!(err.is_load_error(), "{err}");

        // Fixing the file doesn't matter, the failure sticks
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            engine.describe().unwrap_err(),
            MlError::ModelUnavailable { .. }
        ));
    }

    #[test]
    fn test_array_tensor_keeps_shape() {
        let array = ndarray::Array2::from_shape_vec((1, 3), vec![1i64, 2, 3]).unwrap();
        let tensor = array_tensor(&array).unwrap();
        assert_eq!(tensor.shape(), &[1, 3]);
        assert_eq!(tensor.as_slice::<i64>().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_infer_returns_model_output() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_output(dir.path(), &[0.5; OUTPUT_LEN]);
        assert_eq!(engine.model_path(), dir.path().join("AImix_model.onnx"));

        let raw = engine.infer(&tensors(3, 0.1)).unwrap();
        assert!(engine.is_loaded());
        assert_eq!(raw.len(), OUTPUT_LEN);
        for v in raw {
            approx::assert_relative_eq!(v, 0.6, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_plans_are_cached_per_track_count() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_output(dir.path(), &[0.0; OUTPUT_LEN]);

        engine.infer(&tensors(2, 0.25)).unwrap();
        engine.infer(&tensors(2, -0.25)).unwrap();
        assert_eq!(engine.loaded().unwrap().plans.lock().len(), 1);

        let raw = engine.infer(&tensors(5, -0.25)).unwrap();
        approx::assert_relative_eq!(raw[0], -0.25, epsilon = 1e-5);
        assert_eq!(engine.loaded().unwrap().plans.lock().len(), 2);
    }

    #[test]
    fn test_short_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_output(dir.path(), &[0.5; 4]);

        let err = engine.infer(&tensors(2, 0.0)).unwrap_err();
        assert!(matches!(err, MlError::InvalidOutputShape { .. }), "{err}");
        assert!(!err.is_load_error());
    }

    #[test]
    fn test_describe_lists_declared_slots() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_output(dir.path(), &[0.0; OUTPUT_LEN]);

        let signature = engine.describe().unwrap();
        let inputs: Vec<&str> = signature.inputs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(inputs, slots::ALL);
        assert_eq!(signature.outputs.len(), 1);
    }
}
