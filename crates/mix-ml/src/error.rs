//! Error types for mix-model processing

use thiserror::Error;

/// ML processing error types
#[derive(Error, Debug, Clone)]
pub enum MlError {
    /// Model file not found
    #[error("Model not found: {path}")]
    ModelNotFound { path: String },

    /// Model loading failed
    #[error("Failed to load model: {reason}")]
    ModelLoadFailed { reason: String },

    /// An earlier load failed; the artifact is not retried
    #[error("Model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    /// Inference failed
    #[error("Inference failed: {reason}")]
    InferenceFailed { reason: String },

    /// Invalid input shape
    #[error("Invalid input shape: expected {expected}, got {got}")]
    InvalidInputShape { expected: String, got: String },

    /// Invalid output shape
    #[error("Invalid output shape: expected {expected}, got {got}")]
    InvalidOutputShape { expected: String, got: String },

    /// Tract error
    #[error("Tract error: {0}")]
    TractError(String),
}

impl MlError {
    /// The artifact could not be loaded (missing, malformed or cached failure)
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound { .. } | Self::ModelLoadFailed { .. } | Self::ModelUnavailable { .. }
        )
    }

    /// Tensors were rejected before reaching the model
    pub fn is_shape_error(&self) -> bool {
        matches!(self, Self::InvalidInputShape { .. })
    }
}

/// Result type for ML operations
pub type MlResult<T> = Result<T, MlError>;
