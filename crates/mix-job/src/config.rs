//! Job configuration

use std::path::PathBuf;
use std::time::Duration;

use mix_ml::models;
use serde::{Deserialize, Serialize};

/// Mix job configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Directory scanned for stems
    pub samples_dir: PathBuf,

    /// ONNX mix model. The preset backend is used if it doesn't exist.
    pub model_path: PathBuf,

    /// Wall-clock limit per job (None = unlimited)
    pub job_timeout_secs: Option<u64>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            samples_dir: PathBuf::from("downloads"),
            model_path: PathBuf::from(models::MIX_MODEL),
            job_timeout_secs: Some(600),
        }
    }
}

impl JobConfig {
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }

    /// Set sample directory
    pub fn with_samples_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.samples_dir = dir.into();
        self
    }

    /// Set model path
    pub fn with_model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.model_path = path.into();
        self
    }

    /// Set job timeout
    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.job_timeout_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JobConfig::default();
        assert_eq!(config.samples_dir, PathBuf::from("downloads"));
        assert_eq!(config.model_path, PathBuf::from("AImix_model.onnx"));
        assert_eq!(config.job_timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: JobConfig = serde_json::from_str(r#"{"samples_dir": "stems"}"#).unwrap();
        assert_eq!(config.samples_dir, PathBuf::from("stems"));
        assert_eq!(config.job_timeout_secs, Some(600));

        let config: JobConfig = serde_json::from_str(r#"{"job_timeout_secs": null}"#).unwrap();
        assert_eq!(config.job_timeout(), None);
    }
}
