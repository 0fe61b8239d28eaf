use mix_job::JobConfig;
use serde::Deserialize;
use std::{
    fs, io,
    net::{AddrParseError, SocketAddr},
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const CONFIG_FILE: &str = "automix.config.json";
pub const CONFIG_ENV: &str = "AUTOMIX_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid listen_addr '{addr}': {source}")]
    ListenAddr {
        addr: String,
        source: AddrParseError,
    },

    #[error("Cannot determine working directory: {0}")]
    WorkingDir(io::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    pub listen_addr: String,
    #[serde(flatten)]
    pub job: JobConfig,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3001".to_string(),
            job: JobConfig::default(),
        }
    }
}

impl MixConfig {
    /// `AUTOMIX_CONFIG`, then `./automix.config.json`, then defaults
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(p) = std::env::var(CONFIG_ENV) {
            return Self::load_from_path(Path::new(&p));
        }

        let cwd = std::env::current_dir().map_err(ConfigError::WorkingDir)?;
        let p1 = cwd.join(CONFIG_FILE);
        if p1.exists() {
            return Self::load_from_path(&p1);
        }

        Ok(Self::default())
    }

    pub fn load_from_path(cfg_path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(cfg_path).map_err(|source| ConfigError::Read {
            path: cfg_path.to_path_buf(),
            source,
        })?;
        let mut cfg: MixConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: cfg_path.to_path_buf(),
            source,
        })?;

        let base_dir = cfg_path.parent().unwrap_or_else(|| Path::new("."));
        cfg.job.samples_dir = base_dir.join(&cfg.job.samples_dir);
        cfg.job.model_path = base_dir.join(&cfg.job.model_path);

        Ok(cfg)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .parse()
            .map_err(|source| ConfigError::ListenAddr {
                addr: self.listen_addr.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = MixConfig::default();
        assert_eq!(cfg.listen_addr, "127.0.0.1:3001");
        assert_eq!(cfg.job.samples_dir, PathBuf::from("downloads"));
        assert_eq!(cfg.socket_addr().unwrap().port(), 3001);
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{"listen_addr": "0.0.0.0:9000", "samples_dir": "stems", "job_timeout_secs": null}"#,
        )
        .unwrap();

        let cfg = MixConfig::load_from_path(&path).unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:9000");
        assert_eq!(cfg.job.samples_dir, dir.path().join("stems"));
        assert_eq!(cfg.job.model_path, dir.path().join("AImix_model.onnx"));
        assert_eq!(cfg.job.job_timeout_secs, None);
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{"model_path": "/opt/models/mix.onnx"}"#).unwrap();

        let cfg = MixConfig::load_from_path(&path).unwrap();
        assert_eq!(cfg.job.model_path, PathBuf::from("/opt/models/mix.onnx"));
    }

    #[test]
    fn test_bad_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            MixConfig::load_from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            MixConfig::load_from_path(&dir.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));

        let cfg = MixConfig {
            listen_addr: "nowhere".into(),
            ..MixConfig::default()
        };
        assert!(matches!(cfg.socket_addr(), Err(ConfigError::ListenAddr { .. })));
    }
}
