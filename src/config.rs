//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. The file is located via an explicit path, the
//! `LOGTRIAGE_CONFIG` environment variable, or `./logtriage.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::detect::DetectError;

pub const CONFIG_ENV: &str = "LOGTRIAGE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "logtriage.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.detection.validate()?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// An explicit path must load. Otherwise try `LOGTRIAGE_CONFIG`, then
    /// `./logtriage.toml`, then fall back to defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "{} set but file could not be loaded, trying fallback",
                        CONFIG_ENV
                    );
                }
            }
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load(local);
        }

        debug!("no config file found, using compiled-in defaults");
        Ok(Self::default())
    }
}

/// Which outlier model backs the statistical detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    IsolationForest,
    ZScore,
}

/// Options for both detectors. Shared by every entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Width of the ERROR spike bucket.
    pub window_size_seconds: u32,
    /// A bucket is a spike when its ERROR count is strictly above this.
    pub spike_threshold: usize,
    /// Expected anomalous share of the dataset, in `(0, 0.5]`.
    pub contamination: f64,
    pub random_seed: u64,
    pub n_estimators: usize,
    pub max_samples: usize,
    pub model: ModelKind,
    /// Only used by the z-score model.
    pub z_threshold: f64,
    /// Abort on unknown level names instead of skipping the line.
    pub strict_levels: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            window_size_seconds: 30,
            spike_threshold: 3,
            contamination: 0.1,
            random_seed: 42,
            n_estimators: 100,
            max_samples: 256,
            model: ModelKind::IsolationForest,
            z_threshold: 3.0,
            strict_levels: false,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.window_size_seconds == 0 {
            return Err(DetectError::InvalidConfig(
                "window_size_seconds must be greater than 0".into(),
            ));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(DetectError::InvalidConfig(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        if self.n_estimators == 0 || self.max_samples == 0 {
            return Err(DetectError::InvalidConfig(
                "n_estimators and max_samples must be greater than 0".into(),
            ));
        }
        if !(self.z_threshold > 0.0) {
            return Err(DetectError::InvalidConfig(format!(
                "z_threshold must be positive, got {}",
                self.z_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Log file analyzed on every dashboard request.
    pub log_file: PathBuf,
    /// Directory served for paths that match no route.
    pub report_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            log_file: PathBuf::from("error_logs.txt"),
            report_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.detection.window_size_seconds, 30);
        assert_eq!(cfg.detection.spike_threshold, 3);
        assert_eq!(cfg.detection.contamination, 0.1);
        assert_eq!(cfg.detection.random_seed, 42);
        assert_eq!(cfg.detection.model, ModelKind::IsolationForest);
        assert!(cfg.detection.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [detection]
            spike_threshold = 5
            model = "z_score"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.detection.spike_threshold, 5);
        assert_eq!(cfg.detection.window_size_seconds, 30);
        assert_eq!(cfg.detection.model, ModelKind::ZScore);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.server.bind, "0.0.0.0:8000");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = DetectionConfig {
            window_size_seconds: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(DetectError::InvalidConfig(_))));

        cfg.window_size_seconds = 30;
        for bad in [0.0, -0.1, 0.75, f64::NAN] {
            cfg.contamination = bad;
            assert!(cfg.validate().is_err(), "contamination {} accepted", bad);
        }
        cfg.contamination = 0.5;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_and_reject_invalid() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "[detection]\nwindow_size_seconds = 60").unwrap();
        let cfg = AppConfig::resolve(Some(good.path())).unwrap();
        assert_eq!(cfg.detection.window_size_seconds, 60);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "[detection]\ncontamination = 0.9").unwrap();
        assert!(AppConfig::load(bad.path()).is_err());
    }
}
