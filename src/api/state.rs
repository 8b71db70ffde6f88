use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::analysis::{analyze_file, Analysis};
use crate::config::DetectionConfig;

/// Shared, read-only request context. Holds inputs only; every request runs
/// its own analysis, so no fitted model outlives a request.
#[derive(Clone)]
pub struct AppState {
    pub log_file: Arc<PathBuf>,
    pub report_dir: Arc<PathBuf>,
    pub detection: Arc<DetectionConfig>,
}

impl AppState {
    pub fn new(log_file: PathBuf, report_dir: PathBuf, detection: DetectionConfig) -> Self {
        Self {
            log_file: Arc::new(log_file),
            report_dir: Arc::new(report_dir),
            detection: Arc::new(detection),
        }
    }

    /// Fresh analysis of the configured log file on a blocking thread.
    pub async fn run_analysis(&self) -> Result<Analysis> {
        let path = self.log_file.clone();
        let config = self.detection.clone();
        tokio::task::spawn_blocking(move || analyze_file(&path, &config)).await?
    }
}
