use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::analysis::aggregator::{aggregate, DetectionResult};
use crate::analysis::features::{extract_all, FeaturedRecord};
use crate::config::DetectionConfig;
use crate::detect::{DetectError, OutlierDetector, SpikeDetector};
use crate::parse::parse_log;

/// Everything one run produced. Owned by the caller; nothing is cached
/// between runs.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub records: Vec<FeaturedRecord>,
    pub skipped_lines: usize,
    pub result: DetectionResult,
    pub model_name: &'static str,
}

/// Run the full pipeline over raw log text:
/// 1. Parse lines into records
/// 2. Derive features
/// 3. Run the spike rule and the outlier model independently
/// 4. Aggregate
pub fn analyze_text(text: &str, config: &DetectionConfig) -> Result<Analysis, DetectError> {
    config.validate()?;

    let parsed = parse_log(text, config.strict_levels)?;
    if parsed.skipped > 0 {
        warn!(skipped = parsed.skipped, "skipped malformed log lines");
    }
    let records = extract_all(parsed.records);

    let spikes = SpikeDetector::new(config.window_size_seconds, config.spike_threshold).detect(&records);
    let outliers = OutlierDetector::from_config(config);
    let verdicts = outliers.detect(&records);

    let result = aggregate(&records, spikes, verdicts, config.window_size_seconds);
    info!(
        records = result.total_records,
        spikes = result.spike_anomalies.len(),
        outliers = result.outlier_anomalies.len(),
        "analysis complete"
    );

    Ok(Analysis {
        records,
        skipped_lines: parsed.skipped,
        result,
        model_name: outliers.model_name(),
    })
}

pub fn analyze_file(path: &Path, config: &DetectionConfig) -> Result<Analysis> {
    info!(path = %path.display(), "analyzing log file");
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read log file: {}", path.display()))?;
    analyze_text(&text, config).with_context(|| format!("failed to analyze {}", path.display()))
}
