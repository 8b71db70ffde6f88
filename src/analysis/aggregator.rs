//! Assemble detector outputs into one [`DetectionResult`].
//!
//! No inference happens here. The result is built once per run and handed
//! to the report and dashboard by value.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::analysis::features::FeaturedRecord;
use crate::detect::{AnomalyVerdict, SpikeWindow};
use crate::parse::{Level, DISPLAY_FORMAT};

#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub total_records: usize,
    pub spike_anomalies: Vec<SpikeWindow>,
    /// Only verdicts with `is_anomaly`, in input order.
    pub outlier_anomalies: Vec<AnomalyVerdict>,
    pub level_distribution: BTreeMap<Level, usize>,
    pub window_size_seconds: u32,
}

/// One entry of the `anomalies` array in [`DetectionReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnomalyEntry {
    Spike {
        time: String,
        count: usize,
        message: String,
    },
    Outlier {
        timestamp: String,
        level: Level,
        message: String,
    },
}

/// JSON shape consumed by the report and dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub total_logs: usize,
    pub anomalies: Vec<AnomalyEntry>,
    pub level_distribution: BTreeMap<String, usize>,
    pub anomaly_rate: f64,
}

pub fn aggregate(
    records: &[FeaturedRecord],
    spikes: Vec<SpikeWindow>,
    verdicts: Vec<AnomalyVerdict>,
    window_size_seconds: u32,
) -> DetectionResult {
    let mut level_distribution = BTreeMap::new();
    for r in records {
        *level_distribution.entry(r.level()).or_insert(0) += 1;
    }

    DetectionResult {
        total_records: records.len(),
        spike_anomalies: spikes,
        outlier_anomalies: verdicts.into_iter().filter(|v| v.is_anomaly).collect(),
        level_distribution,
        window_size_seconds,
    }
}

impl DetectionResult {
    /// Percentage of records flagged by the outlier model; 0 for empty input.
    pub fn anomaly_rate(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        self.outlier_anomalies.len() as f64 / self.total_records as f64 * 100.0
    }

    pub fn spike_entries(&self) -> Vec<AnomalyEntry> {
        self.spike_anomalies
            .iter()
            .map(|s| AnomalyEntry::Spike {
                time: s.window_start.format(DISPLAY_FORMAT).to_string(),
                count: s.error_count,
                message: format!(
                    "{} ERROR logs in {} seconds",
                    s.error_count, self.window_size_seconds
                ),
            })
            .collect()
    }

    pub fn outlier_entries(&self) -> Vec<AnomalyEntry> {
        self.outlier_anomalies
            .iter()
            .map(|v| AnomalyEntry::Outlier {
                timestamp: v.record.record.timestamp.format(DISPLAY_FORMAT).to_string(),
                level: v.record.level(),
                message: v.record.record.message.clone(),
            })
            .collect()
    }

    /// Outlier anomalies ordered by timestamp (stable for equal timestamps).
    pub fn outliers_by_time(&self) -> Vec<&AnomalyVerdict> {
        let mut sorted: Vec<&AnomalyVerdict> = self.outlier_anomalies.iter().collect();
        sorted.sort_by_key(|v| v.record.record.timestamp);
        sorted
    }

    pub fn level_counts(&self) -> BTreeMap<String, usize> {
        self.level_distribution
            .iter()
            .map(|(level, count)| (level.to_string(), *count))
            .collect()
    }

    pub fn report(&self) -> DetectionReport {
        let mut anomalies = self.spike_entries();
        anomalies.extend(self.outlier_entries());
        DetectionReport {
            total_logs: self.total_records,
            anomalies,
            level_distribution: self.level_counts(),
            anomaly_rate: self.anomaly_rate(),
        }
    }

    /// Rule-based view: spikes, distribution and the last ten records.
    pub fn basic_view(&self, records: &[FeaturedRecord]) -> Value {
        let recent: Vec<Value> = records
            .iter()
            .rev()
            .take(10)
            .rev()
            .map(|r| {
                json!({
                    "timestamp": r.record.timestamp.format(DISPLAY_FORMAT).to_string(),
                    "level": r.level(),
                    "message": r.record.message,
                })
            })
            .collect();

        json!({
            "anomalies": self.spike_entries(),
            "total_logs": self.total_records,
            "level_distribution": self.level_counts(),
            "recent_logs": recent,
        })
    }

    /// Model-based view: the first twenty outliers plus model metadata.
    pub fn model_view(&self, model_name: &str, contamination: f64) -> Value {
        let anomalies: Vec<AnomalyEntry> = self.outlier_entries().into_iter().take(20).collect();
        json!({
            "total_anomalies": self.outlier_anomalies.len(),
            "anomaly_percentage": (self.anomaly_rate() * 100.0).round() / 100.0,
            "anomalies": anomalies,
            "model_info": {
                "algorithm": model_name,
                "contamination": contamination,
                "features": ["log_level_score", "message_length"],
            },
        })
    }
}
