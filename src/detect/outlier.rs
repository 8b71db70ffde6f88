//! Outlier detection over the `(level_score, message_length)` feature space.
//!
//! The statistical model is a capability behind [`OutlierModel`]; the
//! detector only wires records to verdicts and keeps input order.

use serde::Serialize;
use tracing::debug;

use crate::analysis::features::{FeatureVector, FeaturedRecord};
use crate::config::{DetectionConfig, ModelKind};
use crate::detect::anomaly::ZScoreModel;
use crate::detect::isolation::IsolationForest;

/// Unsupervised outlier model, refit from scratch on every call.
pub trait OutlierModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fit on `features` and return one verdict per row (`true` = anomaly),
    /// in input order.
    fn fit_predict(&self, features: &[FeatureVector]) -> Vec<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnomalyVerdict {
    pub record: FeaturedRecord,
    pub is_anomaly: bool,
}

pub struct OutlierDetector {
    model: Box<dyn OutlierModel>,
}

impl OutlierDetector {
    pub fn new(model: Box<dyn OutlierModel>) -> Self {
        Self { model }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        let model: Box<dyn OutlierModel> = match config.model {
            ModelKind::IsolationForest => Box::new(IsolationForest::from_config(config)),
            ModelKind::ZScore => Box::new(ZScoreModel::new(config.z_threshold)),
        };
        Self::new(model)
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn detect(&self, records: &[FeaturedRecord]) -> Vec<AnomalyVerdict> {
        if records.is_empty() {
            return Vec::new();
        }
        let features: Vec<FeatureVector> = records.iter().map(FeaturedRecord::to_vector).collect();
        let labels = self.model.fit_predict(&features);
        debug!(
            model = self.model.name(),
            rows = features.len(),
            anomalies = labels.iter().filter(|&&a| a).count(),
            "outlier model fitted"
        );
        records
            .iter()
            .zip(labels)
            .map(|(record, is_anomaly)| AnomalyVerdict {
                record: record.clone(),
                is_anomaly,
            })
            .collect()
    }
}
