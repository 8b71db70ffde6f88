//! Feature derivation, result aggregation and the end-to-end pipeline.

pub mod aggregator;
pub mod features;
pub mod runner;

pub use aggregator::{AnomalyEntry, DetectionReport, DetectionResult};
pub use features::{FeatureVector, FeaturedRecord};
pub use runner::{analyze_file, analyze_text, Analysis};
