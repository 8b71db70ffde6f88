//! Anomaly detection: error-spike windows and feature-space outliers.

pub mod anomaly;
pub mod isolation;
pub mod outlier;
pub mod spike;

use thiserror::Error;

pub use outlier::{AnomalyVerdict, OutlierDetector, OutlierModel};
pub use spike::{SpikeDetector, SpikeWindow};

#[derive(Debug, Error)]
pub enum DetectError {
    /// A line had all four fields but its timestamp did not parse.
    #[error("line {line}: unparseable timestamp {input:?}: {source}")]
    Parse {
        line: usize,
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("unknown log level {0:?}")]
    UnknownLevel(String),

    #[error("invalid detection config: {0}")]
    InvalidConfig(String),
}
