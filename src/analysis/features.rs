//! Per-record feature derivation.

use serde::Serialize;

use crate::parse::{Level, LogRecord};

/// Model input per record: `(level_score, message_length)`.
pub type FeatureVector = [f64; 2];

/// A [`LogRecord`] with its derived numeric features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeaturedRecord {
    #[serde(flatten)]
    pub record: LogRecord,
    pub level_score: u8,
    pub message_length: usize,
}

impl FeaturedRecord {
    pub fn level(&self) -> Level {
        self.record.level
    }

    pub fn to_vector(&self) -> FeatureVector {
        [self.level_score as f64, self.message_length as f64]
    }
}

/// Derive features for one record. Pure: the same record always yields the
/// same output.
///
/// `Level` is a closed enum, so the score lookup cannot fail here; unknown
/// level names are rejected by the parser.
pub fn extract(record: LogRecord) -> FeaturedRecord {
    let level_score = record.level.score();
    // Characters, not bytes. The parser has already dropped the line terminator.
    let message_length = record
        .message
        .trim_end_matches(['\r', '\n'])
        .chars()
        .count();
    FeaturedRecord {
        record,
        level_score,
        message_length,
    }
}

pub fn extract_all(records: Vec<LogRecord>) -> Vec<FeaturedRecord> {
    records.into_iter().map(extract).collect()
}
