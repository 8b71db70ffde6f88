//! Fixed-window ERROR spike rule.
//!
//! Every ERROR record is bucketed by flooring its timestamp to a multiple of
//! the window size (measured from the Unix epoch). Buckets whose count is
//! strictly greater than the threshold are reported. Other levels are
//! ignored entirely.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::analysis::features::FeaturedRecord;
use crate::parse::Level;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpikeWindow {
    pub window_start: NaiveDateTime,
    pub error_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SpikeDetector {
    window_secs: i64,
    threshold: usize,
}

impl SpikeDetector {
    /// `window_secs` must be non-zero; `DetectionConfig::validate` enforces it.
    pub fn new(window_secs: u32, threshold: usize) -> Self {
        Self {
            window_secs: i64::from(window_secs.max(1)),
            threshold,
        }
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    pub fn floor(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let secs = ts.and_utc().timestamp();
        let floored = secs - secs.rem_euclid(self.window_secs);
        DateTime::from_timestamp(floored, 0)
            .map(|dt| dt.naive_utc())
            .unwrap_or(ts)
    }

    /// Sparse per-bucket ERROR counts, ascending by bucket start.
    pub fn error_counts(&self, records: &[FeaturedRecord]) -> BTreeMap<NaiveDateTime, usize> {
        let mut counts = BTreeMap::new();
        for r in records.iter().filter(|r| r.level() == Level::Error) {
            *counts.entry(self.floor(r.record.timestamp)).or_insert(0) += 1;
        }
        counts
    }

    /// Windows with `error_count > threshold`, ascending by `window_start`.
    pub fn detect(&self, records: &[FeaturedRecord]) -> Vec<SpikeWindow> {
        let counts = self.error_counts(records);
        debug!(buckets = counts.len(), threshold = self.threshold, "bucketed ERROR records");
        counts
            .into_iter()
            .filter(|&(_, count)| count > self.threshold)
            .map(|(window_start, error_count)| SpikeWindow {
                window_start,
                error_count,
            })
            .collect()
    }
}
