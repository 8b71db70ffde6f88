use crate::analysis::features::FeatureVector;
use crate::detect::outlier::OutlierModel;

/// Population statistics over one feature column.
pub struct TimeSeries {
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn variance(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        self.values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / self.values.len() as f64
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Z = (value - mean) / std_dev. A constant column scores 0 for every
    /// value, so it never flags anything.
    pub fn z_score(&self, value: f64) -> f64 {
        let std = self.std_dev();
        if std <= f64::EPSILON {
            return 0.0;
        }
        (value - self.mean()) / std
    }
}

/// Flags rows where any feature is more than `threshold` standard
/// deviations from the run's mean.
#[derive(Debug, Clone)]
pub struct ZScoreModel {
    pub threshold: f64,
}

impl ZScoreModel {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl OutlierModel for ZScoreModel {
    fn name(&self) -> &'static str {
        "Z-Score"
    }

    fn fit_predict(&self, data: &[FeatureVector]) -> Vec<bool> {
        let columns: Vec<TimeSeries> = (0..2)
            .map(|f| TimeSeries::new(data.iter().map(|row| row[f]).collect()))
            .collect();

        data.iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row)
                    .any(|(col, &v)| col.z_score(v).abs() > self.threshold)
            })
            .collect()
    }
}
