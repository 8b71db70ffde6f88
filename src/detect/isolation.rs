//! Isolation forest outlier model.
//!
//! Points that are easy to isolate with random axis-aligned splits end up
//! with short average path lengths and high anomaly scores. The decision
//! boundary is placed at the `contamination` quantile of the scores, so the
//! number of flagged records scales with the dataset.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use crate::analysis::features::FeatureVector;
use crate::config::DetectionConfig;
use crate::detect::outlier::OutlierModel;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
pub struct IsolationForest {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn build(data: &[FeatureVector], sample: Vec<usize>, height_limit: usize, rng: &mut StdRng) -> Self {
        Self {
            root: grow(data, sample, 0, height_limit, rng),
        }
    }

    fn path_length(&self, x: &FeatureVector) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] < *threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

fn grow(
    data: &[FeatureVector],
    rows: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Only features that still vary inside this node can split it.
    let mut candidates: Vec<(usize, f64, f64)> = Vec::with_capacity(2);
    for feature in 0..2 {
        let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
            let v = data[r][feature];
            (lo.min(v), hi.max(v))
        });
        if hi > lo {
            candidates.push((feature, lo, hi));
        }
    }
    if candidates.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
    let threshold = rng.gen_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) =
        rows.into_iter().partition(|&r| data[r][feature] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(data, left, depth + 1, height_limit, rng)),
        right: Box::new(grow(data, right, depth + 1, height_limit, rng)),
    }
}

/// Expected path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile of an ascending slice, `q` in `[0, 1]`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

impl IsolationForest {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_samples: config.max_samples,
            contamination: config.contamination,
            seed: config.random_seed,
        }
    }

    /// Anomaly score in `(0, 1]` per row; higher is more anomalous.
    pub fn score_samples(&self, data: &[FeatureVector]) -> Vec<f64> {
        let n = data.len();
        if n < 2 {
            return vec![0.0; n];
        }

        let psi = self.max_samples.min(n).max(2);
        let height_limit = (psi as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let trees: Vec<IsolationTree> = (0..self.n_estimators.max(1))
            .map(|_| {
                let sample = index::sample(&mut rng, n, psi).into_vec();
                IsolationTree::build(data, sample, height_limit, &mut rng)
            })
            .collect();

        let norm = average_path_length(psi);
        data.iter()
            .map(|x| {
                let mean_depth =
                    trees.iter().map(|t| t.path_length(x)).sum::<f64>() / trees.len() as f64;
                2f64.powf(-mean_depth / norm)
            })
            .collect()
    }
}

impl OutlierModel for IsolationForest {
    fn name(&self) -> &'static str {
        "Isolation Forest"
    }

    fn fit_predict(&self, data: &[FeatureVector]) -> Vec<bool> {
        if data.len() < 2 {
            return vec![false; data.len()];
        }

        // Work on negated scores (lower = more anomalous) and flag everything
        // strictly below the contamination quantile. Ties at the boundary stay
        // normal, so heavily duplicated data can yield fewer anomalies.
        let negated: Vec<f64> = self.score_samples(data).into_iter().map(|s| -s).collect();
        let mut sorted = negated.clone();
        sorted.sort_by(f64::total_cmp);
        let offset = quantile(&sorted, self.contamination.clamp(0.0, 1.0));

        negated.into_iter().map(|s| s < offset).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varied(n: usize) -> Vec<FeatureVector> {
        (0..n)
            .map(|i| [(1 + i % 4) as f64, (20 + (i * 37) % 61) as f64])
            .collect()
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let c256 = average_path_length(256);
        assert!(c256 > 10.0 && c256 < 11.0);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [0.0, 10.0, 20.0, 30.0, 40.0];
        assert_eq!(quantile(&sorted, 0.0), 0.0);
        assert_eq!(quantile(&sorted, 1.0), 40.0);
        assert!((quantile(&sorted, 0.1) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_isolates_obvious_outlier() {
        let mut data: Vec<FeatureVector> = (0..99).map(|i| [1.0, (20 + i % 10) as f64]).collect();
        data.push([4.0, 500.0]);
        let labels = IsolationForest::default().fit_predict(&data);
        assert!(labels[99], "the long CRITICAL row must be flagged");
        let count = labels.iter().filter(|&&a| a).count();
        assert!(count <= 10, "flagged {} of 100", count);
    }

    #[test]
    fn test_contamination_scales_with_size() {
        for n in [50usize, 200, 400] {
            let labels = IsolationForest::default().fit_predict(&varied(n));
            let count = labels.iter().filter(|&&a| a).count();
            let upper = (0.1 * (n - 1) as f64).ceil() as usize;
            assert!(count >= 1 && count <= upper, "n={} flagged {}", n, count);
        }
    }

    #[test]
    fn test_flagged_count_tracks_contamination() {
        // 200 distinct rows, so scores do not tie at the boundary.
        let data = varied(200);
        for contamination in [0.05, 0.1, 0.2] {
            let forest = IsolationForest {
                contamination,
                ..Default::default()
            };
            let count = forest.fit_predict(&data).iter().filter(|&&a| a).count();
            let expected = contamination * data.len() as f64;
            assert!(
                (count as f64 - expected).abs() <= 1.0,
                "contamination {} flagged {}, expected ~{}",
                contamination,
                count,
                expected
            );
        }
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let data = varied(300);
        let forest = IsolationForest::default();
        assert_eq!(forest.fit_predict(&data), forest.fit_predict(&data));
        assert_eq!(forest.score_samples(&data), forest.score_samples(&data));
    }

    #[test]
    fn test_degenerate_inputs() {
        let forest = IsolationForest::default();
        assert!(forest.fit_predict(&[]).is_empty());
        assert_eq!(forest.fit_predict(&[[1.0, 10.0]]), vec![false]);
        // Identical rows cannot be separated, so nothing is below the boundary.
        let same = vec![[3.0, 12.0]; 20];
        assert!(forest.fit_predict(&same).iter().all(|a| !a));
    }
}
