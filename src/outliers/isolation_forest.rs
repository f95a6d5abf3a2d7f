//! Isolation-forest anomaly scoring.
//!
//! Rows are scored by how quickly random axis-aligned splits isolate them.
//! Scores follow the decision-function convention: lower means more
//! anomalous, with normal points sitting near or above zero. The scorer is
//! contamination-free; the cutoff is chosen downstream from the score
//! distribution itself.

use ndarray::Array2;
use rand::prelude::*;

/// Euler-Mascheroni constant, used in the average path length estimate.
const EULER_GAMMA: f64 = 0.577_215_664_9;

/// A single isolation tree.
#[derive(Debug, Clone)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        size: usize,
    },
}

impl TreeNode {
    /// Grow a tree over `indices` by recursive random splits.
    fn grow(
        matrix: &Array2<f64>,
        indices: &[usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> Self {
        let n_rows = indices.len();
        if depth >= max_depth || n_rows <= 1 {
            return TreeNode::Leaf { size: n_rows };
        }

        let feature = rng.gen_range(0..matrix.ncols());
        let values: Vec<f64> = indices.iter().map(|&i| matrix[[i, feature]]).collect();
        let min_val = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_val = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        if !min_val.is_finite() || !max_val.is_finite() || (max_val - min_val).abs() < 1e-12 {
            return TreeNode::Leaf { size: n_rows };
        }

        let threshold = rng.gen_range(min_val..max_val);
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| matrix[[i, feature]] < threshold);

        if left_idx.is_empty() || right_idx.is_empty() {
            return TreeNode::Leaf { size: n_rows };
        }

        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(Self::grow(matrix, &left_idx, depth + 1, max_depth, rng)),
            right: Box::new(Self::grow(matrix, &right_idx, depth + 1, max_depth, rng)),
        }
    }

    /// Path length from the root to the leaf holding `row`.
    fn path_length(&self, row: &[f64], depth: usize) -> f64 {
        match self {
            TreeNode::Leaf { size } => depth as f64 + average_path_length(*size),
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] < *threshold {
                    left.path_length(row, depth + 1)
                } else {
                    right.path_length(row, depth + 1)
                }
            }
        }
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

/// Ensemble of isolation trees with deterministic construction.
#[derive(Debug)]
pub struct IsolationScorer {
    trees: Vec<TreeNode>,
    subsample_size: usize,
}

impl IsolationScorer {
    /// Fit `n_trees` trees, each grown on a shuffled subsample of
    /// `sample_fraction` of the rows (at least one).
    pub fn fit(matrix: &Array2<f64>, n_trees: usize, sample_fraction: f64, seed: u64) -> Self {
        let n_rows = matrix.nrows();
        let subsample_size = ((n_rows as f64 * sample_fraction).round() as usize)
            .clamp(1, n_rows.max(1));
        let max_depth = (subsample_size as f64).log2().ceil().max(1.0) as usize;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(n_trees);
        for _ in 0..n_trees {
            let mut indices: Vec<usize> = (0..n_rows).collect();
            indices.shuffle(&mut rng);
            indices.truncate(subsample_size);
            trees.push(TreeNode::grow(matrix, &indices, 0, max_depth, &mut rng));
        }

        Self {
            trees,
            subsample_size,
        }
    }

    /// Decision score per row: `0.5 - 2^(-E[h(x)] / c(n))`.
    ///
    /// Lower is more anomalous; a clearly isolated row goes negative.
    pub fn decision_scores(&self, matrix: &Array2<f64>) -> Vec<f64> {
        let c_n = average_path_length(self.subsample_size).max(1.0);

        matrix
            .rows()
            .into_iter()
            .map(|row| {
                let sample: Vec<f64> = row.iter().copied().collect();
                let avg_path: f64 = self
                    .trees
                    .iter()
                    .map(|tree| tree.path_length(&sample, 0))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                0.5 - 2.0_f64.powf(-avg_path / c_n)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outlier() -> Array2<f64> {
        // 40 points in a tight grid plus one far-away row.
        let mut data = Vec::new();
        for i in 0..40 {
            data.push((i % 8) as f64);
            data.push((i / 8) as f64);
        }
        data.extend_from_slice(&[120.0, -90.0]);
        Array2::from_shape_vec((41, 2), data).unwrap()
    }

    #[test]
    fn test_outlier_scores_lower_than_inliers() {
        let matrix = cluster_with_outlier();
        let scorer = IsolationScorer::fit(&matrix, 100, 0.5, 1021);
        let scores = scorer.decision_scores(&matrix);

        let inlier_min = scores[..40]
            .iter()
            .cloned()
            .fold(f64::INFINITY, f64::min);
        assert!(
            scores[40] < inlier_min,
            "outlier score {} should be below inlier minimum {}",
            scores[40],
            inlier_min
        );
    }

    #[test]
    fn test_scores_deterministic_under_seed() {
        let matrix = cluster_with_outlier();
        let a = IsolationScorer::fit(&matrix, 50, 0.5, 7).decision_scores(&matrix);
        let b = IsolationScorer::fit(&matrix, 50, 0.5, 7).decision_scores(&matrix);
        assert_eq!(a, b);
    }

    #[test]
    fn test_average_path_length_small_values() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > average_path_length(16));
    }

    #[test]
    fn test_constant_matrix_scores_are_uniform() {
        let matrix = Array2::from_elem((10, 3), 5.0);
        let scorer = IsolationScorer::fit(&matrix, 20, 0.5, 1);
        let scores = scorer.decision_scores(&matrix);
        for s in &scores[1..] {
            assert!((s - scores[0]).abs() < 1e-12);
        }
    }
}
