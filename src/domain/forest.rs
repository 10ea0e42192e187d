//! Random forest binary classifier (CART trees, gini impurity).
//!
//! Each tree is grown on a bootstrap sample and considers `ceil(sqrt(d))`
//! randomly chosen features at every split. Tree `i` draws from a ChaCha8
//! stream seeded with `seed + i`, so a fit is a pure function of its inputs
//! and the seed regardless of how the trees are scheduled across threads.

use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        prob_up: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn prob_up(&self, row: &[f64]) -> f64 {
        match self {
            Node::Leaf { prob_up } => *prob_up,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.prob_up(row)
                } else {
                    right.prob_up(row)
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<Node>,
    n_features: usize,
}

impl RandomForest {
    /// Fit on `rows` (all the same width) with boolean labels.
    /// Returns `None` for an empty or ragged training set.
    pub fn fit(rows: &[Vec<f64>], labels: &[bool], config: &ForestConfig) -> Option<Self> {
        let n_features = rows.first()?.len();
        if n_features == 0
            || rows.len() != labels.len()
            || rows.iter().any(|r| r.len() != n_features)
            || config.n_trees == 0
        {
            return None;
        }
        let max_features = ((n_features as f64).sqrt().ceil() as usize).clamp(1, n_features);

        let trees = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(i as u64));
                let indices: Vec<usize> = (0..rows.len())
                    .map(|_| rng.gen_range(0..rows.len()))
                    .collect();
                let grower = Grower {
                    rows,
                    labels,
                    config,
                    max_features,
                };
                grower.grow(indices, 0, &mut rng)
            })
            .collect();

        Some(Self { trees, n_features })
    }

    /// Mean of the per-tree leaf probabilities that the label is `true`.
    pub fn predict_proba(&self, row: &[f64]) -> Option<f64> {
        if row.len() != self.n_features || self.trees.is_empty() {
            return None;
        }
        let sum: f64 = self.trees.iter().map(|t| t.prob_up(row)).sum();
        Some(sum / self.trees.len() as f64)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

struct Grower<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [bool],
    config: &'a ForestConfig,
    max_features: usize,
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl Grower<'_> {
    fn grow(&self, indices: Vec<usize>, depth: usize, rng: &mut ChaCha8Rng) -> Node {
        let ups = indices.iter().filter(|&&i| self.labels[i]).count();
        let n = indices.len();
        let prob_up = if n == 0 { 0.5 } else { ups as f64 / n as f64 };

        if depth >= self.config.max_depth
            || n < self.config.min_samples_split
            || ups == 0
            || ups == n
        {
            return Node::Leaf { prob_up };
        }

        match self.best_split(&indices, rng) {
            Some(split) => Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: Box::new(self.grow(split.left, depth + 1, rng)),
                right: Box::new(self.grow(split.right, depth + 1, rng)),
            },
            None => Node::Leaf { prob_up },
        }
    }

    fn best_split(&self, indices: &[usize], rng: &mut ChaCha8Rng) -> Option<SplitChoice> {
        let n_features = self.rows[0].len();
        let candidates = sample(rng, n_features, self.max_features);
        let total = indices.len() as f64;
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut best: Option<(f64, usize, f64)> = None;
        for feature in candidates.iter() {
            let mut sorted: Vec<(f64, bool)> = indices
                .iter()
                .map(|&i| (self.rows[i][feature], self.labels[i]))
                .collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let total_up = sorted.iter().filter(|s| s.1).count() as f64;
            let mut left_up = 0.0;
            for k in 1..sorted.len() {
                if sorted[k - 1].1 {
                    left_up += 1.0;
                }
                if sorted[k - 1].0 == sorted[k].0 || k < min_leaf || sorted.len() - k < min_leaf {
                    continue;
                }
                let left_n = k as f64;
                let right_n = total - left_n;
                let impurity = (left_n * gini(left_up, left_n)
                    + right_n * gini(total_up - left_up, right_n))
                    / total;
                if best.is_none_or(|(b, _, _)| impurity < b) {
                    let threshold = (sorted[k - 1].0 + sorted[k].0) / 2.0;
                    best = Some((impurity, feature, threshold));
                }
            }
        }

        let (_, feature, threshold) = best?;
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.rows[i][feature] <= threshold);
        Some(SplitChoice {
            feature,
            threshold,
            left,
            right,
        })
    }
}

fn gini(ups: f64, n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    let p = ups / n;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}
