//! Seeded random forest (bagged Gini decision trees) over TF-IDF features.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::TriageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(Vec<f64>),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn leaf_for(&self, x: &[f64]) -> &[f64] {
        let mut node = self;
        loop {
            match node {
                Node::Leaf(distribution) => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = x.get(*feature).copied().unwrap_or(0.0);
                    node = if value <= *threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct TreeBuilder<'a> {
    samples: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    n_features: usize,
    max_features: usize,
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|c| {
            let p = *c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

impl TreeBuilder<'_> {
    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &row in rows {
            counts[self.labels[row]] += 1;
        }
        counts
    }

    fn grow(&self, rows: &[usize], rng: &mut ChaCha8Rng) -> Node {
        let counts = self.class_counts(rows);
        let distribution: Vec<f64> = counts
            .iter()
            .map(|c| *c as f64 / rows.len() as f64)
            .collect();
        if counts.iter().filter(|c| **c > 0).count() <= 1 {
            return Node::Leaf(distribution);
        }

        let Some(split) = self.best_split(rows, &counts, rng) else {
            return Node::Leaf(distribution);
        };
        let (left, right): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&row| self.samples[row][split.feature] <= split.threshold);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.grow(&left, rng)),
            right: Box::new(self.grow(&right, rng)),
        }
    }

    /// Draws features in random order until `max_features` non-constant
    /// ones have been evaluated, keeping the lowest weighted Gini impurity.
    fn best_split(&self, rows: &[usize], counts: &[usize], rng: &mut ChaCha8Rng) -> Option<Split> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);

        let total = rows.len();
        let mut best: Option<Split> = None;
        let mut visited = 0usize;
        for feature in features {
            if visited >= self.max_features {
                break;
            }
            let mut values: Vec<(f64, usize)> = rows
                .iter()
                .map(|&row| (self.samples[row][feature], self.labels[row]))
                .collect();
            values.sort_by(|a, b| a.0.total_cmp(&b.0));
            let (Some(first), Some(last)) = (values.first(), values.last()) else {
                continue;
            };
            if first.0 == last.0 {
                continue;
            }
            visited += 1;

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = counts.to_vec();
            for i in 0..total - 1 {
                let (value, label) = values[i];
                left_counts[label] += 1;
                right_counts[label] -= 1;
                let next = values[i + 1].0;
                if value == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = total - n_left;
                let impurity = (n_left as f64 * gini(&left_counts, n_left)
                    + n_right as f64 * gini(&right_counts, n_right))
                    / total as f64;
                if best.is_none_or(|b| impurity < b.impurity) {
                    let mut threshold = (value + next) / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }
        best
    }
}

/// Probability model over label indices `0..n_classes`.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<Node>,
    n_classes: usize,
}

impl RandomForest {
    /// Trains on `samples[i]` labelled `labels[i]`. Fewer than two distinct
    /// labels is a configuration error.
    pub fn fit(
        samples: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: ForestParams,
    ) -> Result<Self, TriageError> {
        if samples.len() != labels.len() {
            return Err(TriageError::InvalidArgument(format!(
                "{} samples but {} labels",
                samples.len(),
                labels.len()
            )));
        }
        if params.n_trees == 0 {
            return Err(TriageError::InvalidArgument(
                "forest needs at least one tree".into(),
            ));
        }
        if let Some(bad) = labels.iter().find(|l| **l >= n_classes) {
            return Err(TriageError::InvalidArgument(format!(
                "label {bad} out of range for {n_classes} classes"
            )));
        }
        let mut distinct = labels.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < 2 {
            return Err(TriageError::InsufficientClasses {
                found: distinct.len(),
            });
        }

        let n_features = samples.first().map(Vec::len).unwrap_or(0);
        let max_features = ((n_features as f64).sqrt().floor() as usize).max(1);
        let builder = TreeBuilder {
            samples,
            labels,
            n_classes,
            n_features,
            max_features,
        };

        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let n = samples.len();
        let trees = (0..params.n_trees)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                builder.grow(&bootstrap, &mut rng)
            })
            .collect();

        Ok(Self { trees, n_classes })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Mean of the per-tree leaf class distributions; sums to 1.
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in out.iter_mut().zip(tree.leaf_for(x)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        for p in &mut out {
            *p /= n;
        }
        out
    }
}
