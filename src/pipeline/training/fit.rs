use crate::pipeline::inference::{DecisionTree, TreeNode};

/// One encoded training example.
#[derive(Debug, Clone)]
pub struct Example {
    pub features: Vec<f32>,
    /// Label ordinal into `RecommendedAction::ALL`.
    pub label: usize,
}

#[derive(Debug, Clone)]
pub struct FitParams {
    pub max_depth: usize,
    pub min_leaf: usize,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_leaf: 2,
        }
    }
}

/// Fit a single CART tree with gini-impurity splits.
///
/// Deterministic by construction: candidate splits are scanned in feature
/// order with sorted thresholds, and only a strictly better gain replaces
/// the current best, so equal-gain ties resolve to the first candidate.
pub fn fit_tree(examples: &[Example], n_labels: usize, params: &FitParams) -> DecisionTree {
    let indices: Vec<usize> = (0..examples.len()).collect();
    DecisionTree {
        root: grow(examples, &indices, n_labels, params, 0),
    }
}

/// Accuracy of the fitted tree on a held-out set, using the same
/// argmax/lowest-ordinal rule the serving classifier applies.
pub fn evaluate(tree: &DecisionTree, test: &[Example]) -> f32 {
    if test.is_empty() {
        return 0.0;
    }
    let correct = test
        .iter()
        .filter(|example| {
            let distribution = tree.root.evaluate(&example.features);
            argmax(distribution) == example.label
        })
        .count();
    correct as f32 / test.len() as f32
}

fn argmax(values: &[f32]) -> usize {
    let mut best = 0usize;
    for (idx, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = idx;
        }
    }
    best
}

fn grow(
    examples: &[Example],
    indices: &[usize],
    n_labels: usize,
    params: &FitParams,
    depth: usize,
) -> TreeNode {
    let counts = label_counts(examples, indices, n_labels);
    let node_gini = gini(&counts, indices.len());

    let make_leaf = || TreeNode::Leaf {
        distribution: distribution(&counts, indices.len()),
    };

    if depth >= params.max_depth || indices.len() < 2 * params.min_leaf || node_gini == 0.0 {
        return make_leaf();
    }

    let Some(best) = best_split(examples, indices, n_labels, params, node_gini) else {
        return make_leaf();
    };

    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| examples[i].features[best.feature] < best.threshold);

    TreeNode::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(grow(examples, &left_indices, n_labels, params, depth + 1)),
        right: Box::new(grow(examples, &right_indices, n_labels, params, depth + 1)),
    }
}

struct Split {
    feature: usize,
    threshold: f32,
}

fn best_split(
    examples: &[Example],
    indices: &[usize],
    n_labels: usize,
    params: &FitParams,
    node_gini: f64,
) -> Option<Split> {
    let n_features = examples.get(*indices.first()?)?.features.len();
    let total = indices.len();
    let full_counts = label_counts(examples, indices, n_labels);

    let mut best: Option<(f64, Split)> = None;

    for feature in 0..n_features {
        let mut values: Vec<f32> = indices
            .iter()
            .map(|&i| examples[i].features[feature])
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;

            let mut left_counts = vec![0usize; n_labels];
            let mut left_total = 0usize;
            for &i in indices {
                if examples[i].features[feature] < threshold {
                    left_counts[examples[i].label] += 1;
                    left_total += 1;
                }
            }
            let right_total = total - left_total;
            if left_total < params.min_leaf || right_total < params.min_leaf {
                continue;
            }

            let right_counts: Vec<usize> = full_counts
                .iter()
                .zip(&left_counts)
                .map(|(all, l)| all - l)
                .collect();

            let weighted = (left_total as f64 / total as f64) * gini(&left_counts, left_total)
                + (right_total as f64 / total as f64) * gini(&right_counts, right_total);
            let gain = node_gini - weighted;

            let better = match &best {
                None => gain > 1e-12,
                Some((best_gain, _)) => gain > *best_gain,
            };
            if better {
                best = Some((gain, Split { feature, threshold }));
            }
        }
    }

    best.map(|(_, split)| split)
}

fn label_counts(examples: &[Example], indices: &[usize], n_labels: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_labels];
    for &i in indices {
        counts[examples[i].label] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let sum_sq: f64 = counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total as f64;
            p * p
        })
        .sum();
    1.0 - sum_sq
}

fn distribution(counts: &[usize], total: usize) -> Vec<f32> {
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts
        .iter()
        .map(|&c| c as f32 / total as f32)
        .collect()
}
