//! CART decision tree over categorical predictors
//!
//! Splits are binary `feature == value` tests scored by Gini impurity.
//! Every choice is deterministic: candidates are visited in (predictor,
//! sorted value) order and only a strictly better gain replaces the best
//! split; leaf classes break count ties toward the smallest label.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::dataset::majority;

/// Gains at or below this are treated as no improvement
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: 4,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        class: String,
        samples: usize,
    },
    Split {
        feature: usize,
        value: String,
        matches: Box<Node>,
        rest: Box<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    /// Fit on rows of categorical values; `rows` and `labels` align by index
    pub fn fit(rows: &[Vec<String>], labels: &[String], params: TreeParams) -> Self {
        let indices: Vec<usize> = (0..rows.len().min(labels.len())).collect();
        let root = build(rows, labels, &indices, 0, &params);
        DecisionTree { root }
    }

    pub fn predict(&self, row: &[String]) -> &str {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { class, .. } => return class,
                Node::Split {
                    feature,
                    value,
                    matches,
                    rest,
                } => {
                    node = if row.get(*feature) == Some(value) {
                        matches
                    } else {
                        rest
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { matches, rest, .. } => 1 + depth(matches).max(depth(rest)),
            }
        }
        depth(&self.root)
    }

    pub fn leaves(&self) -> usize {
        fn leaves(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { matches, rest, .. } => leaves(matches) + leaves(rest),
            }
        }
        leaves(&self.root)
    }

    /// One line per node, indented by depth
    pub fn describe(&self, feature_names: &[&str]) -> Vec<String> {
        fn walk(node: &Node, names: &[&str], indent: usize, out: &mut Vec<String>) {
            let pad = "  ".repeat(indent);
            match node {
                Node::Leaf { class, samples } => {
                    out.push(format!("{}→ {} ({} samples)", pad, class, samples));
                }
                Node::Split {
                    feature,
                    value,
                    matches,
                    rest,
                } => {
                    let name = names.get(*feature).copied().unwrap_or("?");
                    out.push(format!("{}if {} == \"{}\":", pad, name, value));
                    walk(matches, names, indent + 1, out);
                    out.push(format!("{}else:", pad));
                    walk(rest, names, indent + 1, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, feature_names, 0, &mut out);
        out
    }
}

fn class_counts<'a>(labels: &'a [String], indices: &[usize]) -> BTreeMap<&'a str, usize> {
    let mut counts = BTreeMap::new();
    for &i in indices {
        *counts.entry(labels[i].as_str()).or_insert(0) += 1;
    }
    counts
}

fn gini(counts: &BTreeMap<&str, usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .values()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn build(
    rows: &[Vec<String>],
    labels: &[String],
    indices: &[usize],
    depth: usize,
    params: &TreeParams,
) -> Node {
    let counts = class_counts(labels, indices);
    let leaf = || Node::Leaf {
        class: majority(&counts).unwrap_or_default().to_string(),
        samples: indices.len(),
    };

    if depth >= params.max_depth || indices.len() < params.min_samples_split || counts.len() <= 1 {
        return leaf();
    }

    let parent = gini(&counts, indices.len());
    let n_features = indices.first().map_or(0, |&i| rows[i].len());
    let mut best: Option<(f64, usize, &str)> = None;

    for feature in 0..n_features {
        let values: BTreeSet<&str> = indices.iter().map(|&i| rows[i][feature].as_str()).collect();
        if values.len() < 2 {
            continue;
        }
        for value in values {
            let (left, right): (Vec<usize>, Vec<usize>) =
                indices.iter().partition(|&&i| rows[i][feature] == value);
            let weighted = (left.len() as f64 * gini(&class_counts(labels, &left), left.len())
                + right.len() as f64 * gini(&class_counts(labels, &right), right.len()))
                / indices.len() as f64;
            let gain = parent - weighted;
            if best.map_or(true, |(g, _, _)| gain > g) {
                best = Some((gain, feature, value));
            }
        }
    }

    let Some((gain, feature, value)) = best else {
        return leaf();
    };
    if gain <= MIN_GAIN {
        return leaf();
    }

    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.iter().partition(|&&i| rows[i][feature] == value);

    Node::Split {
        feature,
        value: value.to_string(),
        matches: Box::new(build(rows, labels, &left, depth + 1, params)),
        rest: Box::new(build(rows, labels, &right, depth + 1, params)),
    }
}
