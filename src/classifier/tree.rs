use ndarray::{ArrayView1, ArrayView2};
use rand::{rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Non-constant features to examine per split before settling.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        delayed_share: f64,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
}

struct Split {
    feature: usize,
    threshold: f32,
    impurity: f64,
}

/// CART classification tree stored as a flat node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

fn gini(pos: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = pos as f64 / n as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

struct Grower<'a, 'x, 'y> {
    x: ArrayView2<'x, f32>,
    y: ArrayView1<'y, bool>,
    params: &'a TreeParams,
    nodes: Vec<Node>,
}

impl Grower<'_, '_, '_> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let n = samples.len();
        let pos = samples.iter().filter(|&&i| self.y[i]).count();
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            delayed_share: if n == 0 { 0.0 } else { pos as f64 / n as f64 },
        });

        let pure = pos == 0 || pos == n;
        let depth_left = self.params.max_depth.map_or(true, |d| depth < d);
        if pure || !depth_left || n < self.params.min_samples_split {
            return idx;
        }

        let Some(split) = self.best_split(&samples, rng) else {
            return idx;
        };
        let (l, r): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[[i, split.feature]] <= split.threshold);

        let left = self.grow(l, depth + 1, rng);
        let right = self.grow(r, depth + 1, rng);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    /// Scans features in random order. Constant features do not count
    /// towards `max_features`, so a split is found whenever one exists.
    fn best_split(&self, samples: &[usize], rng: &mut StdRng) -> Option<Split> {
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf;
        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(rng);

        let mut best: Option<Split> = None;
        let mut visited = 0;
        let mut column: Vec<(f32, bool)> = Vec::with_capacity(n);

        for feature in features {
            if visited >= self.params.max_features && best.is_some() {
                break;
            }

            column.clear();
            column.extend(samples.iter().map(|&i| (self.x[[i, feature]], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));
            if column[0].0 == column[n - 1].0 {
                continue;
            }
            visited += 1;

            let total_pos = column.iter().filter(|(_, d)| *d).count();
            let mut left_pos = 0;
            for k in 0..n - 1 {
                if column[k].1 {
                    left_pos += 1;
                }
                if column[k].0 == column[k + 1].0 {
                    continue;
                }
                let nl = k + 1;
                let nr = n - nl;
                if nl < min_leaf || nr < min_leaf {
                    continue;
                }
                let impurity = (nl as f64 * gini(left_pos, nl)
                    + nr as f64 * gini(total_pos - left_pos, nr))
                    / n as f64;
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(Split {
                        feature,
                        threshold: (column[k].0 + column[k + 1].0) / 2.0,
                        impurity,
                    });
                }
            }
        }
        best
    }
}

impl DecisionTree {
    /// Grows a tree over the rows listed in `samples` (repeats allowed).
    pub fn fit(
        x: ArrayView2<f32>,
        y: ArrayView1<bool>,
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut grower = Grower {
            x,
            y,
            params,
            nodes: Vec::new(),
        };
        grower.grow(samples, 0, rng);
        Self {
            nodes: grower.nodes,
        }
    }

    /// Share of delayed training rows in the leaf `row` falls into.
    pub fn predict_row(&self, row: ArrayView1<f32>) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Leaf { delayed_share } => return delayed_share,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deserialized trees are untrusted: every child index must point
    /// forward and every split feature must be in range.
    pub(crate) fn is_well_formed(&self, n_features: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(i, node)| match *node {
                Node::Leaf { delayed_share } => (0.0..=1.0).contains(&delayed_share),
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    feature < n_features
                        && left > i
                        && right > i
                        && left < self.nodes.len()
                        && right < self.nodes.len()
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    #[test]
    fn separates_a_clean_signal() {
        // column 1 alone decides the label
        let x = array![[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];
        let y = array![true, true, false, false];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(x.view(), y.view(), (0..4).collect(), &params(), &mut rng);

        assert_eq!(tree.predict_row(array![0.0f32, 1.0].view()), 1.0);
        assert_eq!(tree.predict_row(array![1.0f32, 0.0].view()), 0.0);
        assert!(tree.is_well_formed(2));
    }

    fn grow_with_local_labels(x: ArrayView2<f32>, params: &TreeParams) -> DecisionTree {
        // labels live only in this frame, shorter than the borrowed features
        let y: Array1<bool> = x.column(0).iter().map(|v| *v > 0.5).collect();
        let mut rng = StdRng::seed_from_u64(3);
        DecisionTree::fit(x, y.view(), (0..x.nrows()).collect(), params, &mut rng)
    }

    #[test]
    fn features_and_labels_may_have_different_owners() {
        let x = array![[0.0f32], [1.0], [0.0], [1.0]];
        let tree = {
            let p = params();
            grow_with_local_labels(x.view(), &p)
        };
        assert_eq!(tree.predict_row(array![1.0f32].view()), 1.0);
        assert_eq!(tree.predict_row(array![0.0f32].view()), 0.0);
    }

    #[test]
    fn pure_input_is_a_single_leaf() {
        let x = array![[3.0f32], [4.0], [5.0]];
        let y = Array1::from_elem(3, false);
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(x.view(), y.view(), vec![0, 1, 2], &params(), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_row(array![100.0f32].view()), 0.0);
    }

    #[test]
    fn depth_limit_yields_leaf_shares() {
        let x = array![[0.0f32], [1.0], [2.0], [3.0]];
        let y = array![false, true, false, true];
        let p = TreeParams {
            max_depth: Some(0),
            ..params()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(x.view(), y.view(), (0..4).collect(), &p, &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_row(array![0.0f32].view()), 0.5);
    }

    #[test]
    fn constant_features_give_a_leaf() {
        let x = array![[1.0f32, 2.0], [1.0, 2.0]];
        let y = array![true, false];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(x.view(), y.view(), vec![0, 1], &params(), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_row(array![1.0f32, 2.0].view()), 0.5);
    }
}
