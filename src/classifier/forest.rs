use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeParams};
use super::Classifier;
use crate::config::TrainConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// `None` means `floor(sqrt(n_features))`.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::from(&TrainConfig::default())
    }
}

impl From<&TrainConfig> for ForestParams {
    fn from(cfg: &TrainConfig) -> Self {
        Self {
            n_trees: cfg.n_trees,
            max_depth: cfg.max_depth,
            min_samples_split: cfg.min_samples_split,
            min_samples_leaf: cfg.min_samples_leaf,
            max_features: cfg.max_features,
            bootstrap: cfg.bootstrap,
            seed: cfg.seed,
        }
    }
}

/// Bagged ensemble of [`DecisionTree`]s. The delayed-class probability is
/// the mean of the trees' leaf shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: Option<usize>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            n_features: None,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn check_input(&self, x: &ArrayView2<f32>) -> Result<()> {
        let expected = self
            .n_features
            .ok_or_else(|| Error::Classifier("forest has not been fitted".into()))?;
        if x.ncols() != expected {
            return Err(Error::SchemaMismatch {
                expected,
                found: x.ncols(),
            });
        }
        Ok(())
    }

    fn score_row(&self, row: ArrayView1<f32>) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: ArrayView2<f32>, y: ArrayView1<bool>) -> Result<()> {
        let (n, d) = x.dim();
        if n == 0 {
            return Err(Error::Classifier("cannot fit on zero rows".into()));
        }
        if y.len() != n {
            return Err(Error::Classifier(format!(
                "{} rows but {} labels",
                n,
                y.len()
            )));
        }
        if d == 0 {
            return Err(Error::Classifier("cannot fit on zero features".into()));
        }
        if self.params.n_trees == 0 {
            return Err(Error::Classifier("n_trees must be at least 1".into()));
        }

        let max_features = self
            .params
            .max_features
            .unwrap_or_else(|| (d as f64).sqrt() as usize)
            .clamp(1, d);
        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split.max(2),
            min_samples_leaf: self.params.min_samples_leaf.max(1),
            max_features,
        };
        let bootstrap = self.params.bootstrap;
        let seed = self.params.seed;

        // one rng per tree keeps results independent of thread scheduling
        let trees: Vec<DecisionTree> = (0..self.params.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                let samples: Vec<usize> = if bootstrap {
                    (0..n).map(|_| rng.random_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(x, y, samples, &tree_params, &mut rng)
            })
            .collect();

        tracing::debug!(
            trees = trees.len(),
            nodes = trees.iter().map(DecisionTree::node_count).sum::<usize>(),
            max_features,
            "forest fitted"
        );
        self.trees = trees;
        self.n_features = Some(d);
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<f32>) -> Result<Array1<f64>> {
        self.check_input(&x)?;
        if self.trees.is_empty() {
            return Err(Error::Classifier("forest has no trees".into()));
        }
        Ok(x.rows().into_iter().map(|row| self.score_row(row)).collect())
    }

    fn n_features(&self) -> Option<usize> {
        let d = self.n_features?;
        let sound = !self.trees.is_empty() && self.trees.iter().all(|t| t.is_well_formed(d));
        sound.then_some(d)
    }
}
