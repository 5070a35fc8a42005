//! Binary classifier capability.
//!
//! The engine only talks to [`Classifier`]; [`RandomForest`] is the
//! implementation persisted in model artifacts by default.
//!
//! - [`DecisionTree`]: a single CART tree with Gini splits
//! - [`RandomForest`]: bagged trees with per-split feature sampling

mod forest;
mod tree;

pub use forest::{ForestParams, RandomForest};
pub use tree::{DecisionTree, TreeParams};

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::Result;

pub trait Classifier {
    /// Fits on `x` (one row per example) against `y` (`true` = delayed).
    fn fit(&mut self, x: ArrayView2<f32>, y: ArrayView1<bool>) -> Result<()>;

    /// Probability of the delayed class for every row.
    fn predict_proba(&self, x: ArrayView2<f32>) -> Result<Array1<f64>>;

    /// Hard labels. The default calls a row delayed when its delayed-class
    /// probability is strictly above one half.
    fn predict(&self, x: ArrayView2<f32>) -> Result<Array1<bool>> {
        Ok(self.predict_proba(x)?.mapv(|p| p > 0.5))
    }

    /// Input width learned by `fit`; `None` until fitted.
    fn n_features(&self) -> Option<usize>;
}
