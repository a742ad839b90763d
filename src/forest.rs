//! Bootstrap-aggregated decision trees.
//!
//! Each tree is a CART tree (Gini impurity, unlimited depth) fit on a
//! bootstrap resample of the training rows. The label is the strict majority
//! vote of the trees; the probability is the fraction of trees voting for the
//! beneficial class. The two are computed independently, so a 50/50 split
//! reports probability 0.5 with the "no benefit" label.

use linfa::prelude::*;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub const BENEFIT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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

/// Outcome of scoring one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vote {
    pub probability: f64,
    pub beneficial: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forest {
    trees: Vec<DecisionTree<f64, usize>>,
    n_features: usize,
}

impl Forest {
    pub fn fit(x: &Array2<f64>, y: &Array1<usize>, params: &ForestParams) -> Result<Self, ModelError> {
        let n = x.nrows();
        if n == 0 {
            return Err(ModelError::EmptyDataset);
        }
        if y.len() != n {
            return Err(ModelError::FeatureLength {
                got: y.len(),
                expected: n,
            });
        }
        let mut rng = StdRng::seed_from_u64(params.seed);
        let tree_params = DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(None);

        let mut trees = Vec::with_capacity(params.n_trees.max(1));
        for _ in 0..params.n_trees.max(1) {
            let idx: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let sample = Dataset::new(x.select(Axis(0), &idx), y.select(Axis(0), &idx));
            let tree = tree_params
                .fit(&sample)
                .map_err(|e| ModelError::Fit(e.to_string()))?;
            trees.push(tree);
        }
        Ok(Self {
            trees,
            n_features: x.ncols(),
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Score one already-scaled row.
    pub fn score(&self, row: &[f64]) -> Result<Vote, ModelError> {
        if row.len() != self.n_features {
            return Err(ModelError::FeatureLength {
                got: row.len(),
                expected: self.n_features,
            });
        }
        let x = Array2::from_shape_vec((1, row.len()), row.to_vec())
            .map_err(|e| ModelError::Fit(e.to_string()))?;

        let votes = self
            .trees
            .iter()
            .filter(|tree| {
                let pred: Array1<usize> = tree.predict(&x);
                pred[0] == BENEFIT
            })
            .count();

        Ok(Vote {
            probability: votes as f64 / self.trees.len() as f64,
            beneficial: votes * 2 > self.trees.len(),
        })
    }
}
