// ============================================================
// Layer 5 - Tree Ensembles
// ============================================================
// Three averaging ensembles built from the same CART grower:
//
//   Random forest → bootstrap sample per tree, √features per
//                   split, best thresholds
//   Extra trees   → whole training set per tree, √features per
//                   split, random thresholds
//   Bagging       → bootstrap sample per tree, all features,
//                   best thresholds
//
// A bootstrap draws n rows with replacement; a row drawn k
// times enters its tree with weight k. Every tree gets its own
// seed taken from one ChaCha8 stream, so a forest is fully
// determined by its config.
//
// P(spam) is the mean of the trees' leaf probabilities.
//
// Reference: Breiman (2001), "Random Forests"
//            Breiman (1996), "Bagging Predictors"

use ndarray::{Array1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::classifier::{check_training, check_width, Classifier};
use super::sparse::SparseRows;
use super::tree::{class_stats, MaxFeatures, Tree, TreeConfig};
use super::ModelError;

/// Random forest / extra trees / bagging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees:   usize,
    pub bootstrap: bool,
    pub tree:      TreeConfig,
}

impl ForestConfig {
    pub fn random_forest(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees,
            bootstrap: true,
            tree: TreeConfig { max_features: MaxFeatures::Sqrt, seed, ..TreeConfig::default() },
        }
    }

    pub fn extra_trees(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees,
            bootstrap: false,
            tree: TreeConfig {
                max_features: MaxFeatures::Sqrt,
                random_thresholds: true,
                seed,
                ..TreeConfig::default()
            },
        }
    }

    pub fn bagging(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees,
            bootstrap: true,
            tree: TreeConfig { max_features: MaxFeatures::All, seed, ..TreeConfig::default() },
        }
    }
}

pub struct TreeEnsemble {
    config: ForestConfig,
    trees:  Vec<Tree>,
    n_cols: usize,
}

impl TreeEnsemble {
    pub fn new(config: ForestConfig) -> Self {
        Self { config, trees: Vec::new(), n_cols: 0 }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Multiplicity of every row in one bootstrap sample
fn bootstrap_weights(n: usize, rng: &mut ChaCha8Rng) -> Vec<f64> {
    let mut weights = vec![0.0; n];
    for _ in 0..n {
        weights[rng.gen_range(0..n)] += 1.0;
    }
    weights
}

impl Classifier for TreeEnsemble {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;
        if self.config.n_trees == 0 {
            return Err(ModelError::InvalidParameter("n_trees must be at least 1".to_string()));
        }

        let n      = y.len();
        let rows   = SparseRows::from_dense(x);
        let params = self.config.tree.grow_params(x.ncols());
        let mut master = ChaCha8Rng::seed_from_u64(self.config.tree.seed);

        self.trees.clear();
        for _ in 0..self.config.n_trees {
            let mut rng = ChaCha8Rng::seed_from_u64(master.gen());

            let weights = if self.config.bootstrap {
                bootstrap_weights(n, &mut rng)
            } else {
                vec![1.0; n]
            };
            let sample: Vec<usize> = (0..n).filter(|&i| weights[i] > 0.0).collect();
            let stats = class_stats(y, &weights);

            self.trees.push(Tree::grow(&rows, &stats, sample, &params, &mut rng));
        }

        self.n_cols = x.ncols();
        tracing::debug!(
            "Tree ensemble: {} trees, mean depth {:.1}",
            self.trees.len(),
            self.trees.iter().map(Tree::depth).sum::<usize>() as f64 / self.trees.len() as f64
        );
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_width(self.n_cols, x)?;

        let rows = SparseRows::from_dense(x);
        let mut proba = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            for (p, v) in proba.iter_mut().zip(tree.predict(&rows)) {
                *p += v;
            }
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Spam rows use features 0-2, ham rows features 3-5, with noise
    fn blobs() -> (Array2<f64>, Vec<u8>) {
        let mut x = Array2::<f64>::zeros((40, 6));
        let mut y = Vec::new();
        for i in 0..40 {
            let spam = i % 2 == 0;
            let base = if spam { 0 } else { 3 };
            x[[i, base + i % 3]] = 1.0;
            x[[i, base + (i + 1) % 3]] = 0.5;
            y.push(u8::from(spam));
        }
        (x, y)
    }

    #[test]
    fn test_forest_variants_fit_training_data() {
        let (x, y) = blobs();
        for config in [
            ForestConfig::random_forest(10, 2),
            ForestConfig::extra_trees(10, 2),
            ForestConfig::bagging(10, 2),
        ] {
            let mut model = TreeEnsemble::new(config);
            model.fit(x.view(), &y).unwrap();
            assert_eq!(model.n_trees(), 10);
            assert_eq!(model.predict(x.view()).unwrap(), y);
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = blobs();
        let mut a = TreeEnsemble::new(ForestConfig::random_forest(5, 9));
        let mut b = TreeEnsemble::new(ForestConfig::random_forest(5, 9));
        a.fit(x.view(), &y).unwrap();
        b.fit(x.view(), &y).unwrap();
        assert_eq!(a.trees, b.trees);
    }

    #[test]
    fn test_bootstrap_weights_sum_to_n() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let w = bootstrap_weights(100, &mut rng);
        assert_eq!(w.iter().sum::<f64>(), 100.0);
        // some rows are left out of the sample
        assert!(w.iter().any(|&v| v == 0.0));
    }

    #[test]
    fn test_unfitted_forest() {
        let model = TreeEnsemble::new(ForestConfig::bagging(3, 0));
        let x = Array2::<f64>::zeros((1, 6));
        assert!(matches!(model.predict_proba(x.view()), Err(ModelError::NotFitted)));
    }
}
