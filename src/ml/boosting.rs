// ============================================================
// Layer 5 - Boosting
// ============================================================
// AdaBoost (SAMME, two classes) with decision stumps:
//
//   w_i = 1/n
//   for each round m:
//     fit a depth-1 tree on weights w
//     err_m = Σ w_i [h_m(x_i) ≠ y_i] / Σ w_i
//     α_m   = lr · ln((1 − err_m) / err_m)
//     w_i  ← w_i · exp(α_m · [h_m(x_i) ≠ y_i]), renormalised
//
//   A perfect stump ends training early; a stump no better
//   than chance is discarded and training stops.
//   decision(x) = Σ α_m · (±1) / Σ α_m   ∈ [−1, 1]
//
// Gradient boosting for the log-loss:
//
//   F₀ = log(p / (1 − p)),  p = share of spam
//   for each stage:
//     p_i = σ(F(x_i)),  r_i = y_i − p_i
//     grow a regression tree on r (squared error splits)
//     leaf value = Σ r / Σ p(1 − p)   (one Newton step)
//     F ← F + lr · tree
//
// Reference: Zhu, Zou, Rosset & Hastie (2009), "Multi-class
//            AdaBoost"
//            Friedman (2001), "Greedy Function Approximation:
//            A Gradient Boosting Machine"

use ndarray::{Array1, ArrayView2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::classifier::{check_training, check_width, sigmoid, Classifier};
use super::sparse::SparseRows;
use super::tree::{class_stats, Criterion, GrowParams, NodeStat, Tree};
use super::ModelError;

// ─── AdaBoost ─────────────────────────────────────────────────────────────────

pub struct AdaBoost {
    n_rounds:      usize,
    learning_rate: f64,
    stumps:        Vec<(Tree, f64)>,
    n_cols:        usize,
}

impl AdaBoost {
    pub fn new(n_rounds: usize, learning_rate: f64) -> Self {
        Self { n_rounds, learning_rate, stumps: Vec::new(), n_cols: 0 }
    }

    pub fn n_stumps(&self) -> usize {
        self.stumps.len()
    }

    fn stump_params() -> GrowParams {
        GrowParams {
            criterion:         Criterion::Gini,
            max_depth:         Some(1),
            max_features:      None,
            random_thresholds: false,
            min_samples_split: 2,
        }
    }

    /// Weighted vote in [−1, 1]; positive means spam
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        if self.stumps.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_width(self.n_cols, x)?;

        let rows = SparseRows::from_dense(x);
        let total: f64 = self.stumps.iter().map(|(_, a)| a).sum();
        let mut out = Array1::<f64>::zeros(x.nrows());
        for (stump, alpha) in &self.stumps {
            for (d, p) in out.iter_mut().zip(stump.predict(&rows)) {
                *d += if p > 0.5 { *alpha } else { -*alpha };
            }
        }
        out /= total;
        Ok(out)
    }
}

impl Classifier for AdaBoost {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;
        if self.n_rounds == 0 || self.learning_rate <= 0.0 {
            return Err(ModelError::InvalidParameter(
                "AdaBoost needs at least one round and a positive learning rate".to_string(),
            ));
        }

        let n      = y.len();
        let rows   = SparseRows::from_dense(x);
        let params = Self::stump_params();
        let sample: Vec<usize> = (0..n).collect();
        let mut weights = vec![1.0 / n as f64; n];
        // stumps never sample features, the rng is only part of the grower's signature
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        self.stumps.clear();
        for round in 0..self.n_rounds {
            let stats = class_stats(y, &weights);
            let stump = Tree::grow(&rows, &stats, sample.clone(), &params, &mut rng);

            let miss: Vec<bool> = stump
                .predict(&rows)
                .iter()
                .zip(y)
                .map(|(&p, &label)| u8::from(p > 0.5) != label)
                .collect();

            let weight_sum: f64 = weights.iter().sum();
            let err = weights
                .iter()
                .zip(&miss)
                .filter(|(_, m)| **m)
                .map(|(w, _)| w)
                .sum::<f64>()
                / weight_sum;

            if err <= 0.0 {
                self.stumps.push((stump, 1.0));
                tracing::debug!("AdaBoost: perfect stump at round {}, stopping", round + 1);
                break;
            }
            if err >= 0.5 {
                if self.stumps.is_empty() {
                    tracing::warn!("AdaBoost: first stump no better than chance (error {:.3})", err);
                    self.stumps.push((stump, 1.0));
                }
                break;
            }

            let alpha = self.learning_rate * ((1.0 - err) / err).ln();
            for (w, &m) in weights.iter_mut().zip(&miss) {
                if m {
                    *w *= alpha.exp();
                }
            }
            let new_sum: f64 = weights.iter().sum();
            weights.iter_mut().for_each(|w| *w /= new_sum);

            self.stumps.push((stump, alpha));
        }

        self.n_cols = x.ncols();
        tracing::debug!("AdaBoost: {} stumps", self.stumps.len());
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        Ok(self.decision_function(x)?.mapv(|d| sigmoid(2.0 * d)))
    }
}

// ─── Gradient boosting ────────────────────────────────────────────────────────

pub struct GradientBoosting {
    n_stages:      usize,
    learning_rate: f64,
    max_depth:     usize,
    init:          f64,
    trees:         Vec<Tree>,
    n_cols:        usize,
}

impl GradientBoosting {
    pub fn new(n_stages: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self { n_stages, learning_rate, max_depth, init: 0.0, trees: Vec::new(), n_cols: 0 }
    }

    /// Raw log-odds F(x)
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_width(self.n_cols, x)?;

        let rows = SparseRows::from_dense(x);
        let mut f = Array1::<f64>::from_elem(x.nrows(), self.init);
        for tree in &self.trees {
            for (fi, v) in f.iter_mut().zip(tree.predict(&rows)) {
                *fi += self.learning_rate * v;
            }
        }
        Ok(f)
    }
}

impl Classifier for GradientBoosting {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;
        if self.n_stages == 0 || self.learning_rate <= 0.0 {
            return Err(ModelError::InvalidParameter(
                "gradient boosting needs at least one stage and a positive learning rate".to_string(),
            ));
        }

        let n    = y.len();
        let rows = SparseRows::from_dense(x);
        let params = GrowParams {
            criterion:         Criterion::LeastSquares,
            max_depth:         Some(self.max_depth),
            max_features:      None,
            random_thresholds: false,
            min_samples_split: 2,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let spam_share = y.iter().filter(|&&l| l == 1).count() as f64 / n as f64;
        self.init = (spam_share / (1.0 - spam_share)).ln();

        let mut f = vec![self.init; n];
        self.trees.clear();

        for _ in 0..self.n_stages {
            let stats: Vec<NodeStat> = f
                .iter()
                .zip(y)
                .map(|(&fi, &label)| {
                    let p = sigmoid(fi);
                    NodeStat { sum: f64::from(label) - p, hess: p * (1.0 - p), count: 1.0 }
                })
                .collect();

            let tree = Tree::grow(&rows, &stats, (0..n).collect(), &params, &mut rng);
            for (fi, v) in f.iter_mut().zip(tree.predict(&rows)) {
                *fi += self.learning_rate * v;
            }
            self.trees.push(tree);
        }

        self.n_cols = x.ncols();
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        Ok(self.decision_function(x)?.mapv(sigmoid))
    }
}
