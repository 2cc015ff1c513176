// ============================================================
// Layer 5 - Second-order Gradient Boosting (XGBoost style)
// ============================================================
// Boosts regression trees on the log-loss using both the
// gradient and the hessian of every row:
//
//   g_i = p_i − y_i          h_i = p_i (1 − p_i)
//
// A split is scored with the regularised structure score
//
//   gain = G_L² / (H_L + λ) + G_R² / (H_R + λ) − G² / (H + λ)
//
// and a child is only allowed if its hessian sum reaches
// min_child_weight. Leaves hold −G / (H + λ), shrunk by eta.
//
// Training starts from a zero margin (P(spam) = 0.5).
//
// Reference: Chen & Guestrin (2016), "XGBoost: A Scalable Tree
//            Boosting System"

use ndarray::{Array1, ArrayView2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::classifier::{check_training, check_width, sigmoid, Classifier};
use super::sparse::SparseRows;
use super::tree::{Criterion, GrowParams, NodeStat, Tree};
use super::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XgbParams {
    pub n_rounds:         usize,
    /// Shrinkage applied to every new tree
    pub eta:              f64,
    pub max_depth:        usize,
    /// L2 penalty on leaf weights
    pub lambda:           f64,
    pub min_child_weight: f64,
}

impl Default for XgbParams {
    fn default() -> Self {
        Self { n_rounds: 50, eta: 0.3, max_depth: 6, lambda: 1.0, min_child_weight: 1.0 }
    }
}

pub struct XgBoost {
    params: XgbParams,
    trees:  Vec<Tree>,
    n_cols: usize,
}

impl XgBoost {
    pub fn new(params: XgbParams) -> Self {
        Self { params, trees: Vec::new(), n_cols: 0 }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw margin Σ eta · tree(x)
    pub fn margin(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_width(self.n_cols, x)?;

        let rows = SparseRows::from_dense(x);
        let mut f = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            for (fi, v) in f.iter_mut().zip(tree.predict(&rows)) {
                *fi += v;
            }
        }
        Ok(f)
    }
}

impl Classifier for XgBoost {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;
        let p = self.params;
        if p.n_rounds == 0 || p.eta <= 0.0 || p.lambda < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "xgboost needs n_rounds ≥ 1, eta > 0 and lambda ≥ 0 (got {}, {}, {})",
                p.n_rounds, p.eta, p.lambda
            )));
        }

        let n    = y.len();
        let rows = SparseRows::from_dense(x);
        let grow = GrowParams {
            criterion:         Criterion::Newton { lambda: p.lambda, min_child_weight: p.min_child_weight },
            max_depth:         Some(p.max_depth),
            max_features:      None,
            random_thresholds: false,
            min_samples_split: 2,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let mut f = vec![0.0; n];
        self.trees.clear();

        for round in 0..p.n_rounds {
            // ── gradient statistics at the current margin ──
            let stats: Vec<NodeStat> = f
                .iter()
                .zip(y)
                .map(|(&fi, &label)| {
                    let prob = sigmoid(fi);
                    NodeStat { sum: f64::from(label) - prob, hess: prob * (1.0 - prob), count: 1.0 }
                })
                .collect();

            let mut tree = Tree::grow(&rows, &stats, (0..n).collect(), &grow, &mut rng);
            tree.scale(p.eta);

            for (fi, v) in f.iter_mut().zip(tree.predict(&rows)) {
                *fi += v;
            }
            tracing::trace!("xgb round {}: {} leaves", round + 1, tree.n_leaves());
            self.trees.push(tree);
        }

        self.n_cols = x.ncols();
        tracing::debug!("xgb: {} trees", self.trees.len());
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        Ok(self.margin(x)?.mapv(sigmoid))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_learns_either_feature() {
        let x = array![
            [0.9, 0.0],
            [0.8, 0.1],
            [0.0, 0.9],
            [0.1, 0.7],
            [0.2, 0.1],
            [0.1, 0.2],
            [0.0, 0.0],
            [0.3, 0.3],
        ];
        let y = vec![1, 1, 1, 1, 0, 0, 0, 0];
        let params = XgbParams { min_child_weight: 0.1, ..XgbParams::default() };
        let mut xgb = XgBoost::new(params);
        xgb.fit(x.view(), &y).unwrap();

        assert_eq!(xgb.n_trees(), 50);
        assert_eq!(xgb.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn test_first_tree_leaf_values() {
        // one split, both children pure: G = ±1, H = 0.5, λ = 1
        // leaf = eta · G / (H + λ) = 0.3 · (±1 / 1.5)
        let x = array![[0.0], [0.0], [1.0], [1.0]];
        let params = XgbParams { n_rounds: 1, min_child_weight: 0.0, ..XgbParams::default() };
        let mut xgb = XgBoost::new(params);
        xgb.fit(x.view(), &[0, 0, 1, 1]).unwrap();

        let m = xgb.margin(x.view()).unwrap();
        assert!((m[0] + 0.2).abs() < 1e-12);
        assert!((m[2] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_min_child_weight_blocks_splits() {
        // four rows of hessian 0.25 can never reach a child weight of 10
        let x = array![[0.0], [0.0], [1.0], [1.0]];
        let params = XgbParams { n_rounds: 1, min_child_weight: 10.0, ..XgbParams::default() };
        let mut xgb = XgBoost::new(params);
        xgb.fit(x.view(), &[0, 0, 1, 1]).unwrap();

        let m = xgb.margin(x.view()).unwrap();
        assert!(m.iter().all(|&v| v.abs() < 1e-12));
    }

    #[test]
    fn test_rejects_zero_eta() {
        let x = array![[0.0], [1.0]];
        let mut xgb = XgBoost::new(XgbParams { eta: 0.0, ..XgbParams::default() });
        assert!(matches!(xgb.fit(x.view(), &[0, 1]), Err(ModelError::InvalidParameter(_))));
    }
}
