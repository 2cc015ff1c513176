// ============================================================
// Layer 5 - L1 Logistic Regression
// ============================================================
// Minimises
//
//   Σ log(1 + exp(−ỹ_i (w·x_i + b)))  +  (1 / C) · ‖w‖₁
//
// with FISTA (accelerated proximal gradient). The intercept is
// not penalised.
//
// Columns are first divided by their largest absolute value,
// so one large-magnitude column (the appended character count)
// does not shrink the step for every other weight. In scaled
// coordinates u_j = s_j · w_j the penalty becomes Σ |u_j| / s_j,
// so soft-thresholding uses a per-column threshold and the
// objective is unchanged.
//
// Step size 1 / L with L = ‖[X̃ 1]‖₂² / 4, estimated by power
// iteration on the scaled matrix X̃.

use ndarray::{Array1, ArrayView2};

use super::classifier::{check_training, check_width, sigmoid, Classifier};
use super::sparse::SparseRows;
use super::ModelError;

const POWER_ITERATIONS: usize = 50;

#[derive(Debug, Clone)]
pub struct L1Logistic {
    c:            f64,
    max_iter:     usize,
    tol:          f64,
    coefficients: Option<Array1<f64>>,
    intercept:    f64,
    n_iter:       usize,
}

impl L1Logistic {
    pub fn new(c: f64, max_iter: usize, tol: f64) -> Self {
        Self { c, max_iter, tol, coefficients: None, intercept: 0.0, n_iter: 0 }
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    /// Iterations the last `fit` ran
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Number of coefficients driven exactly to zero
    pub fn n_zero_coefficients(&self) -> usize {
        self.coefficients
            .as_ref()
            .map_or(0, |w| w.iter().filter(|&&v| v == 0.0).count())
    }
}

fn margins(rows: &SparseRows, w: &[f64], b: f64) -> Vec<f64> {
    (0..rows.n_rows())
        .map(|i| rows.row(i).iter().map(|(j, v)| v * w[j]).sum::<f64>() + b)
        .collect()
}

/// Largest eigenvalue of [X 1]ᵀ[X 1]
fn squared_spectral_norm(rows: &SparseRows) -> f64 {
    let d = rows.n_cols();
    let mut v_w = vec![1.0; d];
    let mut v_b = 1.0;
    let norm = ((d + 1) as f64).sqrt();
    v_w.iter_mut().for_each(|v| *v /= norm);
    v_b /= norm;

    let mut estimate = 0.0;
    for _ in 0..POWER_ITERATIONS {
        let u = margins(rows, &v_w, v_b);

        let mut next_w = vec![0.0; d];
        for (i, &ui) in u.iter().enumerate() {
            for (j, v) in rows.row(i).iter() {
                next_w[j] += v * ui;
            }
        }
        let next_b: f64 = u.iter().sum();

        let len = (next_w.iter().map(|v| v * v).sum::<f64>() + next_b * next_b).sqrt();
        if len == 0.0 {
            break;
        }
        estimate = len;
        v_w = next_w.into_iter().map(|v| v / len).collect();
        v_b = next_b / len;
    }
    estimate
}

fn soft_threshold(v: f64, t: f64) -> f64 {
    if v > t {
        v - t
    } else if v < -t {
        v + t
    } else {
        0.0
    }
}

impl Classifier for L1Logistic {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;
        if self.c <= 0.0 {
            return Err(ModelError::InvalidParameter(format!("C must be > 0, got {}", self.c)));
        }

        let mut rows = SparseRows::from_dense(x);
        let scales   = rows.column_max_abs();
        rows.scale_columns(&scales);

        let d    = x.ncols();
        let lam  = 1.0 / self.c;
        let lipschitz = (squared_spectral_norm(&rows) / 4.0).max(1e-12);
        let step = 1.0 / lipschitz;
        let thresholds: Vec<f64> = scales.iter().map(|s| step * lam / s).collect();

        let targets: Vec<f64> = y.iter().map(|&l| f64::from(l)).collect();

        // current iterate (w, b) in scaled coordinates, extrapolated point (z)
        let mut w      = vec![0.0; d];
        let mut b      = 0.0;
        let mut z_w    = w.clone();
        let mut z_b    = b;
        let mut t      = 1.0f64;
        let mut grad_w = vec![0.0; d];
        let mut converged = false;
        self.n_iter = self.max_iter;

        for iter in 0..self.max_iter {
            // ── gradient of the logistic loss at z ──────────────────────────────
            grad_w.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_b = 0.0;
            for (i, m) in margins(&rows, &z_w, z_b).into_iter().enumerate() {
                let r = sigmoid(m) - targets[i];
                for (j, v) in rows.row(i).iter() {
                    grad_w[j] += r * v;
                }
                grad_b += r;
            }

            // ── proximal step ───────────────────────────────────────────────────
            let new_w: Vec<f64> = z_w
                .iter()
                .zip(&grad_w)
                .zip(&thresholds)
                .map(|((&zj, &gj), &tj)| soft_threshold(zj - step * gj, tj))
                .collect();
            let new_b = z_b - step * grad_b;

            // ── momentum ────────────────────────────────────────────────────────
            let t_next   = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
            let momentum = (t - 1.0) / t_next;

            let mut change = (new_b - b).powi(2);
            let mut size   = new_b * new_b;
            for j in 0..d {
                let delta = new_w[j] - w[j];
                change += delta * delta;
                size   += new_w[j] * new_w[j];
                z_w[j] = new_w[j] + momentum * delta;
            }
            z_b = new_b + momentum * (new_b - b);

            w = new_w;
            b = new_b;
            t = t_next;

            if change.sqrt() <= self.tol * size.sqrt().max(1.0) {
                tracing::debug!("L1 logistic converged after {} iterations", iter + 1);
                converged   = true;
                self.n_iter = iter + 1;
                break;
            }
        }

        if !converged {
            tracing::warn!("L1 logistic regression did not converge in {} iterations", self.max_iter);
        }

        let w: Vec<f64> = w.iter().zip(&scales).map(|(u, s)| u / s).collect();
        self.coefficients = Some(Array1::from(w));
        self.intercept    = b;
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let w = self.coefficients.as_ref().ok_or(ModelError::NotFitted)?;
        check_width(w.len(), x)?;
        Ok((x.dot(w) + self.intercept).mapv(sigmoid))
    }
}
