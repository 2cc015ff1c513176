// ============================================================
// Layer 5 - Support Vector Classifier
// ============================================================
// C-SVM with the sigmoid kernel:
//
//   K(a, b) = tanh(γ·⟨a, b⟩ + r)
//
// Dual problem (labels y ∈ {−1, +1}, spam = +1):
//
//   min ½ αᵀQα − Σα   s.t.  0 ≤ α ≤ C,  Σ yα = 0
//   Q_ij = y_i y_j K(x_i, x_j)
//
// Solved with SMO: every iteration picks the maximal violating
// pair (second-order working set selection), solves the two
// variable sub-problem analytically and updates the gradient.
// The sigmoid kernel is not positive semi-definite, so a
// non-positive curvature is replaced by a small constant.
//
// The kernel matrix is computed once, stored as f32.
//
// Decision function:  f(x) = Σ α_i y_i K(x_i, x) − ρ
// `predict` uses sign(f). `predict_proba` maps f through a
// sigmoid fitted to the training decision values (Platt).
//
// Reference: Fan, Chen & Lin (2005), "Working Set Selection
//            Using Second Order Information for Training SVM"
//            Lin, Lin & Weng (2007), "A Note on Platt's
//            Probabilistic Outputs for Support Vector Machines"

use ndarray::{Array1, ArrayView2};

use super::classifier::{check_training, check_width, Classifier};
use super::sparse::SparseRows;
use super::ModelError;

const TAU: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub struct SvcParams {
    pub c:        f64,
    pub gamma:    f64,
    pub coef0:    f64,
    /// stopping tolerance on the maximal violation
    pub tol:      f64,
    pub max_iter: Option<usize>,
}

impl Default for SvcParams {
    fn default() -> Self {
        Self { c: 1.0, gamma: 1.0, coef0: 0.0, tol: 1e-3, max_iter: None }
    }
}

struct Fitted {
    /// transpose of the support vector matrix
    support_t: SparseRows,
    /// α_i · y_i for each support vector
    dual_coef: Vec<f64>,
    rho:       f64,
    platt_a:   f64,
    platt_b:   f64,
    n_cols:    usize,
}

pub struct SigmoidSvc {
    params: SvcParams,
    fitted: Option<Fitted>,
}

impl SigmoidSvc {
    pub fn new(params: SvcParams) -> Self {
        Self { params, fitted: None }
    }

    fn kernel(&self, dot: f64) -> f64 {
        (self.params.gamma * dot + self.params.coef0).tanh()
    }

    /// f(x) for every row of `x`
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let fit = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        check_width(fit.n_cols, x)?;

        let queries = SparseRows::from_dense(x);
        let mut dots = vec![0.0; fit.dual_coef.len()];
        let mut out  = Array1::<f64>::zeros(x.nrows());

        for q in 0..queries.n_rows() {
            fit.support_t.transposed_dots(queries.row(q), &mut dots);
            let sum: f64 = dots
                .iter()
                .zip(&fit.dual_coef)
                .map(|(&d, &coef)| coef * self.kernel(d))
                .sum();
            out[q] = sum - fit.rho;
        }
        Ok(out)
    }

    pub fn n_support(&self) -> usize {
        self.fitted.as_ref().map_or(0, |f| f.dual_coef.len())
    }
}

impl Classifier for SigmoidSvc {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;
        if self.params.c <= 0.0 {
            return Err(ModelError::InvalidParameter(format!("C must be > 0, got {}", self.params.c)));
        }

        let rows  = SparseRows::from_dense(x);
        let signs: Vec<f64> = y.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect();
        let gram  = self.gram_matrix(&rows);

        let solution = Smo::new(&gram, &signs, self.params).solve();

        let support: Vec<usize> = (0..y.len()).filter(|&i| solution.alpha[i] > 0.0).collect();
        let dual_coef: Vec<f64> = support.iter().map(|&i| solution.alpha[i] * signs[i]).collect();
        tracing::debug!(
            "SVC: {} support vectors of {} rows, rho={:.4}, {} iterations",
            support.len(),
            y.len(),
            solution.rho,
            solution.iterations
        );

        // training decision values straight from the gradient:
        // f(x_i) = y_i·(G_i + 1) − ρ
        let decisions: Vec<f64> = (0..y.len())
            .map(|i| signs[i] * (solution.gradient[i] + 1.0) - solution.rho)
            .collect();
        let (platt_a, platt_b) = platt_scaling(&decisions, y);

        self.fitted = Some(Fitted {
            support_t: rows.select(&support).transpose(),
            dual_coef,
            rho: solution.rho,
            platt_a,
            platt_b,
            n_cols: x.ncols(),
        });
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let fit = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        let decisions = self.decision_function(x)?;
        Ok(decisions.mapv(|f| platt_probability(f, fit.platt_a, fit.platt_b)))
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u8>, ModelError> {
        let decisions = self.decision_function(x)?;
        Ok(decisions.iter().map(|&f| u8::from(f > 0.0)).collect())
    }
}

impl SigmoidSvc {
    /// Row-major n × n kernel matrix
    fn gram_matrix(&self, rows: &SparseRows) -> Vec<f32> {
        let n = rows.n_rows();
        let columns = rows.transpose();
        let mut gram = vec![0.0f32; n * n];
        let mut dots = vec![0.0; n];

        for i in 0..n {
            columns.transposed_dots(rows.row(i), &mut dots);
            for (slot, &d) in gram[i * n..(i + 1) * n].iter_mut().zip(&dots) {
                *slot = self.kernel(d) as f32;
            }
        }
        gram
    }
}

// ─── SMO solver ───────────────────────────────────────────────────────────────

struct Solution {
    alpha:      Vec<f64>,
    gradient:   Vec<f64>,
    rho:        f64,
    iterations: usize,
}

struct Smo<'a> {
    gram:     &'a [f32],
    y:        &'a [f64],
    n:        usize,
    c:        f64,
    tol:      f64,
    max_iter: usize,
    alpha:    Vec<f64>,
    grad:     Vec<f64>,
}

impl<'a> Smo<'a> {
    fn new(gram: &'a [f32], y: &'a [f64], params: SvcParams) -> Self {
        let n = y.len();
        Self {
            gram,
            y,
            n,
            c: params.c,
            tol: params.tol,
            max_iter: params.max_iter.unwrap_or_else(|| (100 * n).max(100_000)),
            alpha: vec![0.0; n],
            // α = 0 → G = Qα − e = −e
            grad: vec![-1.0; n],
        }
    }

    fn k(&self, i: usize, j: usize) -> f64 {
        f64::from(self.gram[i * self.n + j])
    }

    /// Q_ij
    fn q(&self, i: usize, j: usize) -> f64 {
        self.y[i] * self.y[j] * self.k(i, j)
    }

    fn in_up(&self, t: usize) -> bool {
        (self.y[t] > 0.0 && self.alpha[t] < self.c) || (self.y[t] < 0.0 && self.alpha[t] > 0.0)
    }

    fn in_low(&self, t: usize) -> bool {
        (self.y[t] > 0.0 && self.alpha[t] > 0.0) || (self.y[t] < 0.0 && self.alpha[t] < self.c)
    }

    /// Maximal violating pair, or None once the violation is below tol
    fn select_working_set(&self) -> Option<(usize, usize)> {
        let mut g_max = f64::NEG_INFINITY;
        let mut i_sel = None;
        for t in 0..self.n {
            if self.in_up(t) {
                let v = -self.y[t] * self.grad[t];
                if v >= g_max {
                    g_max = v;
                    i_sel = Some(t);
                }
            }
        }
        let i = i_sel?;

        let mut g_max2  = f64::NEG_INFINITY;
        let mut obj_min = f64::INFINITY;
        let mut j_sel   = None;
        let qd_i = self.k(i, i);

        for t in 0..self.n {
            if !self.in_low(t) {
                continue;
            }
            let v = self.y[t] * self.grad[t];
            if v >= g_max2 {
                g_max2 = v;
            }
            let grad_diff = g_max + v;
            if grad_diff > 0.0 {
                // y_i·y_t·Q_it = K_it, whichever classes i and t are in
                let quad = qd_i + self.k(t, t) - 2.0 * self.k(i, t);
                let quad = if quad > 0.0 { quad } else { TAU };
                let obj = -(grad_diff * grad_diff) / quad;
                if obj <= obj_min {
                    obj_min = obj;
                    j_sel = Some(t);
                }
            }
        }

        if g_max + g_max2 < self.tol {
            return None;
        }
        j_sel.map(|j| (i, j))
    }

    fn update_pair(&mut self, i: usize, j: usize) {
        let c = self.c;
        let (old_i, old_j) = (self.alpha[i], self.alpha[j]);
        let q_ij = self.q(i, j);
        let (qd_i, qd_j) = (self.k(i, i), self.k(j, j));

        if self.y[i] != self.y[j] {
            let mut quad = qd_i + qd_j + 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (-self.grad[i] - self.grad[j]) / quad;
            let diff  = old_i - old_j;
            let (mut ai, mut aj) = (old_i + delta, old_j + delta);

            if diff > 0.0 {
                if aj < 0.0 {
                    aj = 0.0;
                    ai = diff;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = -diff;
            }
            if diff > 0.0 {
                if ai > c {
                    ai = c;
                    aj = c - diff;
                }
            } else if aj > c {
                aj = c;
                ai = c + diff;
            }
            self.alpha[i] = ai;
            self.alpha[j] = aj;
        } else {
            let mut quad = qd_i + qd_j - 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (self.grad[i] - self.grad[j]) / quad;
            let sum   = old_i + old_j;
            let (mut ai, mut aj) = (old_i - delta, old_j + delta);

            if sum > c {
                if ai > c {
                    ai = c;
                    aj = sum - c;
                }
            } else if aj < 0.0 {
                aj = 0.0;
                ai = sum;
            }
            if sum > c {
                if aj > c {
                    aj = c;
                    ai = sum - c;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = sum;
            }
            self.alpha[i] = ai;
            self.alpha[j] = aj;
        }

        let d_i = self.alpha[i] - old_i;
        let d_j = self.alpha[j] - old_j;
        for t in 0..self.n {
            self.grad[t] += self.q(i, t) * d_i + self.q(j, t) * d_j;
        }
    }

    fn rho(&self) -> f64 {
        let mut n_free   = 0usize;
        let mut sum_free = 0.0;
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;

        for t in 0..self.n {
            let yg = self.y[t] * self.grad[t];
            if self.alpha[t] >= self.c {
                if self.y[t] < 0.0 { ub = ub.min(yg) } else { lb = lb.max(yg) }
            } else if self.alpha[t] <= 0.0 {
                if self.y[t] > 0.0 { ub = ub.min(yg) } else { lb = lb.max(yg) }
            } else {
                n_free   += 1;
                sum_free += yg;
            }
        }

        if n_free > 0 { sum_free / n_free as f64 } else { (ub + lb) / 2.0 }
    }

    fn solve(mut self) -> Solution {
        let mut iterations = 0;
        while iterations < self.max_iter {
            let Some((i, j)) = self.select_working_set() else {
                break;
            };
            self.update_pair(i, j);
            iterations += 1;
        }
        if iterations >= self.max_iter {
            tracing::warn!("SVC: SMO stopped at the iteration limit ({})", self.max_iter);
        }

        let rho = self.rho();
        Solution { alpha: self.alpha, gradient: self.grad, rho, iterations }
    }
}

// ─── Platt scaling ────────────────────────────────────────────────────────────

fn platt_probability(f: f64, a: f64, b: f64) -> f64 {
    let fapb = f * a + b;
    if fapb >= 0.0 {
        let e = (-fapb).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + fapb.exp())
    }
}

/// Fit P(spam | f) = 1 / (1 + exp(A·f + B)) by Newton's method
/// with a backtracking line search.
fn platt_scaling(decisions: &[f64], labels: &[u8]) -> (f64, f64) {
    const MAX_ITER: usize = 100;
    const MIN_STEP: f64   = 1e-10;
    const SIGMA: f64      = 1e-12;
    const EPS: f64        = 1e-5;

    let prior1 = labels.iter().filter(|&&l| l == 1).count() as f64;
    let prior0 = labels.len() as f64 - prior1;
    let hi = (prior1 + 1.0) / (prior1 + 2.0);
    let lo = 1.0 / (prior0 + 2.0);
    let targets: Vec<f64> = labels.iter().map(|&l| if l == 1 { hi } else { lo }).collect();

    let objective = |a: f64, b: f64| -> f64 {
        decisions
            .iter()
            .zip(&targets)
            .map(|(&f, &t)| {
                let fapb = f * a + b;
                if fapb >= 0.0 {
                    t * fapb + (1.0 + (-fapb).exp()).ln()
                } else {
                    (t - 1.0) * fapb + (1.0 + fapb.exp()).ln()
                }
            })
            .sum()
    };

    let mut a = 0.0;
    let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
    let mut fval = objective(a, b);

    for _ in 0..MAX_ITER {
        let (mut h11, mut h22, mut h21) = (SIGMA, SIGMA, 0.0);
        let (mut g1, mut g2) = (0.0, 0.0);

        for (&f, &t) in decisions.iter().zip(&targets) {
            let p  = platt_probability(f, a, b);
            let d2 = p * (1.0 - p);
            h11 += f * f * d2;
            h22 += d2;
            h21 += f * d2;
            let d1 = t - p;
            g1 += f * d1;
            g2 += d1;
        }

        if g1.abs() < EPS && g2.abs() < EPS {
            break;
        }

        let det = h11 * h22 - h21 * h21;
        let da  = -(h22 * g1 - h21 * g2) / det;
        let db  = -(-h21 * g1 + h11 * g2) / det;
        let gd  = g1 * da + g2 * db;

        let mut step = 1.0;
        while step >= MIN_STEP {
            let (na, nb) = (a + step * da, b + step * db);
            let new_f = objective(na, nb);
            if new_f < fval + 1e-4 * step * gd {
                a = na;
                b = nb;
                fval = new_f;
                break;
            }
            step /= 2.0;
        }
        if step < MIN_STEP {
            tracing::warn!("Platt scaling: line search failed");
            break;
        }
    }

    (a, b)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    // Non-negative, roughly unit-norm rows like TF-IDF output:
    // spam lives on the first two features, ham on the last two.
    fn tfidf_like() -> (Array2<f64>, Vec<u8>) {
        let x = array![
            [0.9, 0.4, 0.0, 0.0],
            [0.7, 0.7, 0.0, 0.0],
            [0.4, 0.9, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.9, 0.4],
            [0.0, 0.0, 0.7, 0.7],
            [0.0, 0.0, 0.4, 0.9],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.1, 1.0, 0.0],
            [0.0, 0.0, 0.6, 0.8],
        ];
        (x, vec![1, 1, 1, 1, 0, 0, 0, 0, 0, 0])
    }

    #[test]
    fn test_separates_tfidf_like_data() {
        let (x, y) = tfidf_like();
        let mut svc = SigmoidSvc::new(SvcParams::default());
        svc.fit(x.view(), &y).unwrap();
        assert!(svc.n_support() > 0);
        assert_eq!(svc.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn test_probabilities_follow_decisions() {
        let (x, y) = tfidf_like();
        let mut svc = SigmoidSvc::new(SvcParams::default());
        svc.fit(x.view(), &y).unwrap();

        let d = svc.decision_function(x.view()).unwrap();
        let p = svc.predict_proba(x.view()).unwrap();
        assert!(p.iter().all(|&v| (0.0..=1.0).contains(&v)));

        // Platt is monotone, so the order of rows is the same
        let (hi, lo) = if d[0] > d[4] { (0, 4) } else { (4, 0) };
        assert!(p[hi] >= p[lo]);
    }

    #[test]
    fn test_dual_constraints_hold() {
        let (x, y) = tfidf_like();
        let rows  = SparseRows::from_dense(x.view());
        let signs: Vec<f64> = y.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect();
        let svc   = SigmoidSvc::new(SvcParams::default());
        let gram  = svc.gram_matrix(&rows);
        let sol   = Smo::new(&gram, &signs, SvcParams::default()).solve();

        let balance: f64 = sol.alpha.iter().zip(&signs).map(|(a, s)| a * s).sum();
        assert!(balance.abs() < 1e-9);
        assert!(sol.alpha.iter().all(|&a| (0.0..=1.0).contains(&a)));
    }

    #[test]
    fn test_platt_prefers_positive_decisions() {
        let f = [2.0, 1.5, 1.0, -1.0, -1.5, -2.0];
        let y = [1, 1, 1, 0, 0, 0];
        let (a, b) = platt_scaling(&f, &y);
        assert!(a < 0.0);
        assert!(platt_probability(2.0, a, b) > 0.5);
        assert!(platt_probability(-2.0, a, b) < 0.5);
    }

    #[test]
    fn test_unfitted() {
        let svc = SigmoidSvc::new(SvcParams::default());
        assert!(matches!(svc.predict(array![[1.0]].view()), Err(ModelError::NotFitted)));
    }
}
