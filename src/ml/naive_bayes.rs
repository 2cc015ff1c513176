// ============================================================
// Layer 5 - Naive Bayes Classifiers
// ============================================================
// Three event models over the same feature matrix:
//
//   MultinomialNb → features are (fractional) term counts
//                   log P(x|c) = Σ x_j · log θ_cj
//                   θ_cj = (N_cj + α) / (N_c + α·n_features)
//
//   GaussianNb    → each feature normal within a class
//                   var_cj += var_smoothing · max_j var(x_j)
//
//   BernoulliNb   → features binarised at a threshold
//                   θ_cj = (N_cj + α) / (N_c + 2α)
//                   absent terms contribute log(1 − θ_cj)
//
// Each model produces a joint log-likelihood per class:
//   jll_c(x) = log P(c) + log P(x|c)
// and P(spam|x) is the softmax over the two classes.
//
// Reference: McCallum & Nigam (1998), "A Comparison of Event
//            Models for Naive Bayes Text Classification"

use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::classifier::{check_training, check_width, sigmoid, Classifier};
use super::ModelError;

/// P(spam) from per-class joint log-likelihoods
fn posterior(jll: &Array2<f64>) -> Array1<f64> {
    jll.rows()
        .into_iter()
        .map(|r| sigmoid(r[1] - r[0]))
        .collect()
}

/// Per-class row sums and counts
fn class_sums(x: ArrayView2<'_, f64>, y: &[u8]) -> (Array2<f64>, [f64; 2]) {
    let mut sums   = Array2::<f64>::zeros((2, x.ncols()));
    let mut counts = [0.0; 2];
    for (row, &label) in x.rows().into_iter().zip(y) {
        let c = usize::from(label);
        let mut acc = sums.row_mut(c);
        acc += &row;
        counts[c] += 1.0;
    }
    (sums, counts)
}

fn log_priors(counts: &[f64; 2]) -> Array1<f64> {
    let n = counts[0] + counts[1];
    Array1::from(vec![(counts[0] / n).ln(), (counts[1] / n).ln()])
}

// ─── MultinomialNb ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MultinomialNb {
    alpha:            f64,
    class_log_prior:  Option<Array1<f64>>,
    /// (2 × n_features) log θ
    feature_log_prob: Option<Array2<f64>>,
}

impl MultinomialNb {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, class_log_prior: None, feature_log_prob: None }
    }

    fn joint_log_likelihood(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ModelError> {
        let (Some(prior), Some(flp)) = (&self.class_log_prior, &self.feature_log_prob) else {
            return Err(ModelError::NotFitted);
        };
        check_width(flp.ncols(), x)?;
        Ok(x.dot(&flp.t()) + prior)
    }
}

impl Classifier for MultinomialNb {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;
        if self.alpha < 0.0 {
            return Err(ModelError::InvalidParameter(format!("alpha must be >= 0, got {}", self.alpha)));
        }
        if x.iter().any(|&v| v < 0.0) {
            return Err(ModelError::NegativeFeature);
        }

        let (sums, counts) = class_sums(x, y);
        let smoothed   = sums.mapv(|v| v + self.alpha);
        let totals     = smoothed.sum_axis(Axis(1)).insert_axis(Axis(1));
        let flp        = (&smoothed / &totals).mapv(f64::ln);

        self.class_log_prior  = Some(log_priors(&counts));
        self.feature_log_prob = Some(flp);
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        Ok(posterior(&self.joint_log_likelihood(x)?))
    }
}

// ─── GaussianNb ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GaussianNb {
    var_smoothing:   f64,
    class_log_prior: Option<Array1<f64>>,
    theta:           Option<Array2<f64>>,
    var:             Option<Array2<f64>>,
}

impl GaussianNb {
    pub fn new(var_smoothing: f64) -> Self {
        Self { var_smoothing, class_log_prior: None, theta: None, var: None }
    }
}

impl Classifier for GaussianNb {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;

        let (sums, counts) = class_sums(x, y);
        let mut theta = sums;
        for c in 0..2 {
            let mut row = theta.row_mut(c);
            row /= counts[c];
        }

        let mut var = Array2::<f64>::zeros((2, x.ncols()));
        for (row, &label) in x.rows().into_iter().zip(y) {
            let c = usize::from(label);
            let diff = &row - &theta.row(c);
            let mut acc = var.row_mut(c);
            acc += &diff.mapv(|d| d * d);
        }
        for c in 0..2 {
            let mut row = var.row_mut(c);
            row /= counts[c];
        }

        // the epsilon follows the widest feature over the whole set
        let max_var = x
            .var_axis(Axis(0), 0.0)
            .iter()
            .fold(0.0f64, |a, &b| a.max(b));
        let epsilon = self.var_smoothing * max_var;
        var.mapv_inplace(|v| v + epsilon);

        if var.iter().any(|&v| v <= 0.0) {
            tracing::warn!("GaussianNb: zero variance feature with zero smoothing");
            return Err(ModelError::InvalidParameter(
                "variance is zero for a feature; increase var_smoothing".to_string(),
            ));
        }

        self.class_log_prior = Some(log_priors(&counts));
        self.theta           = Some(theta);
        self.var             = Some(var);
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let (Some(prior), Some(theta), Some(var)) = (&self.class_log_prior, &self.theta, &self.var)
        else {
            return Err(ModelError::NotFitted);
        };
        check_width(theta.ncols(), x)?;

        let log_norm: Vec<f64> = (0..2)
            .map(|c| -0.5 * var.row(c).iter().map(|v| (2.0 * std::f64::consts::PI * v).ln()).sum::<f64>())
            .collect();

        let mut jll = Array2::<f64>::zeros((x.nrows(), 2));
        for (i, row) in x.rows().into_iter().enumerate() {
            for c in 0..2 {
                let quad: f64 = row
                    .iter()
                    .zip(theta.row(c))
                    .zip(var.row(c))
                    .map(|((&v, &m), &s)| (v - m) * (v - m) / s)
                    .sum();
                jll[[i, c]] = prior[c] + log_norm[c] - 0.5 * quad;
            }
        }
        Ok(posterior(&jll))
    }
}

// ─── BernoulliNb ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BernoulliNb {
    alpha:            f64,
    binarize:         f64,
    class_log_prior:  Option<Array1<f64>>,
    feature_log_prob: Option<Array2<f64>>,
    /// log(1 − θ)
    neg_log_prob:     Option<Array2<f64>>,
}

impl BernoulliNb {
    pub fn new(alpha: f64, binarize: f64) -> Self {
        Self {
            alpha,
            binarize,
            class_log_prior: None,
            feature_log_prob: None,
            neg_log_prob: None,
        }
    }

    fn binarized(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        x.mapv(|v| if v > self.binarize { 1.0 } else { 0.0 })
    }
}

impl Classifier for BernoulliNb {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;
        if self.alpha <= 0.0 {
            return Err(ModelError::InvalidParameter(format!("alpha must be > 0, got {}", self.alpha)));
        }

        let xb = self.binarized(x);
        let (sums, counts) = class_sums(xb.view(), y);

        let mut flp = Array2::<f64>::zeros(sums.raw_dim());
        for c in 0..2 {
            let denom = counts[c] + 2.0 * self.alpha;
            for (out, &n) in flp.row_mut(c).iter_mut().zip(sums.row(c)) {
                *out = ((n + self.alpha) / denom).ln();
            }
        }
        let neg = flp.mapv(|l| (1.0 - l.exp()).ln());

        self.class_log_prior  = Some(log_priors(&counts));
        self.feature_log_prob = Some(flp);
        self.neg_log_prob     = Some(neg);
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let (Some(prior), Some(flp), Some(neg)) =
            (&self.class_log_prior, &self.feature_log_prob, &self.neg_log_prob)
        else {
            return Err(ModelError::NotFitted);
        };
        check_width(flp.ncols(), x)?;

        let xb    = self.binarized(x);
        let delta = flp - neg;
        let base  = neg.sum_axis(Axis(1)) + prior;
        let jll   = xb.dot(&delta.t()) + &base;
        Ok(posterior(&jll))
    }
}
