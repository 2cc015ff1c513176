// ============================================================
// Layer 5 - Voting and Stacking Ensembles
// ============================================================
// Both ensembles are built from `ModelSpec`s so the members can
// be named in the pipeline config.
//
// Soft voting:
//
//   P(spam | x) = mean over members of P_m(spam | x)
//
// Stacking:
//
//   1. split the training rows into k stratified folds
//   2. for every fold, fit fresh members on the other folds and
//      predict P(spam) for the held-out rows
//      → an out-of-fold meta matrix, one column per member
//   3. fit the final estimator on the meta matrix
//   4. refit every member on the whole training set
//
//   predict: members → meta row → final estimator
//
// Reference: Wolpert (1992), "Stacked Generalization"

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::data::splitter::stratified_folds;

use super::classifier::{check_training, Classifier, ModelKind, ModelSpec};
use super::ModelError;

type Member = (String, Box<dyn Classifier>);

fn build_members(specs: &[ModelSpec]) -> Vec<Member> {
    specs.iter().map(|s| (s.name.clone(), s.kind.build())).collect()
}

/// Stacks every member's P(spam) as one column
fn member_probabilities(
    members: &[Member],
    x:       ArrayView2<'_, f64>,
) -> Result<Array2<f64>, ModelError> {
    let mut meta = Array2::<f64>::zeros((x.nrows(), members.len()));
    for (col, (_, model)) in members.iter().enumerate() {
        meta.column_mut(col).assign(&model.predict_proba(x)?);
    }
    Ok(meta)
}

// ─── Soft voting ──────────────────────────────────────────────────────────────

pub struct VotingClassifier {
    specs:   Vec<ModelSpec>,
    members: Vec<Member>,
}

impl VotingClassifier {
    pub fn new(specs: Vec<ModelSpec>) -> Self {
        Self { specs, members: Vec::new() }
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }
}

impl Classifier for VotingClassifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;
        if self.specs.is_empty() {
            return Err(ModelError::InvalidParameter("voting needs at least one member".to_string()));
        }

        let mut members = build_members(&self.specs);
        for (name, model) in members.iter_mut() {
            tracing::debug!("Voting: fitting {}", name);
            model.fit(x, y)?;
        }
        self.members = members;
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        if self.members.is_empty() {
            return Err(ModelError::NotFitted);
        }
        let meta = member_probabilities(&self.members, x)?;
        meta.mean_axis(Axis(1)).ok_or(ModelError::NotFitted)
    }
}

// ─── Stacking ─────────────────────────────────────────────────────────────────

pub struct StackingClassifier {
    specs:      Vec<ModelSpec>,
    final_kind: ModelKind,
    folds:      usize,
    members:    Vec<Member>,
    final_est:  Option<Box<dyn Classifier>>,
}

impl StackingClassifier {
    pub fn new(specs: Vec<ModelSpec>, final_kind: ModelKind, folds: usize) -> Self {
        Self { specs, final_kind, folds, members: Vec::new(), final_est: None }
    }

    /// Out-of-fold P(spam) of every member for every training row
    fn out_of_fold(&self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<Array2<f64>, ModelError> {
        let mut meta = Array2::<f64>::zeros((x.nrows(), self.specs.len()));

        for (k, fold) in stratified_folds(y, self.folds).iter().enumerate() {
            let x_fit = x.select(Axis(0), &fold.train);
            let y_fit: Vec<u8> = fold.train.iter().map(|&i| y[i]).collect();
            let x_out = x.select(Axis(0), &fold.test);

            let mut members = build_members(&self.specs);
            for (name, model) in members.iter_mut() {
                tracing::debug!("Stacking fold {}: fitting {}", k + 1, name);
                model.fit(x_fit.view(), &y_fit)?;
            }

            let fold_meta = member_probabilities(&members, x_out.view())?;
            for (row, &i) in fold.test.iter().enumerate() {
                meta.row_mut(i).assign(&fold_meta.row(row));
            }
        }
        Ok(meta)
    }
}

impl Classifier for StackingClassifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;
        if self.specs.is_empty() {
            return Err(ModelError::InvalidParameter("stacking needs at least one member".to_string()));
        }
        if self.folds < 2 {
            return Err(ModelError::InvalidParameter(format!(
                "stacking needs at least 2 folds, got {}",
                self.folds
            )));
        }

        // ── level 1: meta features from held-out predictions ──
        let meta = self.out_of_fold(x, y)?;

        // ── level 2: final estimator ──
        let mut final_est = self.final_kind.build();
        final_est.fit(meta.view(), y)?;

        // ── members refit on everything ──
        let mut members = build_members(&self.specs);
        for (_, model) in members.iter_mut() {
            model.fit(x, y)?;
        }

        self.members   = members;
        self.final_est = Some(final_est);
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let final_est = self.final_est.as_ref().ok_or(ModelError::NotFitted)?;
        let meta = member_probabilities(&self.members, x)?;
        final_est.predict_proba(meta.view())
    }
}
