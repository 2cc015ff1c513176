// ============================================================
// Layer 5 - Classifier Trait and Model Zoo
// ============================================================
// Every model in the comparison implements `Classifier`:
//
//   fit(x, y)          → learn from a dense feature matrix and
//                        0/1 labels (0 = ham, 1 = spam)
//   predict_proba(x)   → P(spam) for every row
//   predict(x)         → hard labels; by default P(spam) > 0.5
//
// Models are described by `ModelKind`, a plain serde enum, so
// the pipeline config can name ensemble members and the final
// stacking estimator in JSON. `ModelKind::build()` turns a
// description into a fresh, unfitted model.
//
// The default zoo has eleven entries, keyed by the short names
// used in every printed table:
//
//   SVC  KN  NB  DT  LR  RF  AdaBoost  BgC  ETC  GBDT  xgb
//
// Reference: Rust Book §17 (Trait Objects)
//            serde documentation (internally tagged enums)

use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::boosting::{AdaBoost, GradientBoosting};
use super::ensemble::{StackingClassifier, VotingClassifier};
use super::forest::{ForestConfig, TreeEnsemble};
use super::knn::KNeighbors;
use super::logistic::L1Logistic;
use super::naive_bayes::{BernoulliNb, GaussianNb, MultinomialNb};
use super::svm::{SigmoidSvc, SvcParams};
use super::tree::{DecisionTree, TreeConfig};
use super::xgboost::{XgBoost, XgbParams};
use super::ModelError;

/// A binary classifier over dense f64 features
pub trait Classifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError>;

    /// Probability of the spam class for every row
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError>;

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u8>, ModelError> {
        let proba = self.predict_proba(x)?;
        Ok(proba.iter().map(|&p| u8::from(p > 0.5)).collect())
    }
}

// ─── Input validation shared by the models ────────────────────────────────────

/// Rejects empty input, length mismatches, labels outside {0, 1}
/// and single-class label sets.
pub(crate) fn check_training(x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
    if x.nrows() == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(ModelError::DimensionMismatch { expected: x.nrows(), got: y.len() });
    }
    if let Some(&bad) = y.iter().find(|&&label| label > 1) {
        return Err(ModelError::InvalidLabel(bad));
    }
    if !y.contains(&0) || !y.contains(&1) {
        return Err(ModelError::SingleClass);
    }
    Ok(())
}

pub(crate) fn check_width(expected: usize, x: ArrayView2<'_, f64>) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::DimensionMismatch { expected, got: x.ncols() });
    }
    Ok(())
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

// ─── Model descriptions ───────────────────────────────────────────────────────

/// Which model to build, with its hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelKind {
    Svc { c: f64, gamma: f64, coef0: f64, tol: f64 },
    KNeighbors { k: usize },
    MultinomialNb { alpha: f64 },
    GaussianNb { var_smoothing: f64 },
    BernoulliNb { alpha: f64, binarize: f64 },
    DecisionTree { max_depth: Option<usize>, seed: u64 },
    LogisticL1 { c: f64, max_iter: usize, tol: f64 },
    RandomForest { n_trees: usize, seed: u64 },
    ExtraTrees { n_trees: usize, seed: u64 },
    Bagging { n_trees: usize, seed: u64 },
    AdaBoost { n_rounds: usize, learning_rate: f64 },
    GradientBoosting { n_stages: usize, learning_rate: f64, max_depth: usize },
    XgBoost {
        n_rounds:         usize,
        eta:              f64,
        max_depth:        usize,
        lambda:           f64,
        min_child_weight: f64,
    },
    Voting { members: Vec<ModelSpec> },
    Stacking {
        members:         Vec<ModelSpec>,
        final_estimator: Box<ModelKind>,
        folds:           usize,
    },
}

impl ModelKind {
    /// A fresh, unfitted model
    pub fn build(&self) -> Box<dyn Classifier> {
        match self {
            ModelKind::Svc { c, gamma, coef0, tol } => Box::new(SigmoidSvc::new(SvcParams {
                c:     *c,
                gamma: *gamma,
                coef0: *coef0,
                tol:   *tol,
                ..SvcParams::default()
            })),
            ModelKind::KNeighbors { k } => Box::new(KNeighbors::new(*k)),
            ModelKind::MultinomialNb { alpha } => Box::new(MultinomialNb::new(*alpha)),
            ModelKind::GaussianNb { var_smoothing } => Box::new(GaussianNb::new(*var_smoothing)),
            ModelKind::BernoulliNb { alpha, binarize } => {
                Box::new(BernoulliNb::new(*alpha, *binarize))
            }
            ModelKind::DecisionTree { max_depth, seed } => Box::new(DecisionTree::new(TreeConfig {
                max_depth: *max_depth,
                seed:      *seed,
                ..TreeConfig::default()
            })),
            ModelKind::LogisticL1 { c, max_iter, tol } => {
                Box::new(L1Logistic::new(*c, *max_iter, *tol))
            }
            ModelKind::RandomForest { n_trees, seed } => {
                Box::new(TreeEnsemble::new(ForestConfig::random_forest(*n_trees, *seed)))
            }
            ModelKind::ExtraTrees { n_trees, seed } => {
                Box::new(TreeEnsemble::new(ForestConfig::extra_trees(*n_trees, *seed)))
            }
            ModelKind::Bagging { n_trees, seed } => {
                Box::new(TreeEnsemble::new(ForestConfig::bagging(*n_trees, *seed)))
            }
            ModelKind::AdaBoost { n_rounds, learning_rate } => {
                Box::new(AdaBoost::new(*n_rounds, *learning_rate))
            }
            ModelKind::GradientBoosting { n_stages, learning_rate, max_depth } => {
                Box::new(GradientBoosting::new(*n_stages, *learning_rate, *max_depth))
            }
            ModelKind::XgBoost { n_rounds, eta, max_depth, lambda, min_child_weight } => {
                Box::new(XgBoost::new(XgbParams {
                    n_rounds:         *n_rounds,
                    eta:              *eta,
                    max_depth:        *max_depth,
                    lambda:           *lambda,
                    min_child_weight: *min_child_weight,
                }))
            }
            ModelKind::Voting { members } => Box::new(VotingClassifier::new(members.clone())),
            ModelKind::Stacking { members, final_estimator, folds } => Box::new(
                StackingClassifier::new(members.clone(), (**final_estimator).clone(), *folds),
            ),
        }
    }
}

/// A model description with the short name shown in reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub kind: ModelKind,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, kind: ModelKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// The eleven comparison models. `seed` drives every randomised one.
pub fn default_zoo(seed: u64) -> Vec<ModelSpec> {
    vec![
        ModelSpec::new("SVC", ModelKind::Svc { c: 1.0, gamma: 1.0, coef0: 0.0, tol: 1e-3 }),
        ModelSpec::new("KN", ModelKind::KNeighbors { k: 5 }),
        ModelSpec::new("NB", ModelKind::MultinomialNb { alpha: 1.0 }),
        ModelSpec::new("DT", ModelKind::DecisionTree { max_depth: Some(5), seed }),
        ModelSpec::new("LR", ModelKind::LogisticL1 { c: 1.0, max_iter: 1000, tol: 1e-4 }),
        ModelSpec::new("RF", ModelKind::RandomForest { n_trees: 50, seed }),
        ModelSpec::new("AdaBoost", ModelKind::AdaBoost { n_rounds: 50, learning_rate: 1.0 }),
        ModelSpec::new("BgC", ModelKind::Bagging { n_trees: 50, seed }),
        ModelSpec::new("ETC", ModelKind::ExtraTrees { n_trees: 50, seed }),
        ModelSpec::new(
            "GBDT",
            ModelKind::GradientBoosting { n_stages: 50, learning_rate: 0.1, max_depth: 3 },
        ),
        ModelSpec::new(
            "xgb",
            ModelKind::XgBoost {
                n_rounds:         50,
                eta:              0.3,
                max_depth:        6,
                lambda:           1.0,
                min_child_weight: 1.0,
            },
        ),
    ]
}

/// Look a model up by its short name
pub fn find_spec<'a>(zoo: &'a [ModelSpec], name: &str) -> Option<&'a ModelSpec> {
    zoo.iter().find(|s| s.name == name)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_zoo_names() {
        let names: Vec<String> = default_zoo(2).into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["SVC", "KN", "NB", "DT", "LR", "RF", "AdaBoost", "BgC", "ETC", "GBDT", "xgb"]
        );
    }

    #[test]
    fn test_model_kind_json() {
        let kind: ModelKind =
            serde_json::from_str(r#"{"model":"random_forest","n_trees":100,"seed":2}"#).unwrap();
        assert_eq!(kind, ModelKind::RandomForest { n_trees: 100, seed: 2 });

        let json = serde_json::to_string(&ModelKind::KNeighbors { k: 5 }).unwrap();
        assert_eq!(json, r#"{"model":"k_neighbors","k":5}"#);
    }

    #[test]
    fn test_check_training() {
        let x = array![[1.0], [2.0]];
        assert!(check_training(x.view(), &[0, 1]).is_ok());
        assert_eq!(check_training(x.view(), &[0, 0]), Err(ModelError::SingleClass));
        assert_eq!(check_training(x.view(), &[0, 2]), Err(ModelError::InvalidLabel(2)));
        assert_eq!(
            check_training(x.view(), &[0]),
            Err(ModelError::DimensionMismatch { expected: 2, got: 1 })
        );
        let empty = ndarray::Array2::<f64>::zeros((0, 1));
        assert_eq!(check_training(empty.view(), &[]), Err(ModelError::EmptyTrainingSet));
    }

    #[test]
    fn test_find_spec() {
        let zoo = default_zoo(2);
        assert!(find_spec(&zoo, "ETC").is_some());
        assert!(find_spec(&zoo, "nope").is_none());
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(1000.0) <= 1.0);
    }
}
