// ============================================================
// Layer 5 - ML / Model Layer
// ============================================================
// Every classifier the comparison runs, plus the code that
// scores them. No other layer does model math.
//
// What's in this layer:
//
//   classifier.rs  - The Classifier trait, ModelKind (a serde
//                    description of a model and its settings)
//                    and the default eleven-model zoo
//
//   sparse.rs      - Compressed sparse rows; TF-IDF matrices
//                    are mostly zeros
//
//   naive_bayes.rs - Multinomial, Gaussian and Bernoulli NB
//   knn.rs         - k-nearest neighbours
//   svm.rs         - Sigmoid-kernel SVM (SMO) + Platt scaling
//   logistic.rs    - L1 logistic regression (FISTA)
//   tree.rs        - CART growth shared by every tree model
//   forest.rs      - Random forest, extra trees, bagging
//   boosting.rs    - AdaBoost (SAMME) and gradient boosting
//   xgboost.rs     - Second-order boosting with L2 leaves
//   ensemble.rs    - Soft voting and stacking
//
//   metrics.rs     - Confusion matrix, accuracy, precision
//   evaluate.rs    - Fit/score loop and the performance table
//
// Errors from this layer are typed (ModelError) so callers can
// tell a bad input apart from an unfitted model. The layers
// above wrap them into anyhow errors with context.
//
// Reference: Hastie, Tibshirani & Friedman,
//            "The Elements of Statistical Learning" (2009)
//            Rust Book §9 (Error Handling)

use thiserror::Error;

/// Errors raised while fitting or applying a classifier
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Model has not been fitted yet")]
    NotFitted,

    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Label {0} is not a binary class (expected 0 or 1)")]
    InvalidLabel(u8),

    #[error("This model requires non-negative features")]
    NegativeFeature,

    #[error("Training labels contain a single class")]
    SingleClass,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Classifier trait, model descriptions and the default zoo
pub mod classifier;

/// Compressed sparse row storage
pub mod sparse;

/// Naive Bayes variants
pub mod naive_bayes;

/// k-nearest neighbours
pub mod knn;

/// Support vector classifier
pub mod svm;

/// L1-regularised logistic regression
pub mod logistic;

/// Decision tree growth and the single-tree classifier
pub mod tree;

/// Bagged tree ensembles
pub mod forest;

/// AdaBoost and gradient boosting
pub mod boosting;

/// XGBoost-style boosting
pub mod xgboost;

/// Voting and stacking
pub mod ensemble;

/// Classification metrics
pub mod metrics;

/// Training/scoring loop and performance tables
pub mod evaluate;
