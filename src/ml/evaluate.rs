// ============================================================
// Layer 5 - Evaluation Loop
// ============================================================
// Fits every model on the same train/test split and reports
// test accuracy and precision for the spam class:
//
//   For SVC
//   Accuracy -  0.97...
//   Precision -  0.96...
//
// The scores of one feature variant form a `PerformanceTable`,
// sorted by precision, highest first. Tables of several
// variants are merged on the algorithm name, so each row shows
// how one model reacts to the feature changes:
//
//   Algorithm  Accuracy_base  Precision_base  Accuracy_max_ft_3000 ...
//
// Precision drives model selection: on a spam filter a false
// positive hides a real message from the user.

use std::time::{Duration, Instant};

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::classifier::{Classifier, ModelSpec};
use super::metrics::ConfusionMatrix;
use super::ModelError;

/// Test-set result of one fitted model
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub accuracy:  f64,
    pub precision: f64,
    pub confusion: ConfusionMatrix,
    pub fit_time:  Duration,
}

/// Fit on the training rows, score on the test rows.
pub fn train_classifier(
    clf:     &mut dyn Classifier,
    x_train: ArrayView2<'_, f64>,
    y_train: &[u8],
    x_test:  ArrayView2<'_, f64>,
    y_test:  &[u8],
) -> Result<Evaluation, ModelError> {
    let start = Instant::now();
    clf.fit(x_train, y_train)?;
    let fit_time = start.elapsed();

    let y_pred    = clf.predict(x_test)?;
    let confusion = ConfusionMatrix::from_predictions(y_test, &y_pred);

    Ok(Evaluation {
        accuracy:  confusion.accuracy(),
        precision: confusion.reported_precision(),
        confusion,
        fit_time,
    })
}

// ─── Split data ───────────────────────────────────────────────────────────────

/// Feature rows and labels on both sides of one split
#[derive(Debug, Clone)]
pub struct SplitData {
    pub x_train: Array2<f64>,
    pub y_train: Vec<u8>,
    pub x_test:  Array2<f64>,
    pub y_test:  Vec<u8>,
}

impl SplitData {
    pub fn from_indices(x: ArrayView2<'_, f64>, y: &[u8], train: &[usize], test: &[usize]) -> Self {
        Self {
            x_train: x.select(Axis(0), train),
            y_train: train.iter().map(|&i| y[i]).collect(),
            x_test:  x.select(Axis(0), test),
            y_test:  test.iter().map(|&i| y[i]).collect(),
        }
    }

    pub fn evaluate(&self, clf: &mut dyn Classifier) -> Result<Evaluation, ModelError> {
        train_classifier(
            clf,
            self.x_train.view(),
            &self.y_train,
            self.x_test.view(),
            &self.y_test,
        )
    }
}

// ─── Comparison ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ModelScore {
    pub algorithm: String,
    pub accuracy:  f64,
    pub precision: f64,
}

impl ModelScore {
    pub fn record(&self, variant: &str) -> ScoreRecord {
        ScoreRecord {
            algorithm: self.algorithm.clone(),
            variant:   variant.to_string(),
            accuracy:  self.accuracy,
            precision: self.precision,
        }
    }
}

/// One line of the score report file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub algorithm: String,
    pub variant:   String,
    pub accuracy:  f64,
    pub precision: f64,
}

/// Fits every model in turn on `split` and prints its scores.
pub fn compare(models: &[ModelSpec], split: &SplitData) -> Result<Vec<ModelScore>, ModelError> {
    let mut scores = Vec::with_capacity(models.len());

    for spec in models {
        let mut clf = spec.kind.build();
        let eval = split.evaluate(clf.as_mut())?;

        println!("For {}", spec.name);
        println!("Accuracy - {}", eval.accuracy);
        println!("Precision - {}", eval.precision);
        tracing::info!(
            "{}: accuracy={:.4}, precision={:.4}, fit {:.2?}",
            spec.name,
            eval.accuracy,
            eval.precision,
            eval.fit_time
        );

        scores.push(ModelScore {
            algorithm: spec.name.clone(),
            accuracy:  eval.accuracy,
            precision: eval.precision,
        });
    }
    Ok(scores)
}

/// Highest precision wins; accuracy breaks ties, then the earlier entry.
pub fn select_best(scores: &[ModelScore]) -> Option<&ModelScore> {
    scores.iter().reduce(|best, s| {
        let better = s.precision > best.precision
            || (s.precision == best.precision && s.accuracy > best.accuracy);
        if better { s } else { best }
    })
}

// ─── Performance table ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub algorithm: String,
    pub cells:     Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceTable {
    pub headers: Vec<String>,
    pub rows:    Vec<TableRow>,
}

impl PerformanceTable {
    /// Scores of one variant, sorted by precision, highest first.
    /// Equal precisions keep the order the models were run in.
    pub fn from_scores(variant: &str, scores: &[ModelScore]) -> Self {
        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| b.precision.total_cmp(&a.precision));

        Self {
            headers: vec![format!("Accuracy_{variant}"), format!("Precision_{variant}")],
            rows:    sorted
                .into_iter()
                .map(|s| TableRow { algorithm: s.algorithm, cells: vec![s.accuracy, s.precision] })
                .collect(),
        }
    }

    /// Inner join on the algorithm name, keeping this table's row order.
    pub fn merge(&self, other: &PerformanceTable) -> PerformanceTable {
        let rows = self
            .rows
            .iter()
            .filter_map(|row| {
                let theirs = other.rows.iter().find(|r| r.algorithm == row.algorithm)?;
                let mut cells = row.cells.clone();
                cells.extend_from_slice(&theirs.cells);
                Some(TableRow { algorithm: row.algorithm.clone(), cells })
            })
            .collect();

        let mut headers = self.headers.clone();
        headers.extend(other.headers.iter().cloned());
        PerformanceTable { headers, rows }
    }

    pub fn algorithms(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.algorithm.as_str()).collect()
    }

    /// Column of values under `header`, one per row
    pub fn column(&self, header: &str) -> Option<Vec<f64>> {
        let idx = self.headers.iter().position(|h| h == header)?;
        Some(self.rows.iter().map(|r| r.cells[idx]).collect())
    }

    /// Aligned text rendering with a leading row index
    pub fn display(&self) -> String {
        let name_w = self
            .rows
            .iter()
            .map(|r| r.algorithm.len())
            .chain(std::iter::once("Algorithm".len()))
            .max()
            .unwrap_or(9);
        let index_w = self.rows.len().saturating_sub(1).to_string().len();

        let mut out = format!("{:>index_w$}  {:>name_w$}", "", "Algorithm");
        for h in &self.headers {
            out.push_str(&format!("  {:>w$}", h, w = h.len().max(8)));
        }
        for (i, row) in self.rows.iter().enumerate() {
            out.push_str(&format!("\n{:>index_w$}  {:>name_w$}", i, row.algorithm));
            for (h, v) in self.headers.iter().zip(&row.cells) {
                out.push_str(&format!("  {:>w$.6}", v, w = h.len().max(8)));
            }
        }
        out
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::ModelKind;
    use ndarray::array;

    fn score(name: &str, accuracy: f64, precision: f64) -> ModelScore {
        ModelScore { algorithm: name.to_string(), accuracy, precision }
    }

    #[test]
    fn test_train_classifier_scores_test_rows() {
        let x_train = array![[3.0, 0.0], [2.0, 0.0], [0.0, 3.0], [0.0, 2.0]];
        let x_test  = array![[4.0, 0.0], [0.0, 1.0], [1.0, 0.0]];
        let mut nb  = ModelKind::MultinomialNb { alpha: 1.0 }.build();

        let eval = train_classifier(nb.as_mut(), x_train.view(), &[1, 1, 0, 0], x_test.view(), &[1, 0, 0])
            .unwrap();
        // the last row looks like spam but is labelled ham
        assert_eq!(eval.confusion, ConfusionMatrix { tn: 1, fp: 1, fn_: 0, tp: 1 });
        assert!((eval.accuracy - 2.0 / 3.0).abs() < 1e-12);
        assert!((eval.precision - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_split_data_from_indices() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let split = SplitData::from_indices(x.view(), &[0, 1, 0, 1], &[3, 0], &[1, 2]);
        assert_eq!(split.x_train, array![[3.0], [0.0]]);
        assert_eq!(split.y_train, vec![1, 0]);
        assert_eq!(split.y_test, vec![1, 0]);
    }

    #[test]
    fn test_compare_returns_one_score_per_model() {
        let x = array![[3.0, 0.0], [2.0, 0.0], [0.0, 3.0], [0.0, 2.0], [4.0, 0.0], [0.0, 4.0]];
        let split = SplitData::from_indices(x.view(), &[1, 1, 0, 0, 1, 0], &[0, 1, 2, 3], &[4, 5]);
        let models = vec![
            ModelSpec::new("NB", ModelKind::MultinomialNb { alpha: 1.0 }),
            ModelSpec::new("KN", ModelKind::KNeighbors { k: 1 }),
        ];
        let scores = compare(&models, &split).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].algorithm, "NB");
        assert!(scores.iter().all(|s| s.accuracy == 1.0 && s.precision == 1.0));
    }

    #[test]
    fn test_table_sorted_by_precision() {
        let table = PerformanceTable::from_scores(
            "base",
            &[score("A", 0.9, 0.8), score("B", 0.95, 1.0), score("C", 0.97, 0.8)],
        );
        assert_eq!(table.algorithms(), vec!["B", "A", "C"]);
        assert_eq!(table.column("Precision_base").unwrap(), vec![1.0, 0.8, 0.8]);
    }

    #[test]
    fn test_merge_joins_on_algorithm() {
        let base   = PerformanceTable::from_scores("base", &[score("A", 0.9, 0.8), score("B", 0.95, 1.0)]);
        let scaled = PerformanceTable::from_scores("scaling", &[score("A", 0.91, 0.85), score("C", 0.5, 0.5)]);
        let merged = base.merge(&scaled);

        assert_eq!(merged.headers.len(), 4);
        assert_eq!(merged.algorithms(), vec!["A"]);
        assert_eq!(merged.rows[0].cells, vec![0.9, 0.8, 0.91, 0.85]);
        assert!(merged.display().contains("Precision_scaling"));
    }

    #[test]
    fn test_select_best_breaks_ties_on_accuracy() {
        let scores = [score("A", 0.90, 1.0), score("B", 0.97, 1.0), score("C", 0.99, 0.9)];
        assert_eq!(select_best(&scores).unwrap().algorithm, "B");
        assert!(select_best(&[]).is_none());
    }
}
