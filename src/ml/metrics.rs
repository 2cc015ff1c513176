// ============================================================
// Layer 5 - Classification Metrics
// ============================================================
// Confusion matrix and the scores derived from it. Spam (1) is
// the positive class throughout.
//
//   accuracy  = (TP + TN) / total
//   precision = TP / (TP + FP)
//   recall    = TP / (TP + FN)
//
// A ratio with a zero denominator is reported as 0.

/// Confusion matrix for binary classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// Ham predicted as ham
    pub tn:  usize,
    /// Ham predicted as spam
    pub fp:  usize,
    /// Spam predicted as ham
    pub fn_: usize,
    /// Spam predicted as spam
    pub tp:  usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t == 1, p == 1) {
                (false, false) => cm.tn  += 1,
                (false, true)  => cm.fp  += 1,
                (true, false)  => cm.fn_ += 1,
                (true, true)   => cm.tp  += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    /// (TP + TN) / total, 0 for an empty matrix
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// TP / (TP + FP), 0 when nothing was predicted as spam
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// Precision as reported by the evaluation loop. Warns when no
    /// message was predicted as spam, since the 0 is then a
    /// convention rather than a measurement.
    pub fn reported_precision(&self) -> f64 {
        if self.tp + self.fp == 0 {
            tracing::warn!("Precision is ill-defined: no message was predicted as spam; using 0");
        }
        self.precision()
    }

    /// TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    /// Two-row layout, rows = actual, columns = predicted
    pub fn display(&self) -> String {
        format!(
            "[[{:>5} {:>5}]\n [{:>5} {:>5}]]",
            self.tn, self.fp, self.fn_, self.tp
        )
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 { 0.0 } else { num as f64 / denom as f64 }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged_while(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer   = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_confusion_matrix() {
        let y_true = [0, 0, 1, 1, 1, 0];
        let y_pred = [0, 1, 1, 0, 1, 0];
        let cm = ConfusionMatrix::from_predictions(&y_true, &y_pred);
        assert_eq!(cm, ConfusionMatrix { tn: 2, fp: 1, fn_: 1, tp: 2 });
        assert_eq!(cm.total(), 6);
        assert!((cm.accuracy() - 4.0 / 6.0).abs() < 1e-12);
        assert!((cm.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.recall() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.f1() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_precision_without_positive_predictions_warns() {
        let cm = ConfusionMatrix::from_predictions(&[1, 0], &[0, 0]);
        let mut precision = f64::NAN;
        let logs = logged_while(|| precision = cm.reported_precision());

        assert_eq!(precision, 0.0);
        assert_eq!(cm.accuracy(), 0.5);
        assert!(logs.contains("Precision is ill-defined"));
    }

    #[test]
    fn test_defined_precision_is_silent() {
        let cm = ConfusionMatrix::from_predictions(&[1, 0], &[1, 0]);
        let mut precision = f64::NAN;
        let logs = logged_while(|| precision = cm.reported_precision());

        assert_eq!(precision, 1.0);
        assert!(logs.is_empty());
    }

    #[test]
    fn test_display() {
        let cm = ConfusionMatrix { tn: 896, fp: 0, fn_: 29, tp: 109 };
        assert_eq!(cm.display(), "[[  896     0]\n [   29   109]]");
    }
}
