// ============================================================
// Layer 4 - Descriptive Statistics
// ============================================================
// Everything the exploration report needs to describe the
// cleaned corpus:
//
//   measure()            → character / word / sentence counts
//   Summary::of()        → count, mean, std, min, quartiles, max
//   correlation_matrix() → pairwise Pearson correlation
//   top_words()          → most frequent tokens in a corpus
//
// Quartiles use linear interpolation between the two closest
// ranks, and the standard deviation is the sample one (n - 1).

use std::collections::HashMap;

use crate::data::tokenizer::{sent_tokenize, word_tokenize};
use crate::domain::message::TextStats;

/// Derive the three count fields from a raw message.
pub fn measure(text: &str) -> TextStats {
    TextStats {
        characters: text.chars().count(),
        words:      word_tokenize(text).len(),
        sentences:  sent_tokenize(text).len(),
    }
}

/// Eight-number summary of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean:  f64,
    pub std:   f64,
    pub min:   f64,
    pub q25:   f64,
    pub q50:   f64,
    pub q75:   f64,
    pub max:   f64,
}

impl Summary {
    /// Summarise a column. An empty column gives NaN everywhere
    /// except the count.
    pub fn of(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: f64::NAN,
                std:  f64::NAN,
                min:  f64::NAN,
                q25:  f64::NAN,
                q50:  f64::NAN,
                q75:  f64::NAN,
                max:  f64::NAN,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        Self {
            count,
            mean,
            std,
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            q50: quantile(&sorted, 0.50),
            q75: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        }
    }
}

/// Linear-interpolated quantile of an already sorted, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos   = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac  = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Pearson correlation of two equally long columns.
/// Returns NaN when either column is constant.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return f64::NAN;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let mut cov   = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov   += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return f64::NAN;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

/// Square matrix of pairwise Pearson correlations.
pub fn correlation_matrix(columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
    columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect()
}

/// The `n` most frequent whitespace-separated tokens across `texts`,
/// highest count first, ties alphabetical. Also returns the total
/// number of tokens in the corpus.
pub fn top_words<'a>(texts: impl IntoIterator<Item = &'a str>, n: usize) -> (Vec<(String, usize)>, usize) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total = 0usize;

    for text in texts {
        for word in text.split_whitespace() {
            *counts.entry(word).or_insert(0) += 1;
            total += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(w, c)| (w.to_string(), c))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);

    (ranked, total)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_counts() {
        let s = measure("Hello world. How are you?");
        assert_eq!(s.characters, 25);
        assert_eq!(s.words, 7);
        assert_eq!(s.sentences, 2);
    }

    #[test]
    fn test_summary_quartiles() {
        let s = Summary::of(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.count, 4);
        assert!((s.mean - 2.5).abs() < 1e-12);
        assert!((s.q25 - 1.75).abs() < 1e-12);
        assert!((s.q50 - 2.5).abs() < 1e-12);
        assert!((s.q75 - 3.25).abs() < 1e-12);
        assert!((s.std - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn test_summary_empty() {
        let s = Summary::of(&[]);
        assert_eq!(s.count, 0);
        assert!(s.mean.is_nan());
    }

    #[test]
    fn test_pearson() {
        let a = [1.0, 2.0, 3.0];
        assert!((pearson(&a, &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&a, &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
        assert!(pearson(&a, &[1.0, 1.0, 1.0]).is_nan());
    }

    #[test]
    fn test_top_words() {
        let (top, total) = top_words(["free win", "win cash", "win"], 2);
        assert_eq!(total, 5);
        assert_eq!(top, vec![("win".to_string(), 3), ("cash".to_string(), 1)]);
    }
}
