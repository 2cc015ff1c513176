// ============================================================
// Layer 4 - Text Vectorizers
// ============================================================
// Turns normalised messages into a fixed-width numeric matrix
// (one row per message, one column per vocabulary term).
//
//   CountVectorizer → raw term counts
//   TfidfVectorizer → term counts weighted by inverse document
//                     frequency, each row scaled to unit length
//
// Both share the same token rule: lowercase, then every run of
// two or more word characters is a term. Single characters
// ("u", "2") are not terms.
//
// Vocabulary construction:
//   1. count every term over the whole corpus
//   2. with max_features = N, keep the N most frequent terms
//      (ties broken alphabetically)
//   3. assign column indices in alphabetical order
//
// TF-IDF weighting (smoothed):
//   idf(t)   = ln((1 + n_docs) / (1 + df(t))) + 1
//   w(d, t)  = count(d, t) * idf(t)
//   row(d)  /= ||row(d)||₂      (all-zero rows stay zero)
//
// Reference: Manning, Raghavan & Schütze, "Introduction to
//            Information Retrieval", ch. 6 (tf-idf weighting)

use anyhow::{bail, Result};
use ndarray::Array2;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("static token regex"));

/// Extract vectorizer terms from one document.
pub fn analyze(doc: &str) -> Vec<String> {
    let lowered = doc.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Common interface for the two vectorizers
pub trait TextVectorizer {
    /// Learn the vocabulary (and idf weights) from a corpus
    fn fit(&mut self, docs: &[&str]) -> Result<()>;

    /// Map documents to a (n_docs × n_features) matrix
    fn transform(&self, docs: &[&str]) -> Result<Array2<f64>>;

    /// Fit then transform the same corpus
    fn fit_transform(&mut self, docs: &[&str]) -> Result<Array2<f64>> {
        self.fit(docs)?;
        self.transform(docs)
    }

    /// Term → column index
    fn vocabulary(&self) -> &BTreeMap<String, usize>;

    fn n_features(&self) -> usize {
        self.vocabulary().len()
    }
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────

/// Term statistics gathered in one pass over a corpus
struct CorpusCounts {
    term_freq: HashMap<String, usize>,
    doc_freq:  HashMap<String, usize>,
    n_docs:    usize,
}

fn count_corpus(docs: &[&str]) -> CorpusCounts {
    let mut term_freq = HashMap::new();
    let mut doc_freq  = HashMap::new();

    for doc in docs {
        let terms = analyze(doc);
        let mut seen = HashSet::new();
        for term in terms {
            if seen.insert(term.clone()) {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            *term_freq.entry(term).or_insert(0) += 1;
        }
    }

    CorpusCounts { term_freq, doc_freq, n_docs: docs.len() }
}

fn build_vocabulary(counts: &CorpusCounts, max_features: Option<usize>) -> BTreeMap<String, usize> {
    let mut terms: Vec<(&String, &usize)> = counts.term_freq.iter().collect();

    if let Some(limit) = max_features {
        if terms.len() > limit {
            terms.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            terms.truncate(limit);
        }
    }

    let mut names: Vec<String> = terms.into_iter().map(|(t, _)| t.clone()).collect();
    names.sort();

    names.into_iter().enumerate().map(|(i, t)| (t, i)).collect()
}

fn count_matrix(vocabulary: &BTreeMap<String, usize>, docs: &[&str]) -> Array2<f64> {
    let mut m = Array2::<f64>::zeros((docs.len(), vocabulary.len()));
    for (row, doc) in docs.iter().enumerate() {
        for term in analyze(doc) {
            if let Some(&col) = vocabulary.get(&term) {
                m[[row, col]] += 1.0;
            }
        }
    }
    m
}

// ─── CountVectorizer ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CountVectorizer {
    max_features: Option<usize>,
    vocabulary:   BTreeMap<String, usize>,
    fitted:       bool,
}

impl CountVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n);
        self
    }
}

impl TextVectorizer for CountVectorizer {
    fn fit(&mut self, docs: &[&str]) -> Result<()> {
        let counts = count_corpus(docs);
        self.vocabulary = build_vocabulary(&counts, self.max_features);
        self.fitted = true;
        tracing::debug!("CountVectorizer vocabulary: {} terms", self.vocabulary.len());
        Ok(())
    }

    fn transform(&self, docs: &[&str]) -> Result<Array2<f64>> {
        if !self.fitted {
            bail!("CountVectorizer must be fitted before transform");
        }
        Ok(count_matrix(&self.vocabulary, docs))
    }

    fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }
}

// ─── TfidfVectorizer ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    max_features: Option<usize>,
    vocabulary:   BTreeMap<String, usize>,
    /// idf weight per column
    idf:          Vec<f64>,
    fitted:       bool,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n);
        self
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

impl TextVectorizer for TfidfVectorizer {
    fn fit(&mut self, docs: &[&str]) -> Result<()> {
        let counts = count_corpus(docs);
        self.vocabulary = build_vocabulary(&counts, self.max_features);

        let n = counts.n_docs as f64;
        self.idf = vec![0.0; self.vocabulary.len()];
        for (term, &col) in &self.vocabulary {
            let df = counts.doc_freq.get(term).copied().unwrap_or(0) as f64;
            self.idf[col] = ((1.0 + n) / (1.0 + df)).ln() + 1.0;
        }

        self.fitted = true;
        tracing::debug!(
            "TfidfVectorizer vocabulary: {} terms over {} documents",
            self.vocabulary.len(),
            counts.n_docs
        );
        Ok(())
    }

    fn transform(&self, docs: &[&str]) -> Result<Array2<f64>> {
        if !self.fitted {
            bail!("TfidfVectorizer must be fitted before transform");
        }

        let mut m = count_matrix(&self.vocabulary, docs);
        for mut row in m.rows_mut() {
            for (v, w) in row.iter_mut().zip(&self.idf) {
                *v *= w;
            }
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row /= norm;
            }
        }
        Ok(m)
    }

    fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_char_tokens_ignored() {
        assert_eq!(analyze("u r a WINNER 2day"), vec!["winner", "2day"]);
    }

    #[test]
    fn test_count_vectorizer() {
        let docs = ["free win free", "win cash"];
        let mut cv = CountVectorizer::new();
        let m = cv.fit_transform(&docs).unwrap();

        // alphabetical: cash, free, win
        assert_eq!(cv.vocabulary().get("cash"), Some(&0));
        assert_eq!(m.shape(), &[2, 3]);
        assert_eq!(m[[0, 1]], 2.0);
        assert_eq!(m[[1, 0]], 1.0);
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let docs = ["free free free win", "win cash", "prize"];
        let mut tf = TfidfVectorizer::new().with_max_features(2);
        tf.fit(&docs).unwrap();
        let vocab: Vec<&String> = tf.vocabulary().keys().collect();
        assert_eq!(vocab, vec!["free", "win"]);
    }

    #[test]
    fn test_tfidf_rows_unit_length() {
        let docs = ["free win", "win cash now", "hello"];
        let mut tf = TfidfVectorizer::new();
        let m = tf.fit_transform(&docs).unwrap();
        for row in m.rows() {
            let norm = row.dot(&row).sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
        // a term in every doc would get idf 1; "win" appears in 2 of 3
        let win = tf.vocabulary()["win"];
        let expected = (4.0f64 / 3.0).ln() + 1.0;
        assert!((tf.idf()[win] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_terms_give_zero_row() {
        let mut tf = TfidfVectorizer::new();
        tf.fit(&["free win"]).unwrap();
        let m = tf.transform(&["nothing here"]).unwrap();
        assert!(m.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let tf = TfidfVectorizer::new();
        assert!(tf.transform(&["x"]).is_err());
    }
}
