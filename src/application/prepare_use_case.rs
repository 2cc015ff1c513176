// ============================================================
// Layer 2 - PrepareUseCase
// ============================================================
// Turns the raw CSV into an analysed, normalised corpus:
//
//   Step 1: Load the table            (Layer 4 - data)
//   Step 2: Clean and encode labels   (Layer 4 - data)
//   Step 3: Count chars/words/sents   (Layer 4 - data)
//   Step 4: Normalise the text        (Layer 4 - data)
//   Step 5: Print the exploration     (Layer 6 - infra charts)
//           report
//
// The report covers shape, null counts, duplicates, class
// shares, per-class summaries of the three counts, histograms,
// the correlation matrix and the most frequent words per class.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};

use crate::application::config::PipelineConfig;
use crate::data::{
    cleaner::{CleanReport, Cleaner},
    preprocessor::Preprocessor,
    stats::{correlation_matrix, measure, top_words, Summary},
};
use crate::domain::{
    message::{Label, MessageRecord},
    traits::MessageSource,
};
use crate::infra::charts;

const CHART_WIDTH: usize = 40;

/// Cleaned records with stats and normalised text filled in
pub struct PreparedCorpus {
    pub records: Vec<MessageRecord>,
    pub report:  CleanReport,
}

impl PreparedCorpus {
    pub fn labels(&self) -> Vec<u8> {
        self.records.iter().map(|r| r.label.as_u8()).collect()
    }

    pub fn normalized(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.normalized.as_str()).collect()
    }

    pub fn characters(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.stats.characters as f64).collect()
    }

    fn column(&self, label: Option<Label>, pick: impl Fn(&MessageRecord) -> usize) -> Vec<f64> {
        self.records
            .iter()
            .filter(|r| label.map_or(true, |l| r.label == l))
            .map(|r| pick(r) as f64)
            .collect()
    }
}

// ─── PrepareUseCase ───────────────────────────────────────────────────────────
pub struct PrepareUseCase {
    config: PipelineConfig,
}

impl PrepareUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, source: &dyn MessageSource) -> Result<PreparedCorpus> {
        let cfg = &self.config;

        // ── Step 1: Load ──────────────────────────────────────────────────────
        let table = source.load_table().context("Loading the message table")?;
        tracing::info!("Loaded table: {} rows x {} columns", table.shape().0, table.shape().1);

        // ── Step 2: Clean ─────────────────────────────────────────────────────
        let outcome = Cleaner::new(cfg.cleaning.clone()).clean(table)?;
        let mut records = outcome.records;

        // ── Steps 3-4: Derived fields ─────────────────────────────────────────
        let preprocessor = Preprocessor::new();
        for record in records.iter_mut() {
            record.stats      = measure(&record.text);
            record.normalized = preprocessor.transform(&record.text);
        }
        tracing::info!("Normalised {} messages", records.len());

        let corpus = PreparedCorpus { records, report: outcome.report };

        // ── Step 5: Report ────────────────────────────────────────────────────
        println!("{}", self.render_report(&corpus));
        Ok(corpus)
    }

    /// The full exploration report as text
    pub fn render_report(&self, corpus: &PreparedCorpus) -> String {
        let cfg = &self.config;
        let r   = &corpus.report;
        let mut out = String::new();

        out.push_str("=== Data cleaning ===\n");
        out.push_str(&format!("Initial shape: {:?}\n", r.initial_shape));
        out.push_str(&format!("Columns: {}\n", r.columns_after_drop.join(", ")));
        out.push_str("Null values per column:\n");
        for (col, n) in &r.null_counts {
            out.push_str(&format!("  {col:<10} {n}\n"));
        }
        if r.empty_rows_dropped > 0 {
            out.push_str(&format!("Rows without label or text dropped: {}\n", r.empty_rows_dropped));
        }
        out.push_str(&format!("Duplicated rows: {}\n", r.duplicates_found));
        out.push_str(&format!("Shape after cleaning: {:?}\n", r.final_shape));
        out.push_str(&format!("Classes: {}\n", r.classes.join(", ")));

        out.push_str("\n=== Class balance ===\n");
        out.push_str(&charts::pie_shares(&[("ham", r.ham), ("spam", r.spam)], CHART_WIDTH));

        // ── Descriptive statistics ──
        type Pick = fn(&MessageRecord) -> usize;
        let counts: [(&str, Pick); 3] = [
            ("num_characters", |m| m.stats.characters),
            ("num_words", |m| m.stats.words),
            ("num_sentences", |m| m.stats.sentences),
        ];

        for (title, label) in [("all messages", None), ("ham", Some(Label::Ham)), ("spam", Some(Label::Spam))] {
            out.push_str(&format!("\n=== Summary: {title} ===\n"));
            out.push_str(&format!(
                "{:<15} {:>6} {:>9} {:>9} {:>7} {:>7} {:>7} {:>7} {:>7}\n",
                "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
            ));
            for (name, pick) in counts {
                let s = Summary::of(&corpus.column(label, pick));
                out.push_str(&format!(
                    "{:<15} {:>6} {:>9.3} {:>9.3} {:>7.1} {:>7.1} {:>7.1} {:>7.1} {:>7.1}\n",
                    name, s.count, s.mean, s.std, s.min, s.q25, s.q50, s.q75, s.max
                ));
            }
        }

        for (name, pick) in &counts[..2] {
            let ham  = corpus.column(Some(Label::Ham), pick);
            let spam = corpus.column(Some(Label::Spam), pick);
            out.push('\n');
            out.push_str(&charts::histogram(
                &format!("=== Histogram: {name} ==="),
                &[("ham", &ham[..]), ("spam", &spam[..])],
                cfg.histogram_bins,
                CHART_WIDTH,
            ));
        }

        // ── Correlation ──
        let columns = vec![
            corpus.labels().into_iter().map(f64::from).collect(),
            corpus.column(None, counts[0].1),
            corpus.column(None, counts[1].1),
            corpus.column(None, counts[2].1),
        ];
        out.push_str("\n=== Correlation ===\n");
        out.push_str(&charts::correlation_grid(
            &["target", "num_characters", "num_words", "num_sentences"],
            &correlation_matrix(&columns),
        ));

        // ── Most frequent words ──
        for label in [Label::Spam, Label::Ham] {
            let texts = corpus
                .records
                .iter()
                .filter(|m| m.label == label)
                .map(|m| m.normalized.as_str());
            let (top, total) = top_words(texts, cfg.top_words);
            let items: Vec<(String, f64)> = top.into_iter().map(|(w, c)| (w, c as f64)).collect();

            out.push('\n');
            out.push_str(&charts::bar_chart(
                &format!("=== Top {} {} words ({} tokens in total) ===", items.len(), label, total),
                &items,
                CHART_WIDTH,
            ));
        }

        out
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_csv;

    const CSV: &str = "v1,v2,,,\n\
        ham,Are you coming to the meeting later?,,,\n\
        spam,WINNER!! Claim your free prize now. Call 09061701461.,,,\n\
        ham,Are you coming to the meeting later?,,,\n\
        ham,I'll be home soon. Don't wait up.,,,\n\
        spam,Free entry to win cash! Text WIN to 80086 now.,,,\n";

    #[test]
    fn test_prepare_fills_derived_fields() {
        let table  = parse_csv(CSV).unwrap();
        let cfg    = PipelineConfig::default();
        let corpus = PrepareUseCase::new(cfg).execute(&table).unwrap();

        assert_eq!(corpus.records.len(), 4);
        assert_eq!(corpus.report.duplicates_found, 1);
        assert_eq!(corpus.labels(), vec![0, 1, 0, 1]);

        for record in &corpus.records {
            assert_eq!(record.stats.characters, record.text.chars().count());
            assert!(record.stats.words > 0);
            assert!(record.stats.sentences > 0);
            assert!(!record.normalized.is_empty());
        }
        // reapplying normalisation changes nothing
        let pre = Preprocessor::new();
        for text in corpus.normalized() {
            assert_eq!(pre.transform(text), text);
        }
    }

    #[test]
    fn test_report_sections() {
        let table   = parse_csv(CSV).unwrap();
        let usecase = PrepareUseCase::new(PipelineConfig::default());
        let corpus  = usecase.execute(&table).unwrap();
        let report  = usecase.render_report(&corpus);

        assert!(report.contains("50.00%"));
        assert!(report.contains("=== Summary: spam ==="));
        assert!(report.contains("num_sentences"));
        assert!(report.contains("=== Correlation ==="));
        assert!(report.contains("spam words"));
    }
}
