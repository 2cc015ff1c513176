// ============================================================
// Layer 2 - CompareUseCase
// ============================================================
// Runs the model comparison on a prepared corpus:
//
//   for every feature variant:
//     Step 1: TF-IDF features          (Layer 4 - data)
//     Step 2: optional scaling and     (Layer 4 - data)
//             character-count column
//     Step 3: seeded train/test split  (Layer 4 - data)
//     Step 4: naive Bayes baseline     (Layer 5 - ml)
//             (first variant only)
//     Step 5: the model zoo            (Layer 5 - ml)
//   Step 6: merged table + bar chart   (Layer 5 + 6)
//   Step 7: voting and stacking on the first variant
//   Step 8: best model, score report   (Layer 6 - infra)
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use ndarray::Array2;

use crate::application::config::{FeatureVariant, PipelineConfig};
use crate::application::prepare_use_case::PreparedCorpus;
use crate::data::{
    scaler::{append_column, MinMaxScaler},
    splitter::split_indices,
    vectorizer::{TextVectorizer, TfidfVectorizer},
};
use crate::infra::{charts, metrics::ScoreLogger};
use crate::ml::{
    classifier::{default_zoo, find_spec, Classifier, ModelKind, ModelSpec},
    evaluate::{compare, select_best, ModelScore, PerformanceTable, ScoreRecord, SplitData},
    naive_bayes::{BernoulliNb, GaussianNb, MultinomialNb},
};

/// Everything a comparison run produced
pub struct ComparisonOutcome {
    pub tables:  Vec<PerformanceTable>,
    pub merged:  PerformanceTable,
    pub records: Vec<ScoreRecord>,
    pub best:    ModelScore,
}

// ─── CompareUseCase ───────────────────────────────────────────────────────────
pub struct CompareUseCase {
    config: PipelineConfig,
}

impl CompareUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, corpus: &PreparedCorpus) -> Result<ComparisonOutcome> {
        let cfg = &self.config;
        cfg.validate()?;

        let zoo = default_zoo(cfg.seed);
        let mut tables  = Vec::with_capacity(cfg.variants.len());
        let mut records = Vec::new();
        let mut first_split: Option<SplitData> = None;

        for (i, variant) in cfg.variants.iter().enumerate() {
            tracing::info!("Feature variant '{}'", variant.name);

            // ── Steps 1-3: features and split ────────────────────────────────
            let x = self
                .features(corpus, variant)
                .with_context(|| format!("Building features for '{}'", variant.name))?;
            let split = self.split(&x, &corpus.labels());

            // ── Step 4: naive Bayes baseline ──────────────────────────────────
            if i == 0 {
                self.naive_bayes_baseline(&split)?;
            }

            // ── Step 5: model zoo ─────────────────────────────────────────────
            println!("\n=== Model comparison: {} ===", variant.name);
            let scores = compare(&zoo, &split)
                .with_context(|| format!("Comparing models on '{}'", variant.name))?;
            records.extend(scores.iter().map(|s| s.record(&variant.name)));

            let table = PerformanceTable::from_scores(&variant.name, &scores);
            println!("{}", table.display());
            tables.push(table);

            if i == 0 {
                first_split = Some(split);
            }
        }

        // ── Step 6: merged variants ──────────────────────────────────────────
        let merged = tables
            .iter()
            .skip(1)
            .fold(tables[0].clone(), |acc, t| acc.merge(t));
        println!("\n=== All feature variants ===\n{}", merged.display());
        println!("\n{}", self.score_chart(&tables[0]));

        // ── Step 7: ensembles on the first variant ───────────────────────────
        let split = first_split.context("No feature variant was run")?;
        let first = &cfg.variants[0].name;
        let mut candidates: Vec<ModelScore> = records
            .iter()
            .filter(|r| &r.variant == first)
            .map(|r| ModelScore {
                algorithm: r.algorithm.clone(),
                accuracy:  r.accuracy,
                precision: r.precision,
            })
            .collect();

        for (name, kind) in self.ensembles(&zoo)? {
            let mut clf = kind.build();
            let eval = split
                .evaluate(clf.as_mut())
                .with_context(|| format!("Training the {name} ensemble"))?;

            println!("\n=== {name} ===");
            println!("Accuracy {}", eval.accuracy);
            println!("Precision {}", eval.precision);
            tracing::info!("{}: fit {:.2?}", name, eval.fit_time);

            let score = ModelScore { algorithm: name, accuracy: eval.accuracy, precision: eval.precision };
            records.push(score.record(first));
            candidates.push(score);
        }

        // ── Step 8: best model and report ────────────────────────────────────
        let best = select_best(&candidates)
            .cloned()
            .context("No model was scored")?;
        println!(
            "\nBest model: {} (precision {:.4}, accuracy {:.4}, features '{}')",
            best.algorithm, best.precision, best.accuracy, first
        );

        if let Some(dir) = &cfg.report_dir {
            ScoreLogger::new(dir.as_str())?.write(&records)?;
        }

        Ok(ComparisonOutcome { tables, merged, records, best })
    }

    /// TF-IDF matrix of the normalised texts, shaped by `variant`
    fn features(&self, corpus: &PreparedCorpus, variant: &FeatureVariant) -> Result<Array2<f64>> {
        let mut vectorizer = TfidfVectorizer::new();
        if let Some(n) = variant.max_features {
            vectorizer = vectorizer.with_max_features(n);
        }
        let mut x = vectorizer.fit_transform(&corpus.normalized())?;

        if variant.scale {
            x = MinMaxScaler::new().fit_transform(&x)?;
        }
        if variant.append_char_count {
            let chars = ndarray::Array1::from(corpus.characters());
            x = append_column(&x, chars.view())?;
        }

        tracing::info!("Feature matrix: {} x {}", x.nrows(), x.ncols());
        Ok(x)
    }

    fn split(&self, x: &Array2<f64>, y: &[u8]) -> SplitData {
        let (train, test) = split_indices(y.len(), self.config.test_fraction, self.config.seed);
        tracing::info!("Split: {} train, {} test", train.len(), test.len());
        SplitData::from_indices(x.view(), y, &train, &test)
    }

    /// Gaussian, multinomial and Bernoulli naive Bayes side by side
    fn naive_bayes_baseline(&self, split: &SplitData) -> Result<()> {
        let models: [(&str, Box<dyn Classifier>); 3] = [
            ("GaussianNB", Box::new(GaussianNb::new(1e-9))),
            ("MultinomialNB", Box::new(MultinomialNb::new(1.0))),
            ("BernoulliNB", Box::new(BernoulliNb::new(1.0, 0.0))),
        ];

        println!("\n=== Naive Bayes baseline ===");
        for (name, mut model) in models {
            let eval = split
                .evaluate(model.as_mut())
                .with_context(|| format!("Training {name}"))?;
            println!("{name}");
            println!("{}", eval.accuracy);
            println!("{}", eval.confusion.display());
            println!("{}", eval.precision);
        }
        Ok(())
    }

    /// Voting and stacking built from the configured member names
    fn ensembles(&self, zoo: &[ModelSpec]) -> Result<Vec<(String, ModelKind)>> {
        let cfg = &self.config;
        let resolve = |names: &[String]| -> Result<Vec<ModelSpec>> {
            names
                .iter()
                .map(|n| find_spec(zoo, n).cloned().with_context(|| format!("Unknown ensemble member '{n}'")))
                .collect()
        };

        Ok(vec![
            ("Voting".to_string(), ModelKind::Voting { members: resolve(&cfg.voting_members)? }),
            (
                "Stacking".to_string(),
                ModelKind::Stacking {
                    members:         resolve(&cfg.stacking_members)?,
                    final_estimator: Box::new(cfg.stacking_final.clone()),
                    folds:           cfg.stacking_folds,
                },
            ),
        ])
    }

    /// Accuracy and precision per algorithm on a 0.5 to 1.0 axis
    fn score_chart(&self, table: &PerformanceTable) -> String {
        let series: Vec<(&str, Vec<f64>)> = table
            .headers
            .iter()
            .enumerate()
            .map(|(col, h)| {
                let name = if h.starts_with("Accuracy") { "Accuracy" } else { "Precision" };
                (name, table.rows.iter().map(|r| r.cells[col]).collect())
            })
            .collect();
        charts::grouped_bars(&table.algorithms(), &series, 0.5, 1.0, 40)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::prepare_use_case::PrepareUseCase;
    use crate::data::table::RawTable;
    use crate::data::loader::parse_csv;
    use tempfile::TempDir;

    const SPAM: [&str; 5] = [
        "Claim your free prize now",
        "Win cash today call now",
        "Free entry to win a prize",
        "Urgent: claim cash reward",
        "Call now for a free prize",
    ];
    const HAM: [&str; 5] = [
        "See you at lunch tomorrow",
        "Are you coming home tonight",
        "Meeting moved to tomorrow morning",
        "Thanks for dinner last night",
        "Can you pick up milk tonight",
    ];

    fn corpus_table() -> RawTable {
        let mut csv = String::from("v1,v2,,,\n");
        for i in 0..30 {
            csv.push_str(&format!("spam,{} ref{},,,\n", SPAM[i % 5], i));
            csv.push_str(&format!("ham,{} note{},,,\n", HAM[i % 5], i));
        }
        parse_csv(&csv).unwrap()
    }

    fn small_config(report_dir: Option<String>) -> PipelineConfig {
        PipelineConfig {
            variants: vec![
                FeatureVariant::new("base", Some(40)),
                FeatureVariant { scale: true, append_char_count: true, ..FeatureVariant::new("num_chars", Some(40)) },
            ],
            stacking_final: ModelKind::RandomForest { n_trees: 10, seed: 2 },
            stacking_folds: 3,
            report_dir,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_end_to_end_comparison() {
        let dir    = TempDir::new().unwrap();
        let cfg    = small_config(Some(dir.path().display().to_string()));
        let corpus = PrepareUseCase::new(cfg.clone()).execute(&corpus_table()).unwrap();
        assert_eq!(corpus.records.len(), 60);

        let outcome = CompareUseCase::new(cfg).execute(&corpus).unwrap();

        assert_eq!(outcome.tables.len(), 2);
        assert_eq!(outcome.tables[0].rows.len(), 11);
        assert_eq!(outcome.merged.headers.len(), 4);
        assert_eq!(outcome.merged.rows.len(), 11);
        // 11 models x 2 variants, plus the two ensembles
        assert_eq!(outcome.records.len(), 24);
        assert!(outcome.best.precision > 0.9);

        let written = ScoreLogger::new(dir.path()).unwrap().read().unwrap();
        assert_eq!(written, outcome.records);
    }

    #[test]
    fn test_char_count_column_is_appended() {
        let cfg     = small_config(None);
        let corpus  = PrepareUseCase::new(cfg.clone()).execute(&corpus_table()).unwrap();
        let usecase = CompareUseCase::new(cfg.clone());

        let base  = usecase.features(&corpus, &cfg.variants[0]).unwrap();
        let chars = usecase.features(&corpus, &cfg.variants[1]).unwrap();
        assert_eq!(chars.ncols(), base.ncols() + 1);
        assert_eq!(chars[[0, base.ncols()]], corpus.records[0].stats.characters as f64);
    }

    #[test]
    fn test_unknown_ensemble_member() {
        let cfg = PipelineConfig { voting_members: vec!["nope".to_string()], ..PipelineConfig::default() };
        let usecase = CompareUseCase::new(cfg);
        assert!(usecase.ensembles(&default_zoo(2)).is_err());
    }
}
