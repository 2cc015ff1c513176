// ============================================================
// Layer 4 - Data Cleaning
// ============================================================
// Turns the raw CSV table into typed, labelled records.
//
// Steps (applied in order):
//   1. Drop the unused columns       (the three "Unnamed: N")
//   2. Rename the kept columns       (v1 → output, v2 → text)
//   3. Drop rows with an empty label or empty text
//   4. Drop duplicate messages       (same text, first one wins)
//   5. Encode labels                 (ham → 0, spam → 1)
//
// Step 4 keys on the text column only. Two rows with the same
// text but different labels would otherwise both survive, and
// the corpus would contain the same message twice.
//
// Everything the exploration report shows about cleaning is
// collected into a CleanReport on the way.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::encoder::LabelEncoder;
use crate::data::table::RawTable;
use crate::domain::message::{Label, MessageRecord};

/// Which columns to drop and rename, and which ones hold the
/// label and the text afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningRules {
    pub drop_columns:   Vec<String>,
    pub rename_columns: BTreeMap<String, String>,
    pub label_column:   String,
    pub text_column:    String,
}

impl Default for CleaningRules {
    fn default() -> Self {
        let mut rename = BTreeMap::new();
        rename.insert("v1".to_string(), "output".to_string());
        rename.insert("v2".to_string(), "text".to_string());

        Self {
            drop_columns: vec![
                "Unnamed: 2".to_string(),
                "Unnamed: 3".to_string(),
                "Unnamed: 4".to_string(),
            ],
            rename_columns: rename,
            label_column:   "output".to_string(),
            text_column:    "text".to_string(),
        }
    }
}

/// What happened during cleaning, for the exploration report
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
    pub initial_shape:      (usize, usize),
    pub columns_after_drop: Vec<String>,
    pub null_counts:        Vec<(String, usize)>,
    pub empty_rows_dropped: usize,
    pub duplicates_found:   usize,
    pub final_shape:        (usize, usize),
    pub classes:            Vec<String>,
    pub ham:                usize,
    pub spam:               usize,
}

pub struct CleanOutcome {
    pub records: Vec<MessageRecord>,
    pub report:  CleanReport,
}

pub struct Cleaner {
    rules: CleaningRules,
}

impl Cleaner {
    pub fn new(rules: CleaningRules) -> Self {
        Self { rules }
    }

    pub fn clean(&self, mut table: RawTable) -> Result<CleanOutcome> {
        let mut report = CleanReport {
            initial_shape: table.shape(),
            ..Default::default()
        };

        // ── Step 1: drop unused columns ──────────────────────────────────────
        table
            .drop_columns(&self.rules.drop_columns)
            .context("Dropping unused columns")?;

        // ── Step 2: rename ───────────────────────────────────────────────────
        table.rename_columns(&self.rules.rename_columns);
        report.columns_after_drop = table.columns().to_vec();
        report.null_counts        = table.null_counts();

        let label_idx = table
            .column_index(&self.rules.label_column)
            .with_context(|| format!("Label column '{}' missing", self.rules.label_column))?;
        let text_idx = table
            .column_index(&self.rules.text_column)
            .with_context(|| format!("Text column '{}' missing", self.rules.text_column))?;

        // ── Step 3: rows without label or text are unusable ──────────────────
        report.empty_rows_dropped = table.retain_rows(|r| {
            !r[label_idx].trim().is_empty() && !r[text_idx].trim().is_empty()
        });
        if report.empty_rows_dropped > 0 {
            tracing::warn!("Dropped {} rows with an empty label or text", report.empty_rows_dropped);
        }

        // ── Step 4: deduplicate on the raw text ──────────────────────────────
        let subset = [self.rules.text_column.clone()];
        report.duplicates_found = table.drop_duplicates(&subset)?;
        tracing::info!("Removed {} duplicate messages", report.duplicates_found);
        report.final_shape = table.shape();

        // ── Step 5: encode labels ────────────────────────────────────────────
        let labels = table.column(&self.rules.label_column)?;
        let mut encoder = LabelEncoder::new();
        let encoded = encoder
            .fit_transform(&labels)
            .context("Encoding the label column")?;
        report.classes = encoder.classes().to_vec();

        let records: Vec<MessageRecord> = table
            .rows()
            .iter()
            .zip(encoded)
            .map(|(row, label)| MessageRecord::new(row[text_idx].clone(), label))
            .collect();

        report.ham  = records.iter().filter(|r| r.label == Label::Ham).count();
        report.spam = records.len() - report.ham;

        tracing::info!(
            "Cleaned corpus: {} messages ({} ham, {} spam)",
            records.len(),
            report.ham,
            report.spam
        );

        Ok(CleanOutcome { records, report })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_csv;
    use std::collections::HashSet;

    const CSV: &str = "v1,v2,,,\n\
        ham,Go until jurong point,,,\n\
        spam,Free entry in 2 a wkly comp,,,\n\
        ham,Go until jurong point,,,\n\
        spam,Go until jurong point,,,\n\
        ham,,,,\n\
        ham,Ok lar... Joking wif u oni...,,,\n";

    fn outcome() -> CleanOutcome {
        let table = parse_csv(CSV).unwrap();
        Cleaner::new(CleaningRules::default()).clean(table).unwrap()
    }

    #[test]
    fn test_no_duplicate_text_after_cleaning() {
        let out = outcome();
        let distinct: HashSet<&str> = out.records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(distinct.len(), out.records.len());
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.report.duplicates_found, 2);
        assert_eq!(out.report.empty_rows_dropped, 1);
    }

    #[test]
    fn test_labels_are_binary_and_first_kept() {
        let out = outcome();
        assert!(out.records.iter().all(|r| r.label.as_u8() <= 1));
        assert_eq!(out.records[0].label, Label::Ham);
        assert_eq!(out.report.ham, 2);
        assert_eq!(out.report.spam, 1);
        assert_eq!(out.report.classes, vec!["ham".to_string(), "spam".to_string()]);
    }

    #[test]
    fn test_renamed_columns() {
        let out = outcome();
        assert_eq!(
            out.report.columns_after_drop,
            vec!["output".to_string(), "text".to_string()]
        );
        assert_eq!(out.report.initial_shape, (6, 5));
        assert_eq!(out.report.final_shape, (3, 2));
    }

    #[test]
    fn test_missing_drop_column_is_error() {
        let table = parse_csv("v1,v2\nham,hi\nspam,win\n").unwrap();
        assert!(Cleaner::new(CleaningRules::default()).clean(table).is_err());
    }
}
