// ============================================================
// Layer 6 - Score Logger
// ============================================================
// Writes every (algorithm, variant) score of a run to one CSV
// file, so runs can be compared in a spreadsheet afterwards.
//
// Output file: <report_dir>/performance.csv
//
// Example:
//   algorithm,variant,accuracy,precision
//   KN,max_ft_3000,0.9052224371373307,1.0
//   NB,max_ft_3000,0.9709864603481625,1.0
//   ...
//
// The file is rewritten on every run; each run's scores stand
// on their own.
//
// Reference: Rust Book §12 (I/O and File Handling)
//            csv crate documentation (Writer::serialize)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::ml::evaluate::ScoreRecord;

pub struct ScoreLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl ScoreLogger {
    /// Creates the report directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create report directory '{}'", dir.display()))?;

        Ok(Self { csv_path: dir.join("performance.csv") })
    }

    pub fn write(&self, records: &[ScoreRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.csv_path)
            .with_context(|| format!("Cannot create '{}'", self.csv_path.display()))?;

        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        tracing::info!("Wrote {} scores to '{}'", records.len(), self.csv_path.display());
        Ok(())
    }

    /// Read a report back, e.g. to compare against a later run
    pub fn read(&self) -> Result<Vec<ScoreRecord>> {
        let mut reader = csv::Reader::from_path(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        reader
            .deserialize()
            .collect::<Result<Vec<ScoreRecord>, _>>()
            .with_context(|| format!("Malformed score report '{}'", self.csv_path.display()))
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
