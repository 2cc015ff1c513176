// ============================================================
// Layer 4 - CSV Loader
// ============================================================
// Loads the message table from a comma-separated file using the
// `csv` crate.
//
// Two quirks of the SMS spam dataset are handled here:
//
//   1. Encoding. The file is Latin-1, not UTF-8 (it contains
//      bytes like 0x93 for curly quotes and 0xA3 for the pound
//      sign). We decode as UTF-8 when the bytes are valid and
//      fall back to Latin-1 otherwise. Latin-1 maps every byte
//      to the code point with the same value, so decoding never
//      fails.
//
//   2. Header. The header row is "v1,v2,,,". The three empty
//      names are given the placeholder "Unnamed: <index>" so that
//      they can be dropped by name later on.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{fs, path::{Path, PathBuf}};

use crate::data::table::RawTable;
use crate::domain::traits::MessageSource;

/// Loads a CSV file into a RawTable.
pub struct CsvLoader {
    /// Path to the .csv file
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MessageSource for CsvLoader {
    fn load_table(&self) -> Result<RawTable> {
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Cannot read dataset '{}'", self.path.display()))?;

        let text = decode_text(&bytes);
        let table = parse_csv(&text)
            .with_context(|| format!("Malformed CSV in '{}'", self.path.display()))?;

        let (rows, cols) = table.shape();
        tracing::info!(
            "Loaded '{}': {} rows x {} columns",
            self.path.display(),
            rows,
            cols
        );
        Ok(table)
    }
}

/// Decode raw bytes as UTF-8, falling back to Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.strip_prefix('\u{FEFF}').unwrap_or(s).to_string(),
        Err(_) => {
            tracing::debug!("Input is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// Parse CSV text (header row first) into a RawTable.
/// Ragged rows are accepted; RawTable pads or the header width wins.
pub fn parse_csv(text: &str) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if h.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                h.to_string()
            }
        })
        .collect();

    let width = columns.len();
    let mut rows = Vec::new();
    let mut ragged = 0usize;

    for record in reader.records() {
        let record = record?;
        if record.len() > width {
            ragged += 1;
        }
        rows.push(record.iter().take(width).map(str::to_string).collect());
    }

    if ragged > 0 {
        tracing::warn!("{} rows had more fields than the header; extra cells ignored", ragged);
    }

    Ok(RawTable::new(columns, rows))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unnamed_columns() {
        let t = parse_csv("v1,v2,,,\nham,hi there,,,\nspam,\"win, now\",,,\n").unwrap();
        assert_eq!(
            t.columns(),
            &["v1", "v2", "Unnamed: 2", "Unnamed: 3", "Unnamed: 4"].map(String::from)
        );
        assert_eq!(t.column("v2").unwrap(), vec!["hi there", "win, now"]);
    }

    #[test]
    fn test_latin1_fallback() {
        // 0xA3 is the pound sign in Latin-1 and invalid as a lone UTF-8 byte
        let bytes = b"v1,v2\nspam,Win \xA3100\n";
        let text = decode_text(bytes);
        assert!(text.contains("Win \u{00A3}100"));
    }

    #[test]
    fn test_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"v1,v2,,,\nham,Ok lar...,,,\nham,Ok lar...,,,\n").unwrap();

        let loader = CsvLoader::new(f.path());
        let table  = loader.load_table().unwrap();
        assert_eq!(table.shape(), (2, 5));
    }

    #[test]
    fn test_missing_file_is_error() {
        let loader = CsvLoader::new("definitely/not/here.csv");
        assert!(loader.load_table().is_err());
    }
}
