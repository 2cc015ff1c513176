// ============================================================
// Layer 4 - Raw Table
// ============================================================
// A minimal string table: a header row plus rows of cells.
// It holds the CSV exactly as loaded so that the cleaning steps
// (drop columns, rename, deduplicate) can be expressed as plain
// table operations before any typing happens.
//
// Every row always has exactly `columns.len()` cells; the loader
// pads short rows and truncates long ones.
//
// Reference: Rust Book §8 (Vectors, Strings, HashMaps)

use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows:    Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table, normalising every row to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, String::new());
                r
            })
            .collect();
        Self { columns, rows }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let Some(idx) = self.column_index(name) else {
            bail!("column '{}' not found (have: {:?})", name, self.columns);
        };
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Remove the named columns. Unknown names are an error so a
    /// changed input schema is noticed instead of silently ignored.
    pub fn drop_columns(&mut self, names: &[String]) -> Result<()> {
        let mut drop = Vec::with_capacity(names.len());
        for name in names {
            match self.column_index(name) {
                Some(i) => drop.push(i),
                None => bail!("cannot drop unknown column '{}' (have: {:?})", name, self.columns),
            }
        }

        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|i| !drop.contains(i))
            .collect();

        self.columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            let kept: Vec<String> = keep.iter().map(|&i| std::mem::take(&mut row[i])).collect();
            *row = kept;
        }
        Ok(())
    }

    /// Rename columns according to `from → to`. Names absent from the
    /// table are skipped, matching a lenient rename.
    pub fn rename_columns(&mut self, map: &BTreeMap<String, String>) {
        for col in &mut self.columns {
            if let Some(new_name) = map.get(col) {
                *col = new_name.clone();
            }
        }
    }

    /// Number of empty cells per column, in column order.
    pub fn null_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let n = self.rows.iter().filter(|r| r[i].trim().is_empty()).count();
                (c.clone(), n)
            })
            .collect()
    }

    /// Keep only rows for which `keep` returns true; returns how many were removed.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[String]) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| keep(r.as_slice()));
        before - self.rows.len()
    }

    /// How many rows repeat an earlier row on the given subset of columns.
    /// An empty subset means "all columns".
    pub fn duplicated_count(&self, subset: &[String]) -> Result<usize> {
        let idx = self.subset_indices(subset)?;
        let mut seen = HashSet::new();
        Ok(self
            .rows
            .iter()
            .filter(|r| !seen.insert(key_of(r, &idx)))
            .count())
    }

    /// Drop rows that repeat an earlier row on `subset`, keeping the first.
    /// Returns the number of rows removed.
    pub fn drop_duplicates(&mut self, subset: &[String]) -> Result<usize> {
        let idx = self.subset_indices(subset)?;
        let mut seen = HashSet::new();
        Ok(self.retain_rows(|r| seen.insert(key_of(r, &idx))))
    }

    fn subset_indices(&self, subset: &[String]) -> Result<Vec<usize>> {
        if subset.is_empty() {
            return Ok((0..self.columns.len()).collect());
        }
        subset
            .iter()
            .map(|name| match self.column_index(name) {
                Some(i) => Ok(i),
                None => bail!("unknown column '{}' in duplicate subset", name),
            })
            .collect()
    }
}

fn key_of(row: &[String], idx: &[usize]) -> Vec<String> {
    idx.iter().map(|&i| row[i].clone()).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawTable {
        let cols = ["v1", "v2", "Unnamed: 2"].iter().map(|s| s.to_string()).collect();
        let rows = vec![
            vec!["ham".into(), "hello".into(), "".into()],
            vec!["spam".into(), "win now".into(), "x".into()],
            vec!["ham".into(), "hello".into()],
        ];
        RawTable::new(cols, rows)
    }

    #[test]
    fn test_short_rows_are_padded() {
        let t = sample();
        assert_eq!(t.shape(), (3, 3));
        assert_eq!(t.rows()[2].len(), 3);
    }

    #[test]
    fn test_drop_and_rename() {
        let mut t = sample();
        t.drop_columns(&["Unnamed: 2".to_string()]).unwrap();
        let mut map = BTreeMap::new();
        map.insert("v1".to_string(), "output".to_string());
        map.insert("v2".to_string(), "text".to_string());
        t.rename_columns(&map);
        assert_eq!(t.columns(), &["output".to_string(), "text".to_string()]);
        assert_eq!(t.column("text").unwrap(), vec!["hello", "win now", "hello"]);
    }

    #[test]
    fn test_drop_unknown_column_fails() {
        let mut t = sample();
        assert!(t.drop_columns(&["nope".to_string()]).is_err());
    }

    #[test]
    fn test_duplicates_keep_first() {
        let mut t = sample();
        assert_eq!(t.duplicated_count(&[]).unwrap(), 1);
        let removed = t.drop_duplicates(&["v2".to_string()]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(t.shape().0, 2);
        assert_eq!(t.column("v1").unwrap(), vec!["ham", "spam"]);
    }

    #[test]
    fn test_null_counts() {
        let t = sample();
        let nulls = t.null_counts();
        assert_eq!(nulls[2], ("Unnamed: 2".to_string(), 2));
        assert_eq!(nulls[0].1, 0);
    }
}
