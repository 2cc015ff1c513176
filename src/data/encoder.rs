// ============================================================
// Layer 4 - Label Encoder
// ============================================================
// Turns the categorical label column ("ham" / "spam") into the
// class indices 0 / 1.
//
// Classes are sorted before indices are assigned, so the mapping
// does not depend on which label happens to appear first:
//
//   "ham"  → 0
//   "spam" → 1
//
// The problem is strictly binary. A column with a single class or
// with three or more classes is rejected.

use anyhow::{bail, Result};
use std::collections::BTreeSet;

use crate::domain::message::Label;

#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the sorted set of class names.
    pub fn fit<'a>(&mut self, values: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let distinct: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.trim().to_string())
            .collect();

        if distinct.len() != 2 {
            bail!(
                "expected exactly two label classes, found {}: {:?}",
                distinct.len(),
                distinct
            );
        }

        self.classes = distinct.into_iter().collect();
        tracing::debug!("Label classes: {:?}", self.classes);
        Ok(())
    }

    /// Sorted class names; index i is encoded as i.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Encode one label value.
    pub fn transform(&self, value: &str) -> Result<Label> {
        let value = value.trim();
        let Some(idx) = self.classes.iter().position(|c| c == value) else {
            bail!("unknown label '{}' (classes: {:?})", value, self.classes);
        };
        match Label::from_u8(idx as u8) {
            Some(label) => Ok(label),
            None => bail!("label index {} is outside the binary range", idx),
        }
    }

    /// Fit and encode in one pass over the same column.
    pub fn fit_transform<'a>(&mut self, values: &[&'a str]) -> Result<Vec<Label>> {
        self.fit(values.iter().copied())?;
        values.iter().map(|v| self.transform(v)).collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_encoding() {
        let mut enc = LabelEncoder::new();
        let labels  = enc.fit_transform(&["spam", "ham", "ham"]).unwrap();
        assert_eq!(labels, vec![Label::Spam, Label::Ham, Label::Ham]);
        assert_eq!(enc.classes(), &["ham".to_string(), "spam".to_string()]);
    }

    #[test]
    fn test_rejects_non_binary() {
        let mut enc = LabelEncoder::new();
        assert!(enc.fit_transform(&["ham", "ham"]).is_err());
        assert!(enc.fit_transform(&["ham", "spam", "maybe"]).is_err());
    }

    #[test]
    fn test_unknown_label() {
        let mut enc = LabelEncoder::new();
        enc.fit(["ham", "spam"]).unwrap();
        assert!(enc.transform("eggs").is_err());
    }
}
