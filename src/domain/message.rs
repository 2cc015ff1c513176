// ============================================================
// Layer 3 - Message Domain Types
// ============================================================
// One entity flows through the whole pipeline: a message record
// holding the raw text, its binary label and the fields derived
// from it (counts and normalised text).
//
// Records only live in memory for one run. There are no
// relationships between them; the only invariants are
//   - the label is ham (0) or spam (1)
//   - no two records share the same raw text (enforced by the cleaner)
//
// Reference: Rust Book §5 (Structs and Methods)
//            Rust Book §6 (Enums and Pattern Matching)

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two classes of the problem.
///
/// The numeric encoding follows a sorted label encoder:
/// "ham" < "spam", so ham is 0 and spam is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    /// Encoded class index used by every model (0 or 1)
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Ham  => 0,
            Label::Spam => 1,
        }
    }

    /// Decode a class index. Anything other than 0 or 1 is rejected.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Label::Ham),
            1 => Some(Label::Spam),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Label::Ham  => "ham",
            Label::Spam => "spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-message counts derived from the raw text.
/// Unsigned integers, so they can never be negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    /// Number of Unicode scalar values in the raw text
    pub characters: usize,

    /// Number of word tokens (punctuation tokens included)
    pub words: usize,

    /// Number of sentences
    pub sentences: usize,
}

/// A cleaned, labelled message plus its derived fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// The raw message text exactly as loaded
    pub text: String,

    /// Ham or spam
    pub label: Label,

    /// Character / word / sentence counts of `text`
    pub stats: TextStats,

    /// Lowercased, filtered, stemmed text; empty until the
    /// preprocessing step has run
    pub normalized: String,
}

impl MessageRecord {
    /// Create a record with empty derived fields.
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text:       text.into(),
            label,
            stats:      TextStats::default(),
            normalized: String::new(),
        }
    }

    pub fn is_spam(&self) -> bool {
        self.label == Label::Spam
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encoding() {
        assert_eq!(Label::Ham.as_u8(), 0);
        assert_eq!(Label::Spam.as_u8(), 1);
        assert_eq!(Label::from_u8(1), Some(Label::Spam));
        assert_eq!(Label::from_u8(2), None);
    }

    #[test]
    fn test_new_record_has_empty_derived_fields() {
        let r = MessageRecord::new("Free entry now", Label::Spam);
        assert!(r.is_spam());
        assert!(r.normalized.is_empty());
        assert_eq!(r.stats, TextStats::default());
    }
}
