// ============================================================
// Layer 4 - Text Preprocessor
// ============================================================
// Normalises a raw SMS into the short, stemmed form that the
// vectorizer consumes.
//
// Steps (applied in order):
//   1. Lowercase the whole message
//   2. Tokenize into words (Treebank rules, see tokenizer.rs)
//   3. Keep only tokens made entirely of alphanumeric characters
//   4. Remove English stopwords and punctuation
//   5. Stem each remaining token (Snowball English stemmer)
//   6. Join the tokens back with single spaces
//
// Example:
//   "Did you like mY pResentation on Ml"  →  "like present ml"
//
// The output must be a fixed point: running it through the
// preprocessor again has to return it unchanged. A single pass
// does not guarantee that, because stemming can produce a new
// stopword ("doing" → "do") or a word that stems further. So the
// six steps are repeated on their own output until nothing
// changes. Every pass only drops or shortens tokens, so this
// settles after one or two extra passes in practice.
//
// Reference: Porter (1980), "An algorithm for suffix stripping"
//            Snowball English stemmer (rust-stemmers crate)

use rust_stemmers::{Algorithm, Stemmer};

use crate::data::stopwords::{is_punctuation, is_stopword};
use crate::data::tokenizer::word_tokenize;

/// Upper bound on normalisation passes
const MAX_PASSES: usize = 8;

pub struct Preprocessor {
    stemmer: Stemmer,
}

impl Preprocessor {
    /// Create a new Preprocessor with the English stemmer
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Normalise a raw message. Idempotent on its own output.
    pub fn transform(&self, text: &str) -> String {
        let mut current = self.single_pass(text);

        for _ in 1..MAX_PASSES {
            let next = self.single_pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }

        tracing::warn!("Normalisation did not settle after {} passes: '{}'", MAX_PASSES, current);
        current
    }

    /// Steps 1-6 exactly once.
    fn single_pass(&self, text: &str) -> String {
        let lowered = text.to_lowercase();

        word_tokenize(&lowered)
            .into_iter()
            .filter(|t| !t.is_empty() && t.chars().all(char::is_alphanumeric))
            .filter(|t| !is_stopword(t) && !is_punctuation(t))
            .map(|t| self.stemmer.stem(&t).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentation_example() {
        let p = Preprocessor::new();
        assert_eq!(p.transform("Did you like mY pResentation on Ml"), "like present ml");
    }

    #[test]
    fn test_contractions_and_punctuation() {
        let p = Preprocessor::new();
        assert_eq!(
            p.transform(
                "I'm gonna be home soon and i don't want to talk about this stuff anymore tonight, k?"
            ),
            "gon na home soon want talk stuff anymor tonight k"
        );
    }

    #[test]
    fn test_drops_non_alphanumeric_tokens() {
        let p = Preprocessor::new();
        // "£100" and "www.win.com" mix symbols with letters and are dropped
        let out = p.transform("Claim £100 at www.win.com NOW!!!");
        assert_eq!(out, "claim");
    }

    #[test]
    fn test_idempotent() {
        let p = Preprocessor::new();
        let samples = [
            "Go until jurong point, crazy.. Available only in bugis n great world la e buffet...",
            "Free entry in 2 a wkly comp to win FA Cup final tkts 21st May 2005.",
            "Doing the agreed things, generously and happily!",
            "U dun say so early hor... U c already then say...",
            "",
        ];
        for s in samples {
            let once  = p.transform(s);
            let twice = p.transform(&once);
            assert_eq!(once, twice, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.transform(""), "");
    }
}
