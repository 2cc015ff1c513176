// ============================================================
// Layer 4 - Word and Sentence Tokenizer
// ============================================================
// Splits raw text into sentences and word tokens.
//
// Sentences use the Unicode sentence boundary rules (UAX #29)
// provided by the `unicode-segmentation` crate.
//
// Words use a Penn Treebank style tokenizer applied to each
// sentence. It is a sequence of regex rewrites that pad
// punctuation with spaces, followed by a whitespace split:
//
//   "I'm gonna be home soon, k?"
//     → I 'm gon na be home soon , k ?
//
// Rules applied, in order:
//   1. starting quotes     (" at the start becomes ``)
//   2. punctuation         (, ; : @ # $ % & ? ! * and the final period)
//   3. brackets and "--"
//   4. ending quotes and clitics ('s 'm 'd 'll 're 've n't)
//   5. fixed contractions  (cannot, gonna, gotta, wanna, gimme, lemme)
//
// The Rust regex engine has no look-around, so the two rules that
// need it are written without: "wanna" is matched with a trailing
// whitespace instead of a look-ahead, and the rule that separates
// a leading apostrophe from a word is left out.
//
// Reference: Penn Treebank tokenization conventions
//            Unicode Standard Annex #29 (Text Segmentation)

use regex::Regex;
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;

type Rule = (Regex, &'static str);

fn compile(rules: &[(&str, &'static str)]) -> Vec<Rule> {
    rules
        .iter()
        .map(|(pattern, replacement)| {
            (Regex::new(pattern).expect("static tokenizer regex"), *replacement)
        })
        .collect()
}

static STARTING_QUOTES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    compile(&[
        (r"([«“‘„]|`+)", " $1 "),
        (r#"^""#, "``"),
        (r"(``)", " $1 "),
        (r#"([ (\[{<])("|'')"#, "$1 `` "),
    ])
});

static PUNCTUATION: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    compile(&[
        (r#"([^.])(\.)([\])}>"']*)\s*$"#, "$1 $2 $3 "),
        (r"([:,])([^\d])", " $1 $2"),
        (r"([:,])$", " $1 "),
        (r"\.{2,}", " $0 "),
        (r"[;@#$%&]", " $0 "),
        (r#"([^.])(\.)([\])}>"']*)\s*$"#, "$1 $2$3 "),
        (r"[?!]", " $0 "),
        (r"([^'])' ", "$1 ' "),
        (r"[*]", " $0 "),
    ])
});

static BRACKETS: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    compile(&[
        (r"[\]\[(){}<>]", " $0 "),
        (r"--", " -- "),
    ])
});

static ENDING_QUOTES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    compile(&[
        (r"([»”’])", " $1 "),
        (r"''", " '' "),
        (r#"""#, " '' "),
        (r"([^' ])('[sS]|'[mM]|'[dD]|') ", "$1 $2 "),
        (r"([^' ])('ll|'LL|'re|'RE|'ve|'VE|n't|N'T) ", "$1 $2 "),
    ])
});

static CONTRACTIONS: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\b(can)(not)\b", " $1 $2 "),
        (r"(?i)\b(d)('ye)\b", " $1 $2 "),
        (r"(?i)\b(gim)(me)\b", " $1 $2 "),
        (r"(?i)\b(gon)(na)\b", " $1 $2 "),
        (r"(?i)\b(got)(ta)\b", " $1 $2 "),
        (r"(?i)\b(lem)(me)\b", " $1 $2 "),
        (r"(?i)\b(more)('n)\b", " $1 $2 "),
        (r"(?i)\b(wan)(na)\s", " $1 $2 "),
        (r"(?i) ('t)(is)\b", " $1 $2 "),
        (r"(?i) ('t)(was)\b", " $1 $2 "),
    ])
});

fn apply(rules: &[Rule], text: String) -> String {
    rules.iter().fold(text, |acc, (re, rep)| re.replace_all(&acc, *rep).into_owned())
}

/// Split text into sentences. Only whitespace-only pieces are
/// dropped; a lone "!!!" still counts as one sentence.
pub fn sent_tokenize(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Tokenize a single sentence with the Treebank rules.
pub fn treebank_tokenize(sentence: &str) -> Vec<String> {
    let text = apply(&STARTING_QUOTES, sentence.to_string());
    let text = apply(&PUNCTUATION, text);
    let text = apply(&BRACKETS, text);
    let text = format!(" {text} ");
    let text = apply(&ENDING_QUOTES, text);
    let text = apply(&CONTRACTIONS, text);

    text.split_whitespace().map(str::to_string).collect()
}

/// Split text into word tokens: sentence split first, then the
/// Treebank rules on each piece.
pub fn word_tokenize(text: &str) -> Vec<String> {
    text.split_sentence_bounds()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .flat_map(treebank_tokenize)
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_punctuation_and_final_period() {
        assert_eq!(
            word_tokenize("Hello, world."),
            vec!["Hello", ",", "world", "."]
        );
    }

    #[test]
    fn test_clitics_and_contractions() {
        let toks = word_tokenize("I'm gonna be home soon and i don't want to, k?");
        assert_eq!(
            toks,
            vec![
                "I", "'m", "gon", "na", "be", "home", "soon", "and", "i", "do", "n't",
                "want", "to", ",", "k", "?"
            ]
        );
    }

    #[test]
    fn test_ellipsis_stays_together() {
        let toks = word_tokenize("Ok lar... Joking wif u oni...");
        assert!(toks.contains(&"...".to_string()));
        assert!(toks.contains(&"Joking".to_string()));
    }

    #[test]
    fn test_sentence_count() {
        assert_eq!(sent_tokenize("Go home. Now! Ok?").len(), 3);
        assert_eq!(sent_tokenize("").len(), 0);
        assert_eq!(sent_tokenize("no terminal punctuation").len(), 1);
        assert_eq!(sent_tokenize("!!!"), vec!["!!!"]);
        assert_eq!(sent_tokenize("   ").len(), 0);
    }

    #[test]
    fn test_quotes() {
        let toks = word_tokenize("He said \"hi\"");
        assert_eq!(toks, vec!["He", "said", "``", "hi", "''"]);
    }
}
