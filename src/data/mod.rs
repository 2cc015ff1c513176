// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// This layer handles everything from the raw CSV file all the
// way to the numeric feature matrix the classifiers consume.
//
// The pipeline flows in this order:
//
//   spam.csv
//       │
//       ▼
//   CsvLoader         → decodes the file into a RawTable
//       │
//       ▼
//   Cleaner           → drops/renames columns, deduplicates,
//       │               encodes labels (LabelEncoder)
//       ▼
//   stats             → character / word / sentence counts
//       │
//       ▼
//   Preprocessor      → lowercase, tokenize, drop stopwords,
//       │               stem
//       ▼
//   TfidfVectorizer   → one row per message, one column per term
//       │
//       ▼
//   MinMaxScaler      → optional, per feature variant
//       │
//       ▼
//   splitter          → seeded 80/20 train/test split
//
// Each module is responsible for exactly one step.
// This makes each step independently testable and replaceable.
//
// Reference: Rust Book §8 (Common Collections)
//            Rust Book §13 (Iterators and Closures)

/// Reads the CSV file into a RawTable
pub mod loader;

/// In-memory string table with the column operations cleaning needs
pub mod table;

/// Column drop/rename, deduplication, label encoding
pub mod cleaner;

/// Maps class names to 0/1
pub mod encoder;

/// Sentence and Treebank-style word tokenization
pub mod tokenizer;

/// English stopword list and punctuation set
pub mod stopwords;

/// Normalises message text for the vectorizers
pub mod preprocessor;

/// Per-message counts and descriptive statistics
pub mod stats;

/// Count and TF-IDF vectorizers
pub mod vectorizer;

/// Min-max feature scaling
pub mod scaler;

/// Shuffles and splits data into train/test sets and CV folds
pub mod splitter;
