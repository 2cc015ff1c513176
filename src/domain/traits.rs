// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer asks for a table of messages without
// knowing where it comes from. Today the only implementation is
// the CSV loader; a fixture table in tests is another.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::data::table::RawTable;

// ─── MessageSource ────────────────────────────────────────────────────────────
/// Any component that can produce the raw, uncleaned message table.
///
/// Implementations:
///   - CsvLoader   → reads a comma-separated file from disk
///   - RawTable    → an in-memory table is its own source
pub trait MessageSource {
    /// Load the whole table, header included.
    fn load_table(&self) -> Result<RawTable>;
}

impl MessageSource for RawTable {
    fn load_table(&self) -> Result<RawTable> {
        Ok(self.clone())
    }
}
