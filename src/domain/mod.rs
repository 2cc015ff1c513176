// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that describe what the
// pipeline works on: a labelled SMS message and the numbers we
// derive from it.
//
// Rules for this layer:
//   - NO file I/O
//   - NO ndarray or model code
//   - Only plain Rust types and traits
//
// The feature vector of a message is NOT stored here. It lives
// as row i of the feature matrix built in the data layer, where
// i is the position of the record in the cleaned corpus.
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// A labelled message and its derived statistics
pub mod message;

// Core abstractions (traits) that other layers implement
pub mod traits;
