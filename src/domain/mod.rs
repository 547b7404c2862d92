// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that describe the core
// concepts of the predictor:
//
//   - a judgment Document read from disk
//   - a TaggedRecord holding the three feature vectors
//   - the ColumnLabelTable / IntentIndex that name vector positions
//   - the traits the ml layer implements (classifier, regressors)
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - NO regex compilation (that belongs to data::patterns)

/// A judgment document loaded from disk
pub mod document;

/// Tagged records and the vector categories
pub mod record;

/// Position → label tables shared by classifier and resolver
pub mod labels;

/// Typed errors for the model and tagger boundaries
pub mod error;

/// Core abstractions (traits) that other layers implement
pub mod traits;
