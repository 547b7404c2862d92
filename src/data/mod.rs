// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from judgment files on disk to feature matrices:
//
//   corpus directory
//       │
//       ▼
//   TextCorpusLoader  → reads files, skips undecodable ones
//       │
//       ▼
//   Preprocessor      → folds odd spacing, line endings
//       │
//       ▼
//   RegexTagger       → PatternCatalogue → TaggedRecord per judgment
//       │
//       ▼
//   split_train_test  → seeded train / held-out split
//       │
//       ▼
//   FeatureMatrix     → [rows, cols] tensors for the ml layer

/// Reads plain-text judgments from a directory
pub mod loader;

/// Normalises judgment text before matching
pub mod preprocessor;

/// Compiled regex catalogue and the built-in lease patterns
pub mod patterns;

/// Regex tagger and intent index
pub mod tagger;

/// Feature matrices and target scaling
pub mod dataset;

/// Seeded train / test split
pub mod splitter;
