// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the layers:
//
//   DocumentSource     — data::loader reads judgments from disk
//   Persistable        — every trained model saves / loads itself
//   ActivationModel    — the multi-label classifier (stage one)
//   DimensionRegressor — one regressor bound to one outcome column
//   MagnitudeStrategy  — how active dimensions get their amounts
//                        (per-dimension ensemble or multi-output)
//
// The resolver only sees ActivationModel + MagnitudeStrategy, so
// tests can swap either one for a mock.

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::document::{CorpusFile, LoadedCorpus};
use crate::domain::error::{ModelError, TaggerError};
use crate::domain::record::{FeatureVector, TaggedRecord};
use crate::ml::evaluation::RegressionReport;

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Any component that can load judgment documents.
pub trait DocumentSource {
    /// Load at most `limit` documents (all of them when `None`).
    /// Unreadable files are reported in `LoadedCorpus::skipped`,
    /// never as an error.
    fn load(&self, limit: Option<usize>) -> Result<LoadedCorpus, TaggerError>;

    /// The files `load(limit)` would visit, without reading them
    fn listing(&self, limit: Option<usize>) -> Result<Vec<CorpusFile>, TaggerError>;
}

// ─── Persistable ──────────────────────────────────────────────────────────────
/// A model whose learned state lives in a binary blob inside `dir`.
pub trait Persistable {
    fn save(&self, dir: &Path) -> Result<(), ModelError>;

    /// Replace in-memory state with the blob found in `dir`.
    /// A missing blob is `ModelError::NotFound`.
    fn load(&mut self, dir: &Path) -> Result<(), ModelError>;
}

// ─── ActivationModel ──────────────────────────────────────────────────────────
/// Stage one of prediction: which outcome dimensions apply.
pub trait ActivationModel {
    /// Returns a 0/1 vector with one slot per outcome column
    fn activation(&self, facts: &[f64]) -> Result<FeatureVector, ModelError>;
}

// ─── DimensionRegressor ───────────────────────────────────────────────────────
/// A regressor responsible for exactly one outcome column.
///
/// Trained only on records where its column is non-zero, so its
/// output is meaningless unless the classifier activated that column.
pub trait DimensionRegressor: Persistable {
    /// Semantic column name, also the blob stem (`<name>_model.bin`)
    fn name(&self) -> &str;

    /// Outcome column this regressor was bound to
    fn column(&self) -> usize;

    fn train(&mut self, records: &[TaggedRecord]) -> Result<(), ModelError>;

    fn predict(&self, facts: &[f64]) -> Result<f64, ModelError>;

    /// First coefficient vector of the underlying linear model,
    /// `None` when untrained
    fn weights(&self) -> Option<Vec<f32>>;

    fn is_trained(&self) -> bool;

    /// Held-out quality of the last `train` call
    fn evaluation(&self) -> Option<&RegressionReport> {
        None
    }
}

// ─── MagnitudeStrategy ────────────────────────────────────────────────────────
/// An outcome column the classifier switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveDimension<'a> {
    pub index: usize,
    pub name:  &'a str,
}

/// Stage two of prediction: amounts for active dimensions.
pub trait MagnitudeStrategy: Persistable {
    fn train(&mut self, records: &[TaggedRecord]) -> Result<(), ModelError>;

    /// Return a magnitude for every active dimension this strategy
    /// knows how to fill. Dimensions left out keep their boolean 1.
    fn magnitudes(
        &self,
        facts:  &[f64],
        active: &[ActiveDimension<'_>],
    ) -> Result<BTreeMap<usize, f64>, ModelError>;

    /// (model name, held-out report) for every model trained by the
    /// last `train` call
    fn evaluations(&self) -> Vec<(String, RegressionReport)> {
        Vec::new()
    }
}
