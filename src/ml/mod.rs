// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Every Burn-specific piece of the predictor lives here.
//
//   model.rs        — LinearHead, a single affine layer
//   trainer.rs      — full-batch Adam fitting (logistic / squared error)
//   evaluation.rs   — precision / recall / f1, R², explained variance
//   classifier.rs   — multi-label classifier: facts → activation vector
//   regressor.rs    — one linear regressor per outcome column
//   ensemble.rs     — name → regressor registration table
//   multi_output.rs — secondary strategy: one regressor for all columns
//   resolver.rs     — classify, then fill magnitudes for active columns
//
// Training runs on Autodiff<NdArray>; `model.valid()` hands back
// the NdArray (inference) copy that is kept, saved and queried.

use serde::{Deserialize, Serialize};

/// Multi-label boolean classifier
pub mod classifier;

/// Per-dimension registration table
pub mod ensemble;

/// Quality metrics for the training report
pub mod evaluation;

/// Linear layer shared by every model
pub mod model;

/// Multi-output regressor over all outcome columns
pub mod multi_output;

/// Single-column linear regressor
pub mod regressor;

/// Classifier-gated outcome resolution
pub mod resolver;

/// Full-batch training loop
pub mod trainer;

/// Backend used while fitting (gradients tracked)
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Backend used by trained models
pub type InferBackend = burn::backend::NdArray;

/// How active outcome dimensions receive their magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegressionStrategy {
    /// One regressor per registered column name (primary)
    #[default]
    PerDimension,
    /// One regressor over every column, trained on values > 1
    MultiOutput,
}
