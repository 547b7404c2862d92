// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by the data, ml and application
// layers:
//
//   model_store.rs — every artifact of the binary directory:
//                    the bincode tagged corpus, Burn weight blobs
//                    (BinFileRecorder) and their JSON sidecars
//
//   metrics.rs     — evaluation metrics appended to metrics.csv

/// Tagged corpus, weight blob and sidecar persistence
pub mod model_store;

/// Evaluation metrics CSV logger
pub mod metrics;
