// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers for one user goal each:
//
//   tag_use_case     — corpus → structured_data_dict.bin
//   train_use_case   — tag (or reuse), fit classifier + strategy,
//                      persist models, log metrics
//   predict_use_case — load models, resolve outcomes for a
//                      judgment or a facts vector
//
// No model math and no printing here; errors are wrapped in
// anyhow with the step that failed.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::data::patterns::PatternCatalogue;
use crate::domain::labels::ColumnLabelTable;
use crate::domain::traits::MagnitudeStrategy;
use crate::ml::ensemble::{RegressionEnsemble, RegressorRegistry};
use crate::ml::multi_output::MultiOutputRegressor;
use crate::ml::trainer::FitOptions;
use crate::ml::RegressionStrategy;

/// Corpus tagging workflow
pub mod tag_use_case;

/// Training workflow
pub mod train_use_case;

/// Outcome prediction workflow
pub mod predict_use_case;

/// Pattern catalogue from a JSON file, or the built-in one
pub fn load_catalogue(patterns: Option<&str>) -> Result<PatternCatalogue> {
    match patterns {
        Some(path) => PatternCatalogue::from_file(Path::new(path))
            .with_context(|| format!("Loading pattern catalogue '{path}'")),
        None => PatternCatalogue::builtin().context("Compiling built-in pattern catalogue"),
    }
}

/// Untrained magnitude strategy of the requested kind
pub fn build_strategy(
    strategy:   RegressionStrategy,
    labels:     Arc<ColumnLabelTable>,
    options:    &FitOptions,
    legal_fees: f64,
) -> Box<dyn MagnitudeStrategy> {
    match strategy {
        RegressionStrategy::PerDimension => {
            let registry = RegressorRegistry::with_defaults(options, legal_fees);
            Box::new(RegressionEnsemble::bind(&registry, labels))
        }
        RegressionStrategy::MultiOutput => Box::new(MultiOutputRegressor::new(labels, options.clone())),
    }
}
