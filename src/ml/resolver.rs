// ============================================================
// Layer 5 — Outcome Resolver
// ============================================================
// Composes the two prediction stages:
//
//   INIT ──classifier──▶ CLASSIFIED ──magnitudes──▶ RESOLVED
//
//   active cell   → magnitude from the strategy, or 1 if it has none
//   inactive cell → 0, the strategy is never asked about it
//
// The output has the activation vector's length and order.

use std::sync::Arc;

use crate::domain::error::ModelError;
use crate::domain::labels::ColumnLabelTable;
use crate::domain::record::{is_active, FeatureVector};
use crate::domain::traits::{ActivationModel, ActiveDimension, MagnitudeStrategy};

enum Stage {
    Init,
    Classified(FeatureVector),
    Resolved(FeatureVector),
}

/// Classifier-gated outcome prediction
pub struct OutcomeResolver {
    classifier: Box<dyn ActivationModel>,
    strategy:   Box<dyn MagnitudeStrategy>,
    labels:     Arc<ColumnLabelTable>,
}

impl OutcomeResolver {
    pub fn new(
        classifier: Box<dyn ActivationModel>,
        strategy:   Box<dyn MagnitudeStrategy>,
        labels:     Arc<ColumnLabelTable>,
    ) -> Self {
        Self { classifier, strategy, labels }
    }

    pub fn labels(&self) -> &Arc<ColumnLabelTable> {
        &self.labels
    }

    /// facts_vector → outcome vector with amounts on active cells
    pub fn resolve(&self, facts: &[f64]) -> Result<FeatureVector, ModelError> {
        let mut stage = Stage::Init;
        loop {
            stage = match stage {
                Stage::Init => Stage::Classified(self.classifier.activation(facts)?),
                Stage::Classified(activation) => Stage::Resolved(self.fill(facts, &activation)?),
                Stage::Resolved(outcome) => return Ok(outcome),
            };
        }
    }

    /// Replace active cells of `activation` with their magnitudes
    pub fn fill(&self, facts: &[f64], activation: &[f64]) -> Result<FeatureVector, ModelError> {
        if activation.len() != self.labels.len() {
            return Err(ModelError::DimensionMismatch {
                what:     "activation vector".to_string(),
                expected: self.labels.len(),
                found:    activation.len(),
            });
        }

        let active: Vec<ActiveDimension<'_>> = self
            .labels
            .iter()
            .filter(|c| is_active(activation[c.index]))
            .map(|c| ActiveDimension { index: c.index, name: c.name.as_str() })
            .collect();

        let magnitudes = if active.is_empty() {
            Default::default()
        } else {
            self.strategy.magnitudes(facts, &active)?
        };
        tracing::debug!("{} active dimensions, {} with magnitudes", active.len(), magnitudes.len());

        Ok(activation
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                if is_active(v) {
                    magnitudes.get(&i).copied().unwrap_or(1.0)
                } else {
                    0.0
                }
            })
            .collect())
    }
}
