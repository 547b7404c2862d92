// ============================================================
// Layer 5 — Multi-Output Regressor
// ============================================================
// Secondary magnitude strategy: one linear model predicting every
// outcome column at once.
//
//   target[i] = outcomes_vector[i]  if it is > 1 (an amount)
//               0                   otherwise (a boolean hit)
//
// Trained on the whole corpus. Columns that never carried an amount
// in training are left out of `magnitudes`, so the resolver keeps
// their boolean 1.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::data::dataset::FeatureMatrix;
use crate::domain::error::ModelError;
use crate::domain::labels::ColumnLabelTable;
use crate::domain::record::TaggedRecord;
use crate::domain::traits::{ActiveDimension, MagnitudeStrategy, Persistable};
use crate::infra::model_store::ModelStore;
use crate::ml::evaluation::{regression_report, RegressionReport};
use crate::ml::trainer::{fit_linear, holdout, FitOptions, LinearFit, LinearFitMeta, Objective};

/// Blob stem of the multi-output regressor
pub const MULTI_OUTPUT_STEM: &str = "multi_output_model";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MultiOutputMeta {
    fit:            LinearFitMeta,
    /// Columns with at least one amount in training
    fitted_columns: Vec<usize>,
    labels:         ColumnLabelTable,
}

struct Fitted {
    model:          LinearFit,
    fitted_columns: Vec<usize>,
}

pub struct MultiOutputRegressor {
    labels:     Arc<ColumnLabelTable>,
    options:    FitOptions,
    fitted:     Option<Fitted>,
    evaluation: Option<RegressionReport>,
}

fn amount_targets(records: &[TaggedRecord], width: usize) -> Vec<Vec<f64>> {
    records
        .iter()
        .map(|r| {
            (0..width)
                .map(|c| match r.outcomes_vector.get(c) {
                    Some(&v) if v > 1.0 => v,
                    _ => 0.0,
                })
                .collect()
        })
        .collect()
}

impl MultiOutputRegressor {
    pub fn new(labels: Arc<ColumnLabelTable>, options: FitOptions) -> Self {
        Self { labels, options, fitted: None, evaluation: None }
    }

    pub fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    /// Column-0 coefficients, `None` when untrained
    pub fn weights(&self) -> Option<Vec<f32>> {
        let Some(fitted) = self.fitted.as_ref() else {
            tracing::warn!("Multi-output regressor has no weights: not trained");
            return None;
        };
        fitted.model.weights("multi-output regressor")
    }

    /// Amounts for every outcome column
    pub fn predict(&self, facts: &[f64]) -> Result<Vec<f64>, ModelError> {
        let out = self.fitted()?.model.predict_one(facts)?;
        Ok(out.iter().map(|&v| v as f64).collect())
    }

    fn fitted(&self) -> Result<&Fitted, ModelError> {
        self.fitted.as_ref().ok_or_else(|| {
            tracing::warn!("Multi-output regressor used before training or loading");
            ModelError::NotInitialized(MULTI_OUTPUT_STEM.to_string())
        })
    }
}

impl MagnitudeStrategy for MultiOutputRegressor {
    fn train(&mut self, records: &[TaggedRecord]) -> Result<(), ModelError> {
        let width = self.labels.len();
        if width == 0 {
            return Err(ModelError::EmptyDataset("multi-output outcome labels".to_string()));
        }

        let (train, test) = holdout(records, &self.options);
        let x       = FeatureMatrix::facts(&train)?;
        let targets = amount_targets(&train, width);
        let y       = FeatureMatrix::from_owned_rows("multi-output targets", &targets)?;

        let fitted_columns: Vec<usize> = (0..width)
            .filter(|&c| targets.iter().any(|row| row[c] != 0.0))
            .collect();

        tracing::info!(
            "Training multi-output regressor: {} records ({} held out), {} of {} columns carry amounts",
            train.len(), test.len(), fitted_columns.len(), width,
        );
        let model = fit_linear(MULTI_OUTPUT_STEM, &x, &y, Objective::SquaredError, &self.options)?;

        self.evaluation = if test.is_empty() {
            None
        } else {
            let pred: Vec<Vec<f64>> = model
                .predict_rows(&FeatureMatrix::facts(&test)?)?
                .iter()
                .map(|row| row.iter().map(|&v| v as f64).collect())
                .collect();
            let report = regression_report(&amount_targets(&test, width), &pred)?;
            tracing::info!(
                "Multi-output held-out r2 {:.4}, explained variance {:.4}",
                report.r2, report.explained_variance,
            );
            Some(report)
        };
        self.fitted = Some(Fitted { model, fitted_columns });
        Ok(())
    }

    fn magnitudes(
        &self,
        facts:  &[f64],
        active: &[ActiveDimension<'_>],
    ) -> Result<BTreeMap<usize, f64>, ModelError> {
        if active.is_empty() {
            return Ok(BTreeMap::new());
        }
        let amounts = self.predict(facts)?;
        let fitted  = self.fitted()?;
        Ok(active
            .iter()
            .filter(|d| fitted.fitted_columns.contains(&d.index))
            .filter_map(|d| amounts.get(d.index).map(|&v| (d.index, v)))
            .collect())
    }

    fn evaluations(&self) -> Vec<(String, RegressionReport)> {
        self.evaluation
            .iter()
            .map(|r| (MULTI_OUTPUT_STEM.to_string(), r.clone()))
            .collect()
    }
}

impl Persistable for MultiOutputRegressor {
    fn save(&self, dir: &Path) -> Result<(), ModelError> {
        let fitted = self.fitted()?;
        let store  = ModelStore::new(dir);
        fitted.model.save(&store, MULTI_OUTPUT_STEM)?;
        store.save_json(MULTI_OUTPUT_STEM, &MultiOutputMeta {
            fit:            fitted.model.meta(),
            fitted_columns: fitted.fitted_columns.clone(),
            labels:         self.labels.as_ref().clone(),
        })?;
        tracing::info!("Multi-output regressor saved to '{}'", store.weights_path(MULTI_OUTPUT_STEM).display());
        Ok(())
    }

    fn load(&mut self, dir: &Path) -> Result<(), ModelError> {
        let store   = ModelStore::new(dir);
        let weights = store.weights_path(MULTI_OUTPUT_STEM);
        if !weights.is_file() {
            return Err(ModelError::NotFound(weights));
        }

        let meta: MultiOutputMeta = store.load_json(MULTI_OUTPUT_STEM)?;
        let model = LinearFit::restore(&store, MULTI_OUTPUT_STEM, meta.fit)?;

        self.labels     = Arc::new(meta.labels);
        self.fitted     = Some(Fitted { model, fitted_columns: meta.fitted_columns });
        self.evaluation = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Arc<ColumnLabelTable> {
        Arc::new(ColumnLabelTable::from_names(["orders_resiliation", "additional_indemnity_money"]))
    }

    // column 1 carries 200·facts[0]; column 0 is boolean only
    fn records() -> Vec<TaggedRecord> {
        (0..10)
            .map(|i| {
                let x0 = (i % 2) as f64;
                TaggedRecord::new(format!("{i}.txt"), vec![x0, 1.0 - x0], vec![], vec![1.0, 200.0 * x0])
            })
            .collect()
    }

    fn trained() -> MultiOutputRegressor {
        let mut m = MultiOutputRegressor::new(labels(), FitOptions::default());
        m.train(&records()).unwrap();
        m
    }

    fn active(labels: &ColumnLabelTable) -> Vec<ActiveDimension<'_>> {
        labels
            .iter()
            .map(|c| ActiveDimension { index: c.index, name: c.name.as_str() })
            .collect()
    }

    #[test]
    fn test_boolean_columns_are_not_filled() {
        let m      = trained();
        let labels = labels();
        let out    = m.magnitudes(&[1.0, 0.0], &active(&labels)).unwrap();
        assert!(!out.contains_key(&0));
        assert!((out[&1] - 200.0).abs() < 2.0, "got {}", out[&1]);
    }

    #[test]
    fn test_only_asked_columns_are_returned() {
        let m      = trained();
        let labels = labels();
        let out    = m.magnitudes(&[1.0, 0.0], &active(&labels)[..1]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_round_trip_and_untrained() {
        let untrained = MultiOutputRegressor::new(labels(), FitOptions::default());
        assert!(matches!(untrained.predict(&[1.0, 0.0]), Err(ModelError::NotInitialized(_))));

        let dir = tempfile::tempdir().unwrap();
        let m   = trained();
        m.save(dir.path()).unwrap();

        let mut back = MultiOutputRegressor::new(labels(), FitOptions::default());
        back.load(dir.path()).unwrap();
        assert_eq!(back.predict(&[0.0, 1.0]).unwrap(), m.predict(&[0.0, 1.0]).unwrap());
        assert_eq!(m.evaluations().len(), 1);
    }
}
