// ============================================================
// Layer 5 — Per-Dimension Regressor
// ============================================================
// A linear regressor bound to one outcome column:
//
//   amount = inverse_scale(x · w + b)
//
// Only records where its column is non-zero take part in training,
// so the model learns "how much, given that it happened". Whether
// it happened is the classifier's job; the resolver never asks a
// regressor about an inactive column.
//
// Facts and targets are standardised before fitting (amounts run
// from tens to thousands of dollars); the scalers are saved in the
// `<name>_model.json` sidecar next to `<name>_model.bin`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::dataset::FeatureMatrix;
use crate::domain::error::ModelError;
use crate::domain::record::TaggedRecord;
use crate::domain::traits::{DimensionRegressor, Persistable};
use crate::infra::model_store::ModelStore;
use crate::ml::evaluation::{regression_report, RegressionReport};
use crate::ml::trainer::{fit_linear, holdout, FitOptions, LinearFit, LinearFitMeta, Objective};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegressorMeta {
    name:   String,
    column: usize,
    fit:    LinearFitMeta,
}

/// Linear regressor for a single outcome column
pub struct LinearRegressor {
    name:       String,
    column:     usize,
    options:    FitOptions,
    model:      Option<LinearFit>,
    evaluation: Option<RegressionReport>,
}

impl LinearRegressor {
    pub fn new(name: impl Into<String>, column: usize, options: FitOptions) -> Self {
        Self {
            name: name.into(),
            column,
            options,
            model: None,
            evaluation: None,
        }
    }

    /// `<name>_model`
    pub fn stem(&self) -> String {
        format!("{}_model", self.name)
    }

    fn targets(&self, records: &[TaggedRecord]) -> Result<FeatureMatrix, ModelError> {
        let rows: Vec<Vec<f64>> = records
            .iter()
            .map(|r| vec![r.outcomes_vector.get(self.column).copied().unwrap_or(0.0)])
            .collect();
        FeatureMatrix::from_owned_rows(&self.name, &rows)
    }

    fn trained(&self) -> Result<&LinearFit, ModelError> {
        self.model.as_ref().ok_or_else(|| {
            tracing::warn!("Regressor '{}' used before training or loading", self.name);
            ModelError::NotInitialized(self.name.clone())
        })
    }
}

impl DimensionRegressor for LinearRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn column(&self) -> usize {
        self.column
    }

    fn train(&mut self, records: &[TaggedRecord]) -> Result<(), ModelError> {
        let positives: Vec<TaggedRecord> = records
            .iter()
            .filter(|r| r.outcome_active(self.column))
            .cloned()
            .collect();
        if positives.is_empty() {
            return Err(ModelError::EmptyDataset(self.name.clone()));
        }

        let (train, test) = holdout(&positives, &self.options);
        let x = FeatureMatrix::facts(&train)?;
        let y = self.targets(&train)?;

        tracing::info!(
            "Training regressor '{}' (column {}): {} of {} records active, {} held out",
            self.name, self.column, positives.len(), records.len(), test.len(),
        );
        let model = fit_linear(&self.name, &x, &y, Objective::SquaredError, &self.options)?;

        self.evaluation = if test.is_empty() {
            None
        } else {
            let truth: Vec<Vec<f64>> = test
                .iter()
                .map(|r| vec![r.outcomes_vector.get(self.column).copied().unwrap_or(0.0)])
                .collect();
            let pred: Vec<Vec<f64>> = model
                .predict_rows(&FeatureMatrix::facts(&test)?)?
                .iter()
                .map(|row| vec![row[0] as f64])
                .collect();
            let report = regression_report(&truth, &pred)?;
            tracing::info!(
                "Regressor '{}' held-out r2 {:.4}, explained variance {:.4}",
                self.name, report.r2, report.explained_variance,
            );
            Some(report)
        };
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, facts: &[f64]) -> Result<f64, ModelError> {
        let out = self.trained()?.predict_one(facts)?;
        out.first()
            .map(|&v| v as f64)
            .ok_or_else(|| ModelError::Backend("empty prediction".to_string()))
    }

    fn weights(&self) -> Option<Vec<f32>> {
        let Some(model) = self.model.as_ref() else {
            tracing::warn!("Regressor '{}' has no weights: not trained", self.name);
            return None;
        };
        model.weights(&self.name)
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    fn evaluation(&self) -> Option<&RegressionReport> {
        self.evaluation.as_ref()
    }
}

impl Persistable for LinearRegressor {
    fn save(&self, dir: &Path) -> Result<(), ModelError> {
        let model = self.trained()?;
        let store = ModelStore::new(dir);
        let stem  = self.stem();
        model.save(&store, &stem)?;
        store.save_json(&stem, &RegressorMeta {
            name:   self.name.clone(),
            column: self.column,
            fit:    model.meta(),
        })?;
        tracing::debug!("Regressor '{}' saved to '{}'", self.name, store.weights_path(&stem).display());
        Ok(())
    }

    fn load(&mut self, dir: &Path) -> Result<(), ModelError> {
        let store = ModelStore::new(dir);
        let stem  = self.stem();
        let weights = store.weights_path(&stem);
        if !weights.is_file() {
            return Err(ModelError::NotFound(weights));
        }

        let meta: RegressorMeta = store.load_json(&stem)?;
        if meta.column != self.column {
            tracing::warn!(
                "Regressor '{}' was saved for column {}, now bound to column {}",
                self.name, meta.column, self.column,
            );
        }
        self.model      = Some(LinearFit::restore(&store, &stem, meta.fit)?);
        self.evaluation = None;
        tracing::debug!("Regressor '{}' loaded", self.name);
        Ok(())
    }
}
