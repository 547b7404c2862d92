// ============================================================
// Layer 5 — Multi-Label Classifier
// ============================================================
// Stage one of prediction: facts_vector → activation vector.
//
// One logistic output per outcome column (one-vs-rest):
//
//   target[i] = 1  if outcomes_vector[i] != 0
//   active[i] = sigmoid(x · W[:, i] + b[i]) > 0.5
//
// Training holds back a seeded fraction of the records and keeps
// a ClassificationReport on it. The report is informational only.
//
// Persisted as:
//   classifier_model.bin   — LinearHead weights
//   classifier_model.json  — head shape, input scaling, column labels
//
// so `load_classifier_labels` can hand the label table to the
// regressors without rebuilding it from the pattern catalogue.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::data::dataset::FeatureMatrix;
use crate::domain::error::ModelError;
use crate::domain::labels::ColumnLabelTable;
use crate::domain::record::{FeatureVector, TaggedRecord};
use crate::domain::traits::{ActivationModel, Persistable};
use crate::infra::model_store::ModelStore;
use crate::ml::evaluation::{classification_report, ClassificationReport};
use crate::ml::trainer::{fit_linear, holdout, sigmoid, FitOptions, LinearFit, LinearFitMeta, Objective};

/// Blob stem of the classifier
pub const CLASSIFIER_STEM: &str = "classifier_model";

/// Sidecar written next to classifier_model.bin
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClassifierMeta {
    fit:    LinearFitMeta,
    labels: ColumnLabelTable,
}

/// Predicts which outcome dimensions apply to a facts vector.
pub struct MultiLabelClassifier {
    labels:  Arc<ColumnLabelTable>,
    options: FitOptions,
    model:   Option<LinearFit>,
    report:  Option<ClassificationReport>,
}

impl MultiLabelClassifier {
    /// Untrained classifier with one output per label
    pub fn new(labels: Arc<ColumnLabelTable>, options: FitOptions) -> Self {
        Self { labels, options, model: None, report: None }
    }

    /// Classifier restored from `dir`
    pub fn from_dir(dir: &Path) -> Result<Self, ModelError> {
        let mut classifier = Self::new(Arc::new(ColumnLabelTable::default()), FitOptions::default());
        classifier.load(dir)?;
        Ok(classifier)
    }

    /// Column label table stored with a persisted classifier
    pub fn load_classifier_labels(dir: &Path) -> Result<ColumnLabelTable, ModelError> {
        let meta: ClassifierMeta = ModelStore::new(dir).load_json(CLASSIFIER_STEM)?;
        Ok(meta.labels)
    }

    pub fn labels(&self) -> &Arc<ColumnLabelTable> {
        &self.labels
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Held-out report of the last `train` call
    pub fn report(&self) -> Option<&ClassificationReport> {
        self.report.as_ref()
    }

    fn targets(&self, records: &[TaggedRecord]) -> Vec<Vec<f64>> {
        records
            .iter()
            .map(|r| {
                (0..self.labels.len())
                    .map(|c| if r.outcome_active(c) { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect()
    }

    pub fn train(&mut self, records: &[TaggedRecord]) -> Result<(), ModelError> {
        if self.labels.is_empty() {
            return Err(ModelError::EmptyDataset("classifier outcome labels".to_string()));
        }
        if let Some(bad) = records.iter().find(|r| r.outcomes_vector.len() != self.labels.len()) {
            return Err(ModelError::DimensionMismatch {
                what:     format!("outcomes_vector of '{}'", bad.document_id),
                expected: self.labels.len(),
                found:    bad.outcomes_vector.len(),
            });
        }

        let (train, test) = holdout(records, &self.options);
        let x = FeatureMatrix::facts(&train)?;
        let y = FeatureMatrix::from_owned_rows("classifier targets", &self.targets(&train))?;

        tracing::info!(
            "Training classifier: {} records ({} held out), {} facts → {} labels",
            train.len(), test.len(), x.cols(), y.cols(),
        );
        let model = fit_linear("classifier", &x, &y, Objective::Logistic, &self.options)?;

        self.report = if test.is_empty() {
            None
        } else {
            let logits = model.predict_rows(&FeatureMatrix::facts(&test)?)?;
            let pred: Vec<Vec<f64>> = logits.iter().map(|row| threshold(row)).collect();
            let report = classification_report(&self.labels, &self.targets(&test), &pred)?;
            tracing::info!(
                "Classifier held-out accuracy {:.4} (subset {:.4}) on {} records",
                report.hamming_accuracy, report.subset_accuracy, report.test_size,
            );
            Some(report)
        };
        self.model = Some(model);
        Ok(())
    }

    /// 0/1 activation vector for one facts vector
    pub fn predict(&self, facts: &[f64]) -> Result<FeatureVector, ModelError> {
        let model = self.model.as_ref().ok_or_else(|| {
            tracing::warn!("Classifier used before training or loading");
            ModelError::NotInitialized("classifier".to_string())
        })?;
        Ok(threshold(&model.predict_one(facts)?))
    }

    /// Weights of outcome column 0 over the facts
    pub fn weights(&self) -> Option<Vec<f32>> {
        let Some(model) = self.model.as_ref() else {
            tracing::warn!("Classifier has no weights: not trained");
            return None;
        };
        model.weights("classifier")
    }
}

fn threshold(logits: &[f32]) -> FeatureVector {
    logits.iter().map(|&z| if sigmoid(z) > 0.5 { 1.0 } else { 0.0 }).collect()
}

impl ActivationModel for MultiLabelClassifier {
    fn activation(&self, facts: &[f64]) -> Result<FeatureVector, ModelError> {
        self.predict(facts)
    }
}

impl Persistable for MultiLabelClassifier {
    fn save(&self, dir: &Path) -> Result<(), ModelError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ModelError::NotInitialized("classifier".to_string()))?;
        let store = ModelStore::new(dir);
        model.save(&store, CLASSIFIER_STEM)?;
        store.save_json(CLASSIFIER_STEM, &ClassifierMeta {
            fit:    model.meta(),
            labels: self.labels.as_ref().clone(),
        })?;
        tracing::info!("Classifier saved to '{}'", store.weights_path(CLASSIFIER_STEM).display());
        Ok(())
    }

    fn load(&mut self, dir: &Path) -> Result<(), ModelError> {
        let store  = ModelStore::new(dir);
        let meta: ClassifierMeta = store.load_json(CLASSIFIER_STEM)?;
        let model  = LinearFit::restore(&store, CLASSIFIER_STEM, meta.fit)?;

        self.model  = Some(model);
        self.labels = Arc::new(meta.labels);
        self.report = None;
        tracing::info!("Classifier loaded ({} labels)", self.labels.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Arc<ColumnLabelTable> {
        Arc::new(ColumnLabelTable::from_names(["orders_resiliation", "additional_indemnity_money"]))
    }

    fn records() -> Vec<TaggedRecord> {
        (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    TaggedRecord::new(format!("{i}.txt"), vec![1.0, 0.0], vec![], vec![1.0, 0.0])
                } else {
                    TaggedRecord::new(format!("{i}.txt"), vec![0.0, 1.0], vec![], vec![0.0, 1500.0])
                }
            })
            .collect()
    }

    fn options() -> FitOptions {
        FitOptions { epochs: 200, learning_rate: 0.1, ..FitOptions::default() }
    }

    fn trained() -> MultiLabelClassifier {
        let mut c = MultiLabelClassifier::new(labels(), options());
        c.train(&records()).unwrap();
        c
    }

    #[test]
    fn test_classifier_learns_activations() {
        let c = trained();
        assert_eq!(c.predict(&[1.0, 0.0]).unwrap(), vec![1.0, 0.0]);
        assert_eq!(c.predict(&[0.0, 1.0]).unwrap(), vec![0.0, 1.0]);
        assert_eq!(c.report().unwrap().test_size, 2);
    }

    #[test]
    fn test_predict_before_training_fails() {
        let c = MultiLabelClassifier::new(labels(), options());
        assert!(matches!(c.predict(&[1.0, 0.0]), Err(ModelError::NotInitialized(_))));
        assert!(c.weights().is_none());
    }

    #[test]
    fn test_save_load_reproduces_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let c   = trained();
        c.save(dir.path()).unwrap();
        assert!(dir.path().join("classifier_model.bin").is_file());

        let back = MultiLabelClassifier::from_dir(dir.path()).unwrap();
        for facts in [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]] {
            assert_eq!(back.predict(&facts).unwrap(), c.predict(&facts).unwrap());
        }
        assert_eq!(back.weights(), c.weights());
    }

    #[test]
    fn test_labels_are_stored_with_the_model() {
        let dir = tempfile::tempdir().unwrap();
        trained().save(dir.path()).unwrap();
        let table = MultiLabelClassifier::load_classifier_labels(dir.path()).unwrap();
        assert_eq!(table, *labels());
    }

    #[test]
    fn test_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(MultiLabelClassifier::from_dir(dir.path()), Err(ModelError::NotFound(_))));
    }

    #[test]
    fn test_outcome_width_must_match_labels() {
        let mut c   = MultiLabelClassifier::new(labels(), options());
        let records = vec![TaggedRecord::new("1.txt", vec![1.0], vec![], vec![1.0])];
        assert!(matches!(c.train(&records), Err(ModelError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_weights_cover_every_fact() {
        assert_eq!(trained().weights().unwrap().len(), 2);
    }
}
