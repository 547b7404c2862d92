// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads everything a training run left in the binary directory
// and resolves outcomes:
//
//   pipeline_config.json → catalogue + strategy kind + legal fees
//   classifier_model.*   → activation model + column labels
//   <strategy blobs>     → magnitudes for active columns
//
// A judgment text goes through the same tagger as training, so
// its facts_vector lines up with the models' inputs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::application::train_use_case::{TrainConfig, PIPELINE_CONFIG_STEM};
use crate::application::{build_strategy, load_catalogue};
use crate::data::tagger::RegexTagger;
use crate::domain::labels::ColumnLabelTable;
use crate::domain::record::FeatureVector;
use crate::domain::traits::Persistable;
use crate::infra::model_store::ModelStore;
use crate::ml::classifier::MultiLabelClassifier;
use crate::ml::ensemble::{RegressionEnsemble, RegressorRegistry};
use crate::ml::multi_output::{MultiOutputRegressor, MULTI_OUTPUT_STEM};
use crate::ml::resolver::OutcomeResolver;
use crate::ml::RegressionStrategy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictConfig {
    pub binary_dir: String,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self { binary_dir: "binary".to_string() }
    }
}

/// Resolved outcomes of one judgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub facts_vector: FeatureVector,
    /// (outcome label, value) in column order
    pub outcomes:     Vec<(String, f64)>,
}

impl Prediction {
    pub fn value(&self, label: &str) -> Option<f64> {
        self.outcomes.iter().find(|(l, _)| l == label).map(|(_, v)| *v)
    }
}

pub struct PredictUseCase {
    tagger:   RegexTagger,
    resolver: OutcomeResolver,
}

impl PredictUseCase {
    pub fn new(config: PredictConfig) -> Result<Self> {
        let dir      = Path::new(&config.binary_dir);
        let store    = ModelStore::new(dir);
        let pipeline: TrainConfig = store
            .load_json(PIPELINE_CONFIG_STEM)
            .context("Loading pipeline config (run `train` first)")?;

        let catalogue  = load_catalogue(pipeline.patterns.as_deref())?;
        let tagger     = RegexTagger::new(catalogue, &pipeline.corpus_dir, dir);
        let classifier = MultiLabelClassifier::from_dir(dir).context("Loading classifier")?;
        let labels     = classifier.labels().clone();

        let mut strategy = build_strategy(pipeline.strategy, labels.clone(), &pipeline.fit_options(), pipeline.legal_fees);
        strategy.load(dir).context("Loading regressors")?;

        tracing::info!("Loaded {:?} models from '{}'", pipeline.strategy, dir.display());
        Ok(Self {
            tagger,
            resolver: OutcomeResolver::new(Box::new(classifier), strategy, labels),
        })
    }

    pub fn labels(&self) -> &Arc<ColumnLabelTable> {
        self.resolver.labels()
    }

    /// Outcome vector for an already tagged facts vector
    pub fn predict_facts(&self, facts: &[f64]) -> Result<FeatureVector> {
        self.resolver.resolve(facts).context("Resolving outcomes")
    }

    /// Tag a judgment text, then resolve its outcomes
    pub fn predict_text(&self, id: &str, text: &str) -> Result<Prediction> {
        let record   = self.tagger.tag_text(id, text);
        let outcomes = self.predict_facts(&record.facts_vector)?;
        let labels   = self.labels();
        Ok(Prediction {
            outcomes: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, v)| (labels.name(i).unwrap_or_default().to_string(), v))
                .collect(),
            facts_vector: record.facts_vector,
        })
    }

    /// Read a judgment file and resolve its outcomes
    pub fn predict_file(&self, path: &Path) -> Result<Prediction> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Reading judgment '{}'", path.display()))?;
        let id   = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        self.predict_text(&id, &text)
    }
}

/// First coefficient vector of every persisted model, keyed by
/// model name. Untrained or missing models map to `None`.
pub fn model_weights(binary_dir: &str) -> Result<Vec<(String, Option<Vec<f32>>)>> {
    let dir      = Path::new(binary_dir);
    let pipeline: TrainConfig = ModelStore::new(dir)
        .load_json(PIPELINE_CONFIG_STEM)
        .context("Loading pipeline config (run `train` first)")?;
    let classifier = MultiLabelClassifier::from_dir(dir).context("Loading classifier")?;
    let labels     = classifier.labels().clone();
    let options    = pipeline.fit_options();

    let mut out = vec![("classifier".to_string(), classifier.weights())];
    match pipeline.strategy {
        RegressionStrategy::PerDimension => {
            let registry = RegressorRegistry::with_defaults(&options, pipeline.legal_fees);
            let mut ensemble = RegressionEnsemble::bind(&registry, labels);
            ensemble.load(dir).context("Loading regressors")?;
            out.extend(ensemble.regressors().map(|r| (r.name().to_string(), r.weights())));
        }
        RegressionStrategy::MultiOutput => {
            let mut multi = MultiOutputRegressor::new(labels, options);
            multi.load(dir).context("Loading multi-output regressor")?;
            out.push((MULTI_OUTPUT_STEM.to_string(), multi.weights()));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainUseCase;

    const ORDERED: &str = "Le locataire n'a pas payé son loyer depuis plus de trois semaines. \
        Le Tribunal résilie le bail et condamne le locataire à payer au locateur \
        la somme de 1 200,00 $.";
    const REJECTED: &str = "Le locateur réclame des dommages. Le Tribunal rejette la demande.";

    fn trained(strategy: RegressionStrategy) -> (tempfile::TempDir, tempfile::TempDir) {
        let corpus = tempfile::tempdir().unwrap();
        let binary = tempfile::tempdir().unwrap();
        for i in 0..10 {
            let text = if i % 2 == 0 { ORDERED } else { REJECTED };
            fs::write(corpus.path().join(format!("{i:02}.txt")), text).unwrap();
        }
        TrainUseCase::new(TrainConfig {
            corpus_dir:    corpus.path().display().to_string(),
            binary_dir:    binary.path().display().to_string(),
            epochs:        200,
            learning_rate: 0.1,
            strategy,
            ..TrainConfig::default()
        })
        .execute()
        .unwrap();
        (corpus, binary)
    }

    fn use_case(binary: &tempfile::TempDir) -> PredictUseCase {
        PredictUseCase::new(PredictConfig { binary_dir: binary.path().display().to_string() }).unwrap()
    }

    #[test]
    fn test_predicts_amount_for_active_dimension() {
        let (_corpus, binary) = trained(RegressionStrategy::PerDimension);
        let p = use_case(&binary).predict_text("new.txt", ORDERED).unwrap();

        assert_eq!(p.value("orders_resiliation"), Some(1.0));
        assert_eq!(p.value("application_rejected"), Some(0.0));
        let amount = p.value("tenant_ordered_to_pay_landlord").unwrap();
        assert!((amount - 1200.0).abs() < 1.0, "got {amount}");
    }

    #[test]
    fn test_gated_dimensions_stay_zero() {
        let (_corpus, binary) = trained(RegressionStrategy::PerDimension);
        let p = use_case(&binary).predict_text("new.txt", REJECTED).unwrap();

        assert_eq!(p.value("application_rejected"), Some(1.0));
        assert_eq!(p.value("tenant_ordered_to_pay_landlord"), Some(0.0));
        assert_eq!(p.outcomes.len(), 6);
    }

    #[test]
    fn test_multi_output_strategy() {
        let (_corpus, binary) = trained(RegressionStrategy::MultiOutput);
        let p = use_case(&binary).predict_text("new.txt", ORDERED).unwrap();
        assert_eq!(p.value("orders_resiliation"), Some(1.0));
        let amount = p.value("tenant_ordered_to_pay_landlord").unwrap();
        assert!((amount - 1200.0).abs() < 5.0, "got {amount}");
    }

    #[test]
    fn test_weights_listing() {
        let (_corpus, binary) = trained(RegressionStrategy::PerDimension);
        let weights = model_weights(&binary.path().display().to_string()).unwrap();

        assert_eq!(weights[0].0, "classifier");
        assert!(weights[0].1.is_some());
        let untrained = weights.iter().find(|(n, _)| n == "additional_indemnity_money").unwrap();
        assert!(untrained.1.is_none());
    }

    #[test]
    fn test_missing_models_fail_cleanly() {
        let binary = tempfile::tempdir().unwrap();
        let err    = PredictUseCase::new(PredictConfig { binary_dir: binary.path().display().to_string() });
        assert!(err.is_err());
    }
}
