// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Compile the pattern catalogue       (Layer 4 - data)
//   Step 2: Reuse or rebuild the tagged corpus  (Layer 4 / 6)
//   Step 3: Derive the column label table       (Layer 3 - domain)
//   Step 4: Train + save the classifier         (Layer 5 - ml)
//   Step 5: Train + save the magnitude strategy (Layer 5 - ml)
//   Step 6: Save pipeline_config.json           (Layer 6 - infra)
//   Step 7: Append held-out metrics to CSV      (Layer 6 - infra)
//
// The saved config is what PredictUseCase reads back to rebuild
// the same catalogue and strategy.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{build_strategy, load_catalogue};
use crate::data::patterns::PatternCatalogue;
use crate::data::tagger::{CorpusProvenance, RegexTagger};
use crate::domain::error::ModelError;
use crate::domain::labels::ColumnLabelTable;
use crate::domain::record::{Category, TaggedRecord};
use crate::domain::traits::Persistable;
use crate::infra::metrics::{MetricRow, MetricsLogger};
use crate::infra::model_store::{ModelStore, CORPUS_STEM};
use crate::ml::classifier::MultiLabelClassifier;
use crate::ml::ensemble::DEFAULT_LEGAL_FEES;
use crate::ml::evaluation::{ClassificationReport, RegressionReport};
use crate::ml::trainer::FitOptions;
use crate::ml::RegressionStrategy;

/// Stem of the saved training configuration
pub const PIPELINE_CONFIG_STEM: &str = "pipeline_config";

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run depends on. Saved next to the models
// so prediction rebuilds exactly what was trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_dir:    String,
    pub binary_dir:    String,
    pub patterns:      Option<String>,
    pub limit:         Option<usize>,
    /// Tag the corpus again even if structured_data_dict.bin exists
    pub retag:         bool,
    pub epochs:        usize,
    pub learning_rate: f64,
    pub test_fraction: f64,
    pub seed:          u64,
    pub strategy:      RegressionStrategy,
    pub legal_fees:    f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let fit = FitOptions::default();
        Self {
            corpus_dir:    "data/precedents".to_string(),
            binary_dir:    "binary".to_string(),
            patterns:      None,
            limit:         None,
            retag:         false,
            epochs:        fit.epochs,
            learning_rate: fit.learning_rate,
            test_fraction: fit.test_fraction,
            seed:          fit.seed,
            strategy:      RegressionStrategy::default(),
            legal_fees:    DEFAULT_LEGAL_FEES,
        }
    }
}

impl TrainConfig {
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            epochs:        self.epochs,
            learning_rate: self.learning_rate,
            test_fraction: self.test_fraction,
            seed:          self.seed,
        }
    }
}

/// Held-out quality of one training run
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub documents:   usize,
    pub classifier:  Option<ClassificationReport>,
    pub regressions: Vec<(String, RegressionReport)>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg   = &self.config;
        let store = ModelStore::new(&cfg.binary_dir);

        // ── Step 1 + 2: Tagged corpus ────────────────────────────────────────
        let catalogue = load_catalogue(cfg.patterns.as_deref())?;
        let tagger    = RegexTagger::new(catalogue, &cfg.corpus_dir, &cfg.binary_dir);
        let records   = self.tagged_records(&tagger, &store)?;
        if records.is_empty() {
            anyhow::bail!("No tagged judgments to train on in '{}'", cfg.corpus_dir);
        }

        // ── Step 3: Column label table ───────────────────────────────────────
        let labels = Arc::new(ColumnLabelTable::from_intent_index(&tagger.get_intent_index()));
        tracing::info!("{} outcome columns, {} judgments", labels.len(), records.len());

        // ── Step 4: Classifier ───────────────────────────────────────────────
        let options = cfg.fit_options();
        let mut classifier = MultiLabelClassifier::new(labels.clone(), options.clone());
        classifier.train(&records).context("Training classifier")?;
        classifier.save(store.dir()).context("Saving classifier")?;

        // ── Step 5: Magnitude strategy ───────────────────────────────────────
        let mut strategy = build_strategy(cfg.strategy, labels, &options, cfg.legal_fees);
        strategy.train(&records).context("Training regressors")?;
        strategy.save(store.dir()).context("Saving regressors")?;

        // ── Step 6: Config for prediction ────────────────────────────────────
        store.save_json(PIPELINE_CONFIG_STEM, cfg).context("Saving pipeline config")?;

        // ── Step 7: Metrics ──────────────────────────────────────────────────
        let summary = TrainSummary {
            documents:   records.len(),
            classifier:  classifier.report().cloned(),
            regressions: strategy.evaluations(),
        };
        self.log_metrics(&summary)?;

        tracing::info!("Training complete, models in '{}'", cfg.binary_dir);
        Ok(summary)
    }

    /// Records from structured_data_dict.bin when it was tagged from
    /// this corpus, limit and catalogue, otherwise a fresh tagging run.
    fn tagged_records(&self, tagger: &RegexTagger, store: &ModelStore) -> Result<Vec<TaggedRecord>> {
        if !self.config.retag {
            if let Some(cached) = self.cached_records(tagger, store) {
                tracing::info!("Reusing {} tagged judgments from '{}'", cached.len(), store.dir().display());
                return Ok(cached);
            }
        }

        let tagged = tagger
            .tag(self.config.limit)
            .with_context(|| format!("Tagging corpus '{}'", self.config.corpus_dir))?;
        Ok(tagged.records.into_values().collect())
    }

    fn cached_records(&self, tagger: &RegexTagger, store: &ModelStore) -> Option<Vec<TaggedRecord>> {
        let saved = match store.load_json::<CorpusProvenance>(CORPUS_STEM) {
            Ok(saved) => saved,
            Err(ModelError::NotFound(_)) => return None,
            Err(e) => {
                tracing::warn!("Ignoring tagged corpus with unreadable provenance: {e}");
                return None;
            }
        };
        let current = match tagger.provenance(self.config.limit) {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!("Cannot list corpus '{}': {e}", self.config.corpus_dir);
                return None;
            }
        };
        if saved != current {
            tracing::info!("Corpus, limit or pattern catalogue changed since the last tagging run, re-tagging");
            return None;
        }

        match store.load_corpus() {
            Ok(cached) if fits_catalogue(&cached, tagger.catalogue()) => Some(cached.into_values().collect()),
            Ok(_) => {
                tracing::warn!("Tagged corpus does not match its provenance, re-tagging");
                None
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable tagged corpus: {e}");
                None
            }
        }
    }

    fn log_metrics(&self, summary: &TrainSummary) -> Result<()> {
        let mut rows = Vec::new();
        if let Some(report) = &summary.classifier {
            rows.extend(MetricRow::from_classification("classifier", report));
        }
        for (name, report) in &summary.regressions {
            rows.extend(MetricRow::from_regression(name, report));
        }
        if rows.is_empty() {
            return Ok(());
        }
        let logger = MetricsLogger::new(&self.config.binary_dir)?;
        logger.log(&rows).context("Writing metrics CSV")
    }
}

fn fits_catalogue<'a, I>(records: I, catalogue: &PatternCatalogue) -> bool
where
    I: IntoIterator<Item = (&'a String, &'a TaggedRecord)>,
{
    let mut records = records.into_iter().peekable();
    records.peek().is_some()
        && records.all(|(_, r)| {
            Category::ALL
                .iter()
                .all(|&c| r.vector(c).len() == catalogue.width(c))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ORDERED: &str = "Le locataire n'a pas payé son loyer depuis plus de trois semaines. \
        Le locateur demande la résiliation du bail. Le Tribunal résilie le bail et \
        condamne le locataire à payer au locateur la somme de 2 400,00 $.";
    const REJECTED: &str = "Le locateur réclame des dommages. Le Tribunal rejette la demande.";

    fn corpus() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            let text = if i % 2 == 0 { ORDERED } else { REJECTED };
            fs::write(dir.path().join(format!("{i:02}.txt")), text).unwrap();
        }
        dir
    }

    fn config(corpus: &tempfile::TempDir, binary: &tempfile::TempDir) -> TrainConfig {
        TrainConfig {
            corpus_dir:    corpus.path().display().to_string(),
            binary_dir:    binary.path().display().to_string(),
            epochs:        200,
            learning_rate: 0.1,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_training_writes_every_artifact() {
        let corpus = corpus();
        let binary = tempfile::tempdir().unwrap();
        let summary = TrainUseCase::new(config(&corpus, &binary)).execute().unwrap();

        assert_eq!(summary.documents, 10);
        assert_eq!(summary.classifier.unwrap().test_size, 2);
        for file in [
            "structured_data_dict.bin",
            "classifier_model.bin",
            "classifier_model.json",
            "tenant_ordered_to_pay_landlord_model.bin",
            "pipeline_config.json",
            "metrics.csv",
        ] {
            assert!(binary.path().join(file).is_file(), "missing {file}");
        }
        // never active in this corpus
        assert!(!binary.path().join("additional_indemnity_money_model.bin").exists());
    }

    #[test]
    fn test_unchanged_corpus_is_reused() {
        let corpus = corpus();
        let binary = tempfile::tempdir().unwrap();
        TrainUseCase::new(config(&corpus, &binary)).execute().unwrap();

        // a blob that reuse would read back, unlike a fresh tagging run
        let mut cached = ModelStore::new(binary.path()).load_corpus().unwrap();
        cached.remove("00.txt");
        ModelStore::new(binary.path()).save_corpus(&cached).unwrap();

        let summary = TrainUseCase::new(config(&corpus, &binary)).execute().unwrap();
        assert_eq!(summary.documents, 9);
    }

    #[test]
    fn test_full_run_after_limited_run_retags() {
        let corpus = corpus();
        let binary = tempfile::tempdir().unwrap();
        let limited = TrainConfig { limit: Some(2), ..config(&corpus, &binary) };
        assert_eq!(TrainUseCase::new(limited).execute().unwrap().documents, 2);

        let summary = TrainUseCase::new(config(&corpus, &binary)).execute().unwrap();
        assert_eq!(summary.documents, 10);
    }

    #[test]
    fn test_other_corpus_dir_retags() {
        let first  = corpus();
        let binary = tempfile::tempdir().unwrap();
        TrainUseCase::new(config(&first, &binary)).execute().unwrap();

        let second = tempfile::tempdir().unwrap();
        for i in 0..3 {
            let text = if i % 2 == 0 { ORDERED } else { REJECTED };
            fs::write(second.path().join(format!("b{i}.txt")), text).unwrap();
        }
        let summary = TrainUseCase::new(config(&second, &binary)).execute().unwrap();
        assert_eq!(summary.documents, 3);

        let cached = ModelStore::new(binary.path()).load_corpus().unwrap();
        assert!(cached.keys().all(|id| id.starts_with('b')));
    }

    #[test]
    fn test_edited_corpus_file_retags() {
        let corpus = corpus();
        let binary = tempfile::tempdir().unwrap();
        TrainUseCase::new(config(&corpus, &binary)).execute().unwrap();

        fs::write(corpus.path().join("01.txt"), ORDERED).unwrap();
        TrainUseCase::new(config(&corpus, &binary)).execute().unwrap();
        let cached = ModelStore::new(binary.path()).load_corpus().unwrap();
        assert_eq!(cached["01.txt"].outcomes_vector, cached["00.txt"].outcomes_vector);
    }

    #[test]
    fn test_same_width_catalogue_change_retags() {
        let corpus   = corpus();
        let binary   = tempfile::tempdir().unwrap();
        let patterns = binary.path().join("patterns.json");
        let write = |pattern: &str| {
            let spec = format!(
                r#"{{"regex_facts":   [{{"label": "rent_unpaid", "patterns": ["loyer"], "kind": "BOOLEAN"}}],
                    "regex_outcomes": [{{"label": "decision", "patterns": ["{pattern}"], "kind": "BOOLEAN"}}]}}"#
            );
            fs::write(&patterns, spec).unwrap();
        };
        let cfg = TrainConfig {
            patterns: Some(patterns.display().to_string()),
            ..config(&corpus, &binary)
        };

        write("rejette");
        TrainUseCase::new(cfg.clone()).execute().unwrap();
        let cached = ModelStore::new(binary.path()).load_corpus().unwrap();
        assert_eq!(cached["01.txt"].outcomes_vector, vec![1.0]);

        // same labels and widths, different pattern
        write("résilie");
        TrainUseCase::new(cfg).execute().unwrap();
        let cached = ModelStore::new(binary.path()).load_corpus().unwrap();
        assert_eq!(cached["01.txt"].outcomes_vector, vec![0.0]);
        assert_eq!(cached["00.txt"].outcomes_vector, vec![1.0]);
    }

    #[test]
    fn test_saved_config_round_trips() {
        let corpus = corpus();
        let binary = tempfile::tempdir().unwrap();
        let cfg    = TrainConfig { strategy: RegressionStrategy::MultiOutput, ..config(&corpus, &binary) };
        TrainUseCase::new(cfg.clone()).execute().unwrap();

        let saved: TrainConfig = ModelStore::new(binary.path()).load_json(PIPELINE_CONFIG_STEM).unwrap();
        assert_eq!(saved, cfg);
        assert!(binary.path().join("multi_output_model.bin").is_file());
    }

    #[test]
    fn test_empty_corpus_fails() {
        let corpus = tempfile::tempdir().unwrap();
        let binary = tempfile::tempdir().unwrap();
        assert!(TrainUseCase::new(config(&corpus, &binary)).execute().is_err());
    }
}
