// ============================================================
// Layer 2 — TagUseCase
// ============================================================
//   Step 1: Compile the pattern catalogue   (Layer 4 - data)
//   Step 2: Tag the corpus directory        (Layer 4 - data)
//   Step 3: Persist structured_data_dict    (Layer 6 - infra)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::load_catalogue;
use crate::data::tagger::{RegexTagger, TaggedCorpus};
use crate::domain::labels::IntentIndex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagConfig {
    pub corpus_dir: String,
    pub binary_dir: String,
    /// Optional JSON pattern catalogue; built-in when absent
    pub patterns:   Option<String>,
    /// Maximum number of files to process
    pub limit:      Option<usize>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            corpus_dir: "data/precedents".to_string(),
            binary_dir: "binary".to_string(),
            patterns:   None,
            limit:      None,
        }
    }
}

/// What a tagging run produced
pub struct TagOutcome {
    pub corpus:       TaggedCorpus,
    pub intent_index: IntentIndex,
}

pub struct TagUseCase {
    config: TagConfig,
}

impl TagUseCase {
    pub fn new(config: TagConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TagOutcome> {
        let cfg       = &self.config;
        let catalogue = load_catalogue(cfg.patterns.as_deref())?;
        let tagger    = RegexTagger::new(catalogue, &cfg.corpus_dir, &cfg.binary_dir);

        tracing::info!("Tagging judgments in '{}'", cfg.corpus_dir);
        let corpus = tagger
            .tag(cfg.limit)
            .with_context(|| format!("Tagging corpus '{}'", cfg.corpus_dir))?;

        Ok(TagOutcome { corpus, intent_index: tagger.get_intent_index() })
    }
}
