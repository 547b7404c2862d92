// ============================================================
// Layer 4 — Regex Tagger
// ============================================================
// Turns judgments into fixed-position feature vectors.
//
// For every document and every category, each PatternEntry is
// evaluated in declared order:
//
//   BOOLEAN → 1 if any matcher hits, else 0
//   NUMERIC → first captured number, else 0
//
// so slot i of "facts_vector" always means the i-th facts entry.
// `get_intent_index` exposes that position → label mapping from
// the same compiled catalogue, which keeps the two in lockstep.
//
// A full run persists its records to structured_data_dict.bin,
// and what they were tagged from to structured_data_dict.json:
// the corpus directory, the limit, the file listing and the
// catalogue. Training reuses the blob only when all of these
// still match.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::loader::TextCorpusLoader;
use crate::data::patterns::{CatalogueSpec, PatternCatalogue};
use crate::data::preprocessor::Preprocessor;
use crate::domain::document::{CorpusFile, Document, SkippedDocument};
use crate::domain::error::TaggerError;
use crate::domain::labels::IntentIndex;
use crate::domain::record::{Category, FeatureVector, TaggedRecord};
use crate::domain::traits::DocumentSource;
use crate::infra::model_store::{ModelStore, CORPUS_STEM};

/// Result of one tagging run
#[derive(Debug, Clone, Default)]
pub struct TaggedCorpus {
    /// document id → record, ordered by id
    pub records: BTreeMap<String, TaggedRecord>,

    /// Files that could not be read or decoded
    pub skipped: Vec<SkippedDocument>,

    /// Where the records were persisted
    pub blob_path: Option<PathBuf>,
}

/// Inputs a tagged corpus was produced from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusProvenance {
    pub corpus_dir:   PathBuf,
    pub limit:        Option<usize>,
    pub files:        Vec<CorpusFile>,
    pub intent_index: IntentIndex,
    pub catalogue:    CatalogueSpec,
}

/// Scans a corpus directory with a compiled pattern catalogue.
pub struct RegexTagger {
    catalogue:    PatternCatalogue,
    preprocessor: Preprocessor,
    corpus_dir:   PathBuf,
    store:        ModelStore,
}

impl RegexTagger {
    pub fn new(
        catalogue:  PatternCatalogue,
        corpus_dir: impl Into<PathBuf>,
        binary_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalogue,
            preprocessor: Preprocessor::new(),
            corpus_dir:   corpus_dir.into(),
            store:        ModelStore::new(binary_dir),
        }
    }

    pub fn catalogue(&self) -> &PatternCatalogue {
        &self.catalogue
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    /// Tag at most `limit` documents of the corpus directory and
    /// persist the result as structured_data_dict.bin.
    pub fn tag(&self, limit: Option<usize>) -> Result<TaggedCorpus, TaggerError> {
        let loader = TextCorpusLoader::new(&self.corpus_dir);
        self.tag_from(&loader, limit)
    }

    /// Same as `tag`, reading from any DocumentSource
    pub fn tag_from<S: DocumentSource>(
        &self,
        source: &S,
        limit:  Option<usize>,
    ) -> Result<TaggedCorpus, TaggerError> {
        let provenance = self.provenance_from(source, limit)?;
        let loaded     = source.load(limit)?;
        let records    = self.tag_documents(&loaded.documents);

        let blob_path = self.store.save_corpus(&records)?;
        self.store.save_json(CORPUS_STEM, &provenance)?;
        tracing::info!(
            "Tagged {} documents ({} skipped) → '{}'",
            records.len(),
            loaded.skipped.len(),
            blob_path.display()
        );

        Ok(TaggedCorpus {
            records,
            skipped:   loaded.skipped,
            blob_path: Some(blob_path),
        })
    }

    /// What a `tag(limit)` run over the corpus directory would be
    /// tagged from right now
    pub fn provenance(&self, limit: Option<usize>) -> Result<CorpusProvenance, TaggerError> {
        self.provenance_from(&TextCorpusLoader::new(&self.corpus_dir), limit)
    }

    fn provenance_from<S: DocumentSource>(
        &self,
        source: &S,
        limit:  Option<usize>,
    ) -> Result<CorpusProvenance, TaggerError> {
        Ok(CorpusProvenance {
            corpus_dir:   fs::canonicalize(&self.corpus_dir).unwrap_or_else(|_| self.corpus_dir.clone()),
            limit,
            files:        source.listing(limit)?,
            intent_index: self.get_intent_index(),
            catalogue:    self.catalogue.to_spec(),
        })
    }

    /// Tag in-memory documents without touching the disk
    pub fn tag_documents(&self, documents: &[Document]) -> BTreeMap<String, TaggedRecord> {
        documents
            .iter()
            .map(|doc| (doc.id.clone(), self.tag_text(&doc.id, &doc.text)))
            .collect()
    }

    /// Tag one judgment text
    pub fn tag_text(&self, id: &str, text: &str) -> TaggedRecord {
        let clean = self.preprocessor.clean(text);
        TaggedRecord::new(
            id,
            self.vectorize(Category::Facts, &clean),
            self.vectorize(Category::Demands, &clean),
            self.vectorize(Category::Outcomes, &clean),
        )
    }

    fn vectorize(&self, category: Category, text: &str) -> FeatureVector {
        self.catalogue
            .entries(category)
            .iter()
            .map(|entry| entry.evaluate(text))
            .collect()
    }

    /// Position → label for every vector this tagger produces
    pub fn get_intent_index(&self) -> IntentIndex {
        self.catalogue.intent_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::patterns::{PatternEntry, ValueKind};
    use crate::infra::model_store::CORPUS_BLOB;
    use regex::RegexBuilder;
    use std::fs;

    fn entry(label: &str, pattern: &str, case_insensitive: bool) -> PatternEntry {
        PatternEntry::new(
            label,
            vec![RegexBuilder::new(pattern).case_insensitive(case_insensitive).build().unwrap()],
            ValueKind::Boolean,
        )
    }

    fn catalogue() -> PatternCatalogue {
        PatternCatalogue::new(
            vec![entry("some_fact", "fermentum", true)],
            vec![entry("some_demand", "réclame", true)],
            vec![entry("some_outcome", "REJETTE", false)],
        )
    }

    struct Fixture {
        corpus: tempfile::TempDir,
        binary: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let corpus = tempfile::tempdir().unwrap();
        fs::write(
            corpus.path().join("1.txt"),
            "Lorem ipsum dolor sit amet, Fermentum consectetur. Le locateur réclame le loyer.",
        ).unwrap();
        fs::write(corpus.path().join("2.txt"), "Nulla facilisi. Le tribunal REJETTE la demande.").unwrap();
        Fixture { corpus, binary: tempfile::tempdir().unwrap() }
    }

    fn tagger(f: &Fixture) -> RegexTagger {
        RegexTagger::new(catalogue(), f.corpus.path(), f.binary.path())
    }

    #[test]
    fn test_tag_precedents() {
        let f       = fixture();
        let tagged  = tagger(&f).tag(Some(2)).unwrap();
        let records = &tagged.records;
        assert_eq!(records["1.txt"].facts_vector, vec![1.0]);
        assert_eq!(records["1.txt"].demands_vector, vec![1.0]);
        assert_eq!(records["2.txt"].facts_vector, vec![0.0]);
        assert_eq!(records["2.txt"].demands_vector, vec![0.0]);
        assert_eq!(records["2.txt"].outcomes_vector, vec![1.0]);
    }

    #[test]
    fn test_tag_persists_binary_blob() {
        let f = fixture();
        tagger(&f).tag(Some(10)).unwrap();
        assert!(f.binary.path().join(CORPUS_BLOB).is_file());

        let reloaded = ModelStore::new(f.binary.path()).load_corpus().unwrap();
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_tag_records_its_provenance() {
        let f = fixture();
        let t = tagger(&f);
        t.tag(Some(1)).unwrap();

        let saved: CorpusProvenance = ModelStore::new(f.binary.path()).load_json(CORPUS_STEM).unwrap();
        assert_eq!(saved, t.provenance(Some(1)).unwrap());
        assert_eq!(saved.files.len(), 1);
        assert_ne!(saved, t.provenance(None).unwrap());
    }

    #[test]
    fn test_tagging_is_deterministic() {
        let f = fixture();
        let t = tagger(&f);
        assert_eq!(t.tag(None).unwrap().records, t.tag(None).unwrap().records);
    }

    #[test]
    fn test_limit_restricts_documents() {
        let f      = fixture();
        let tagged = tagger(&f).tag(Some(1)).unwrap();
        assert_eq!(tagged.records.len(), 1);
        assert!(tagged.records.contains_key("1.txt"));
    }

    #[test]
    fn test_bad_file_is_skipped_and_run_continues() {
        let f = fixture();
        fs::write(f.corpus.path().join("0.txt"), [0xc3, 0x28, 0xff]).unwrap();
        let tagged = tagger(&f).tag(None).unwrap();
        assert_eq!(tagged.records.len(), 2);
        assert_eq!(tagged.skipped.len(), 1);
        assert_eq!(tagged.skipped[0].id, "0.txt");
    }

    #[test]
    fn test_intent_indice() {
        let f     = fixture();
        let index = tagger(&f).get_intent_index();
        assert_eq!(index["facts_vector"][0], (0, "some_fact".to_string()));
        assert_eq!(index["demands_vector"][0], (0, "some_demand".to_string()));
        assert_eq!(index["outcomes_vector"][0], (0, "some_outcome".to_string()));
    }

    #[test]
    fn test_tag_text_normalises_spacing() {
        let f      = fixture();
        let record = tagger(&f).tag_text("x", "fermentum\u{00A0}\u{00A0}ipsum");
        assert_eq!(record.facts_vector, vec![1.0]);
        assert_eq!(record.document_id, "x");
    }
}
