// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads plain-text judgments from a directory.
//
// Files are visited in file-name order so a capped run
// (`limit = Some(n)`) always picks the same n files. The cap
// counts files attempted, including ones that end up skipped.
//
// A file that cannot be read, or is not valid UTF-8, is logged
// and reported in `LoadedCorpus::skipped` — one bad judgment
// never aborts a tagging run.

use std::{fs, path::{Path, PathBuf}};

use crate::domain::document::{CorpusFile, Document, LoadedCorpus, SkippedDocument};
use crate::domain::error::TaggerError;
use crate::domain::traits::DocumentSource;

/// Loads every regular file of a directory as a judgment.
pub struct TextCorpusLoader {
    dir: PathBuf,
}

impl TextCorpusLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory this loader reads from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Regular files of the corpus directory, sorted by name
    fn corpus_files(&self) -> Result<Vec<PathBuf>, TaggerError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| TaggerError::CorpusUnreadable {
            path: self.dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| TaggerError::CorpusUnreadable {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl DocumentSource for TextCorpusLoader {
    fn load(&self, limit: Option<usize>) -> Result<LoadedCorpus, TaggerError> {
        let files = self.corpus_files()?;
        let cap   = limit.unwrap_or(files.len());

        let mut corpus = LoadedCorpus::default();

        for path in files.into_iter().take(cap) {
            let id = file_id(&path);
            match read_text(&path) {
                Ok(text) => {
                    tracing::debug!("Loaded: {} ({} chars)", id, text.len());
                    corpus.documents.push(Document::new(id, text));
                }
                Err(reason) => {
                    tracing::warn!("Skipping '{}': {}", path.display(), reason);
                    corpus.skipped.push(SkippedDocument { id, reason });
                }
            }
        }

        tracing::info!(
            "Loaded {} documents from '{}' ({} skipped)",
            corpus.documents.len(),
            self.dir.display(),
            corpus.skipped.len()
        );
        Ok(corpus)
    }

    fn listing(&self, limit: Option<usize>) -> Result<Vec<CorpusFile>, TaggerError> {
        let files = self.corpus_files()?;
        let cap   = limit.unwrap_or(files.len());

        Ok(files
            .into_iter()
            .take(cap)
            .map(|path| {
                let meta = fs::metadata(&path).ok();
                CorpusFile {
                    id:       file_id(&path),
                    len:      meta.as_ref().map_or(0, |m| m.len()),
                    modified: meta.and_then(|m| m.modified().ok()),
                }
            })
            .collect())
    }
}

/// The file name is the case identifier, e.g. `AZ-51234567.txt`
fn file_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_text(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| format!("cannot read file: {e}"))?;
    String::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2.txt"), "deuxième").unwrap();
        fs::write(dir.path().join("1.txt"), "premier").unwrap();
        fs::write(dir.path().join("3.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        dir
    }

    #[test]
    fn test_loads_in_file_name_order() {
        let dir    = corpus();
        let loaded = TextCorpusLoader::new(dir.path()).load(None).unwrap();
        let ids: Vec<_> = loaded.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1.txt", "2.txt"]);
    }

    #[test]
    fn test_undecodable_file_is_skipped_not_fatal() {
        let dir    = corpus();
        let loaded = TextCorpusLoader::new(dir.path()).load(None).unwrap();
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].id, "3.txt");
    }

    #[test]
    fn test_limit_caps_attempted_files() {
        let dir    = corpus();
        let loaded = TextCorpusLoader::new(dir.path()).load(Some(1)).unwrap();
        assert_eq!(loaded.documents.len(), 1);
        assert_eq!(loaded.documents[0].id, "1.txt");
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn test_listing_follows_load_order_and_size() {
        let dir    = corpus();
        let loader = TextCorpusLoader::new(dir.path());
        let listed = loader.listing(Some(2)).unwrap();
        let ids: Vec<_> = listed.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["1.txt", "2.txt"]);
        assert_eq!(listed[0].len, "premier".len() as u64);

        fs::write(dir.path().join("1.txt"), "premier jugement").unwrap();
        assert_ne!(loader.listing(Some(2)).unwrap(), listed);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir     = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err     = TextCorpusLoader::new(&missing).load(None).unwrap_err();
        assert!(matches!(err, TaggerError::CorpusUnreadable { .. }));
    }
}
