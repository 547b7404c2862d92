// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// A single judgment loaded from the corpus directory: the file
// name (used as the case identifier) and its raw text.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A raw judgment document.
/// By the time a Document exists the bytes have been decoded
/// as UTF-8; undecodable files never become Documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// The file name, e.g. `AZ-51234567.txt` — doubles as the case id
    pub id: String,

    /// The full text of the judgment before normalisation
    pub text: String,
}

impl Document {
    /// Create a new Document from an id and text.
    ///
    /// Example:
    ///   let doc = Document::new("1.txt", "Le tribunal résilie le bail");
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id:   id.into(),
            text: text.into(),
        }
    }
}

/// A corpus file that could not be turned into a Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub id:     String,
    pub reason: String,
}

/// Everything a corpus load produced: the readable documents in
/// file-name order and the files that were skipped.
#[derive(Debug, Clone, Default)]
pub struct LoadedCorpus {
    pub documents: Vec<Document>,
    pub skipped:   Vec<SkippedDocument>,
}

/// Size and modification time of one corpus file, recorded when
/// the corpus is tagged so a later run can tell it has changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusFile {
    pub id:       String,
    pub len:      u64,
    pub modified: Option<SystemTime>,
}
