// ============================================================
// Layer 6 — Model Store
// ============================================================
// Saves and restores every persisted artifact of the pipeline.
// One directory (the "binary directory") holds them all:
//
//   binary/
//     structured_data_dict.bin          ← tagged corpus (bincode)
//     classifier_model.bin / .json      ← classifier weights + shape/labels
//     <regressor-name>_model.bin / .json
//     multi_output_model.bin / .json
//     pipeline_config.json              ← TrainConfig of the last run
//     metrics.csv
//
// Weight blobs go through Burn's BinFileRecorder with full
// precision, so a reloaded model reproduces the in-memory model's
// predictions bit for bit. The `.json` sidecar of each model
// records the shapes needed to rebuild the module before the
// weights are loaded into it.
//
// Missing files are ModelError::NotFound, undecodable files are
// ModelError::Deserialization. Nothing here falls back to a
// default.

use burn::{
    prelude::*,
    record::{BinFileRecorder, FullPrecisionSettings, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::ModelError;
use crate::domain::record::TaggedRecord;

/// File name of the tagged corpus blob
pub const CORPUS_BLOB: &str = "structured_data_dict.bin";

/// Stem of the JSON sidecar describing what the blob was tagged from
pub const CORPUS_STEM: &str = "structured_data_dict";

/// Extension BinFileRecorder appends to weight blobs
const WEIGHTS_EXTENSION: &str = "bin";

type WeightsRecorder = BinFileRecorder<FullPrecisionSettings>;

/// Reads and writes artifacts inside one directory.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Create a store rooted at `dir`.
    /// The directory is only created when something is saved.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `dir/<stem>.bin`
    pub fn weights_path(&self, stem: &str) -> PathBuf {
        self.dir.join(stem).with_extension(WEIGHTS_EXTENSION)
    }

    /// `dir/<stem>.json`
    pub fn meta_path(&self, stem: &str) -> PathBuf {
        self.dir.join(stem).with_extension("json")
    }

    fn ensure_dir(&self) -> Result<(), ModelError> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    // ─── Tagged corpus ────────────────────────────────────────────────────────

    /// Write the tagged corpus as `structured_data_dict.bin`
    pub fn save_corpus(&self, records: &BTreeMap<String, TaggedRecord>) -> Result<PathBuf, ModelError> {
        self.ensure_dir()?;
        let path  = self.dir.join(CORPUS_BLOB);
        let bytes = bincode::serialize(records).map_err(|e| ModelError::Serialization {
            path:   path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, bytes)?;
        tracing::debug!("Saved {} tagged records to '{}'", records.len(), path.display());
        Ok(path)
    }

    /// Read `structured_data_dict.bin` back
    pub fn load_corpus(&self) -> Result<BTreeMap<String, TaggedRecord>, ModelError> {
        let path = self.dir.join(CORPUS_BLOB);
        if !path.is_file() {
            return Err(ModelError::NotFound(path));
        }
        let bytes = fs::read(&path)?;
        bincode::deserialize(&bytes).map_err(|e| ModelError::Deserialization {
            path,
            reason: e.to_string(),
        })
    }

    // ─── Model weights ────────────────────────────────────────────────────────

    /// Record a module's parameters to `<stem>.bin`
    pub fn save_module<B: Backend, M: Module<B>>(&self, stem: &str, module: &M) -> Result<(), ModelError> {
        self.ensure_dir()?;
        let path = self.dir.join(stem);
        WeightsRecorder::new()
            .record(module.clone().into_record(), path)
            .map_err(|e| ModelError::Serialization {
                path:   self.weights_path(stem),
                reason: e.to_string(),
            })?;
        tracing::debug!("Saved weights '{}'", self.weights_path(stem).display());
        Ok(())
    }

    /// Load `<stem>.bin` into a freshly built module of the same shape
    pub fn load_module<B: Backend, M: Module<B>>(
        &self,
        stem:   &str,
        module: M,
        device: &B::Device,
    ) -> Result<M, ModelError> {
        let file = self.weights_path(stem);
        if !file.is_file() {
            return Err(ModelError::NotFound(file));
        }
        let record = WeightsRecorder::new()
            .load(self.dir.join(stem), device)
            .map_err(|e| ModelError::Deserialization {
                path:   file.clone(),
                reason: e.to_string(),
            })?;
        Ok(module.load_record(record))
    }

    // ─── JSON sidecars and configs ────────────────────────────────────────────

    /// Write `<stem>.json`
    pub fn save_json<T: Serialize>(&self, stem: &str, value: &T) -> Result<(), ModelError> {
        self.ensure_dir()?;
        let path = self.meta_path(stem);
        let json = serde_json::to_string_pretty(value).map_err(|e| ModelError::Serialization {
            path:   path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json)?;
        Ok(())
    }

    /// Read `<stem>.json`
    pub fn load_json<T: DeserializeOwned>(&self, stem: &str) -> Result<T, ModelError> {
        let path = self.meta_path(stem);
        if !path.is_file() {
            return Err(ModelError::NotFound(path));
        }
        let json = fs::read_to_string(&path)?;
        serde_json::from_str(&json).map_err(|e| ModelError::Deserialization {
            path,
            reason: e.to_string(),
        })
    }
}
