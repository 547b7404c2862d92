// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends evaluation metrics to a CSV file after each training
// run, one row per (model, metric):
//
//   model,metric,value
//   classifier,accuracy,0.912500
//   classifier,orders_resiliation.f1,0.874000
//   additional_indemnity_money,r2,0.421300
//   additional_indemnity_money,explained_variance,0.430100
//
// Output file: <binary_dir>/metrics.csv
//
// The numbers are observability only; nothing reads them back
// to decide whether a model is used.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

use crate::ml::evaluation::{ClassificationReport, RegressionReport};

/// One row of the metrics CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub model:  String,
    pub metric: String,
    pub value:  f64,
}

impl MetricRow {
    pub fn new(model: impl Into<String>, metric: impl Into<String>, value: f64) -> Self {
        Self { model: model.into(), metric: metric.into(), value }
    }

    /// Rows for a classifier report: overall accuracies, then
    /// precision / recall / f1 per outcome label
    pub fn from_classification(model: &str, report: &ClassificationReport) -> Vec<Self> {
        let mut rows = vec![
            Self::new(model, "accuracy", report.hamming_accuracy),
            Self::new(model, "subset_accuracy", report.subset_accuracy),
        ];
        for s in &report.labels {
            rows.push(Self::new(model, format!("{}.precision", s.label), s.precision));
            rows.push(Self::new(model, format!("{}.recall", s.label), s.recall));
            rows.push(Self::new(model, format!("{}.f1", s.label), s.f1));
        }
        rows
    }

    pub fn from_regression(model: &str, report: &RegressionReport) -> Vec<Self> {
        vec![
            Self::new(model, "r2", report.r2),
            Self::new(model, "explained_variance", report.explained_variance),
        ]
    }
}

/// Logs metric rows to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        // Header only for a new file; later runs append below
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "model,metric,value")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append rows to the CSV.
    pub fn log(&self, rows: &[MetricRow]) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        for r in rows {
            writeln!(f, "{},{},{:.6}", r.model, r.metric, r.value)?;
        }

        tracing::debug!("Logged {} metric rows to '{}'", rows.len(), self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
