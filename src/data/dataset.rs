use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::error::ModelError;
use crate::domain::record::TaggedRecord;

/// Row-major f32 matrix built from feature vectors, ready to become
/// a `[rows, cols]` tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows:   usize,
    cols:   usize,
    values: Vec<f32>,
}

impl FeatureMatrix {
    /// Stack rows that must all share one width.
    pub fn from_rows<'a, I>(what: &str, rows: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut values = Vec::new();
        let mut width  = None;
        let mut count  = 0usize;

        for row in rows {
            let expected = *width.get_or_insert(row.len());
            if row.len() != expected {
                return Err(ModelError::DimensionMismatch {
                    what:  what.to_string(),
                    expected,
                    found: row.len(),
                });
            }
            values.extend(row.iter().map(|&v| v as f32));
            count += 1;
        }

        if count == 0 {
            return Err(ModelError::EmptyDataset(what.to_string()));
        }

        Ok(Self { rows: count, cols: width.unwrap_or(0), values })
    }

    /// Facts vectors of `records`, one row per record
    pub fn facts(records: &[TaggedRecord]) -> Result<Self, ModelError> {
        Self::from_rows("facts_vector", records.iter().map(|r| r.facts_vector.as_slice()))
    }

    /// Build directly from owned target rows
    pub fn from_owned_rows(what: &str, rows: &[Vec<f64>]) -> Result<Self, ModelError> {
        Self::from_rows(what, rows.iter().map(|r| r.as_slice()))
    }

    pub fn rows(&self) -> usize { self.rows }

    pub fn cols(&self) -> usize { self.cols }

    /// Value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.cols + col]
    }

    /// Every value of one column, top to bottom
    pub fn column(&self, col: usize) -> Vec<f32> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::<B, 2>::from_data(
            TensorData::new(self.values.clone(), [self.rows, self.cols]),
            device,
        )
    }
}

/// Per-column standardisation stored next to a regressor, so that
/// monetary targets (hundreds to thousands of dollars) train on a
/// unit scale and predictions are mapped back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaler {
    pub mean:  Vec<f32>,
    pub scale: Vec<f32>,
}

impl ColumnScaler {
    /// Fit mean / standard deviation per column.
    /// A constant column gets scale 1 so it maps to zero.
    pub fn fit(m: &FeatureMatrix) -> Self {
        let mut mean  = Vec::with_capacity(m.cols());
        let mut scale = Vec::with_capacity(m.cols());

        for c in 0..m.cols() {
            let col = m.column(c);
            let n   = col.len() as f32;
            let mu  = col.iter().sum::<f32>() / n;
            let var = col.iter().map(|v| (v - mu).powi(2)).sum::<f32>() / n;
            let sd  = var.sqrt();
            mean.push(mu);
            scale.push(if sd > f32::EPSILON { sd } else { 1.0 });
        }

        Self { mean, scale }
    }

    /// Pass-through scaler for `cols` columns
    pub fn identity(cols: usize) -> Self {
        Self { mean: vec![0.0; cols], scale: vec![1.0; cols] }
    }

    pub fn transform(&self, m: &FeatureMatrix) -> FeatureMatrix {
        let mut values = Vec::with_capacity(m.rows() * m.cols());
        for r in 0..m.rows() {
            for c in 0..m.cols() {
                values.push((m.get(r, c) - self.mean[c]) / self.scale[c]);
            }
        }
        FeatureMatrix { rows: m.rows(), cols: m.cols(), values }
    }

    pub fn inverse(&self, col: usize, value: f32) -> f32 {
        value * self.scale[col] + self.mean[col]
    }
}
