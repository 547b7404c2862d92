// ============================================================
// Layer 5 — Evaluation
// ============================================================
// Held-out quality numbers reported after training.
//
// Classification (per outcome label, 0/1 cells):
//   precision = tp / (tp + fp)
//   recall    = tp / (tp + fn)
//   f1        = 2·p·r / (p + r)
//   accuracy  = share of matching cells (hamming)
//   subset    = share of rows where every label matches
//
// Regression (averaged uniformly over target columns):
//   r2                 = 1 − SS_res / SS_tot
//   explained_variance = 1 − Var(y − ŷ) / Var(y)
//
// An undefined ratio (no positives, constant target) scores 0,
// except a perfect fit of a constant target, which scores 1.

use serde::{Deserialize, Serialize};

use crate::domain::error::ModelError;
use crate::domain::labels::ColumnLabelTable;
use crate::domain::record::is_active;

/// Precision / recall / f1 of one outcome label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label:     String,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    /// Positive cells in the ground truth
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub labels:           Vec<LabelScore>,
    pub hamming_accuracy: f64,
    pub subset_accuracy:  f64,
    pub test_size:        usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub r2:                 f64,
    pub explained_variance: f64,
    pub test_size:          usize,
}

fn check_shapes(what: &str, truth: &[Vec<f64>], pred: &[Vec<f64>]) -> Result<usize, ModelError> {
    if truth.is_empty() {
        return Err(ModelError::EmptyDataset(what.to_string()));
    }
    if truth.len() != pred.len() {
        return Err(ModelError::DimensionMismatch {
            what:     format!("{what} rows"),
            expected: truth.len(),
            found:    pred.len(),
        });
    }
    let width = truth[0].len();
    for (t, p) in truth.iter().zip(pred) {
        for row in [t, p] {
            if row.len() != width {
                return Err(ModelError::DimensionMismatch {
                    what:     format!("{what} columns"),
                    expected: width,
                    found:    row.len(),
                });
            }
        }
    }
    Ok(width)
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

/// Score 0/1 predictions against 0/1 truth, one column per label.
/// Cells are read with `is_active`, so raw outcome values work too.
pub fn classification_report(
    labels: &ColumnLabelTable,
    truth:  &[Vec<f64>],
    pred:   &[Vec<f64>],
) -> Result<ClassificationReport, ModelError> {
    let width = check_shapes("classification", truth, pred)?;

    let mut scores       = Vec::with_capacity(width);
    let mut matching     = 0usize;
    let mut exact_rows   = 0usize;

    for (t, p) in truth.iter().zip(pred) {
        let hits = t.iter().zip(p).filter(|(a, b)| is_active(**a) == is_active(**b)).count();
        matching += hits;
        if hits == width {
            exact_rows += 1;
        }
    }

    for col in 0..width {
        let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
        for (t, p) in truth.iter().zip(pred) {
            match (is_active(t[col]), is_active(p[col])) {
                (true, true)  => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                _             => {}
            }
        }
        let precision = ratio(tp as f64, (tp + fp) as f64);
        let recall    = ratio(tp as f64, (tp + fn_) as f64);
        scores.push(LabelScore {
            label:   labels.name(col).map(str::to_string).unwrap_or_else(|| format!("column_{col}")),
            precision,
            recall,
            f1:      ratio(2.0 * precision * recall, precision + recall),
            support: tp + fn_,
        });
    }

    let rows = truth.len();
    Ok(ClassificationReport {
        labels:           scores,
        hamming_accuracy: ratio(matching as f64, (rows * width) as f64),
        subset_accuracy:  exact_rows as f64 / rows as f64,
        test_size:        rows,
    })
}

fn unexplained_score(residual: f64, total: f64) -> f64 {
    if total > f64::EPSILON {
        1.0 - residual / total
    } else if residual <= f64::EPSILON {
        1.0
    } else {
        0.0
    }
}

/// R² and explained variance, uniformly averaged over columns
pub fn regression_report(truth: &[Vec<f64>], pred: &[Vec<f64>]) -> Result<RegressionReport, ModelError> {
    let width = check_shapes("regression", truth, pred)?;
    let n     = truth.len() as f64;

    let mut r2_sum = 0.0;
    let mut ev_sum = 0.0;

    for col in 0..width {
        let y: Vec<f64>   = truth.iter().map(|r| r[col]).collect();
        let err: Vec<f64> = truth.iter().zip(pred).map(|(t, p)| t[col] - p[col]).collect();

        let y_mean   = y.iter().sum::<f64>() / n;
        let err_mean = err.iter().sum::<f64>() / n;

        let ss_tot  = y.iter().map(|v| (v - y_mean).powi(2)).sum::<f64>();
        let ss_res  = err.iter().map(|e| e.powi(2)).sum::<f64>();
        let ss_evar = err.iter().map(|e| (e - err_mean).powi(2)).sum::<f64>();

        r2_sum += unexplained_score(ss_res, ss_tot);
        ev_sum += unexplained_score(ss_evar, ss_tot);
    }

    let cols = width.max(1) as f64;
    Ok(RegressionReport {
        r2:                 r2_sum / cols,
        explained_variance: ev_sum / cols,
        test_size:          truth.len(),
    })
}
