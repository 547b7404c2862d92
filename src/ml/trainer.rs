// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full-batch gradient descent with Adam for the linear models.
//
// The corpora are small (hundreds to a few thousand judgments,
// tens of features), so every epoch is one forward pass over the
// whole training matrix:
//
//   output = X · W + b
//   loss   = objective(output, Y)
//   W, b  ← Adam step on ∂loss
//
// X is standardised per column (facts mix 0/1 flags with rent
// amounts in the hundreds), and so is Y for regression. The
// scalers travel with the head in LinearFit.
//
// Objectives:
//   Logistic     — softplus(z) − y·z per cell, i.e. binary cross
//                  entropy on logits, one independent label per column
//   SquaredError — (ŷ − y)² per cell
//
// Key Burn insight (as in every Burn trainer):
//   - fitting uses TrainBackend = Autodiff<NdArray>
//   - model.valid() returns the same weights on InferBackend
//
// Reference: Kingma & Ba (2015) Adam

use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::activation,
};
use serde::{Deserialize, Serialize};

use crate::data::dataset::{ColumnScaler, FeatureMatrix};
use crate::data::splitter::split_train_test;
use crate::domain::error::ModelError;
use crate::infra::model_store::ModelStore;
use crate::ml::model::{LinearHead, LinearHeadConfig};
use crate::ml::{InferBackend, TrainBackend};

/// Hyperparameters shared by the classifier and every regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    /// Full-batch passes over the training matrix
    pub epochs:        usize,
    /// Adam step size
    pub learning_rate: f64,
    /// Held-out share of the corpus for the quality report
    pub test_fraction: f64,
    /// Shuffle seed of the train/test split
    pub seed:          u64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            epochs:        500,
            learning_rate: 0.05,
            test_fraction: 0.2,
            seed:          42,
        }
    }
}

/// Split `samples` into (train, held-out) with the configured
/// fraction and seed. A corpus too small to leave anything to train
/// on is used whole, with an empty held-out set.
pub fn holdout<T: Clone>(samples: &[T], options: &FitOptions) -> (Vec<T>, Vec<T>) {
    let (train, test) = split_train_test(samples.to_vec(), options.test_fraction, options.seed);
    if train.is_empty() {
        tracing::debug!("{} samples: too few to hold any back", samples.len());
        return (samples.to_vec(), Vec::new());
    }
    (train, test)
}

/// Loss minimised by `fit_linear`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Logistic,
    SquaredError,
}

impl Objective {
    fn loss<B: Backend>(self, output: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        match self {
            Objective::Logistic => {
                // softplus(z) = max(z, 0) + ln(1 + e^-|z|), stable for large |z|
                let softplus = activation::relu(output.clone())
                    + output.clone().abs().neg().exp().log1p();
                (softplus - targets * output).mean()
            }
            Objective::SquaredError => (output - targets).powf_scalar(2.0).mean(),
        }
    }
}

/// Shape and scaling of a fitted head, stored in model sidecars
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearFitMeta {
    pub head:    LinearHeadConfig,
    pub inputs:  ColumnScaler,
    pub targets: ColumnScaler,
}

/// A trained head together with the standardisation of its inputs
/// and targets. Predictions come back in target units.
#[derive(Debug, Clone)]
pub struct LinearFit {
    head:    LinearHead<InferBackend>,
    inputs:  ColumnScaler,
    targets: ColumnScaler,
}

impl LinearFit {
    pub fn d_input(&self) -> usize {
        self.head.d_input()
    }

    pub fn d_output(&self) -> usize {
        self.head.d_output()
    }

    /// Output-0 coefficients over the standardised inputs
    pub fn first_coefficients(&self) -> Result<Vec<f32>, ModelError> {
        self.head.first_coefficients()
    }

    /// `first_coefficients`, with a read failure logged instead of
    /// returned so it never passes for "not trained" silently.
    pub fn weights(&self, what: &str) -> Option<Vec<f32>> {
        coefficients_or_warn(what, self.first_coefficients())
    }

    /// Run the head over every row of `features`.
    /// Returns one `Vec` of outputs per row.
    pub fn predict_rows(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f32>>, ModelError> {
        if features.cols() != self.d_input() {
            return Err(ModelError::DimensionMismatch {
                what:     "facts_vector".to_string(),
                expected: self.d_input(),
                found:    features.cols(),
            });
        }

        let device = Default::default();
        let x      = self.inputs.transform(features).to_tensor::<InferBackend>(&device);
        let flat   = self
            .head
            .forward(x)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ModelError::Backend(format!("{e:?}")))?;

        let width = self.d_output().max(1);
        Ok(flat
            .chunks(width)
            .map(|row| row.iter().enumerate().map(|(c, &z)| self.targets.inverse(c, z)).collect())
            .collect())
    }

    /// Run the head on one facts vector
    pub fn predict_one(&self, facts: &[f64]) -> Result<Vec<f32>, ModelError> {
        let matrix = FeatureMatrix::from_rows("facts_vector", [facts])?;
        let mut rows = self.predict_rows(&matrix)?;
        rows.pop().ok_or_else(|| ModelError::Backend("empty prediction".to_string()))
    }

    pub fn meta(&self) -> LinearFitMeta {
        LinearFitMeta {
            head:    LinearHeadConfig::new(self.d_input(), self.d_output()),
            inputs:  self.inputs.clone(),
            targets: self.targets.clone(),
        }
    }

    /// Write the head weights as `<stem>.bin`
    pub fn save(&self, store: &ModelStore, stem: &str) -> Result<(), ModelError> {
        store.save_module::<InferBackend, _>(stem, &self.head)
    }

    /// Rebuild a fit from its sidecar and `<stem>.bin`
    pub fn restore(store: &ModelStore, stem: &str, meta: LinearFitMeta) -> Result<Self, ModelError> {
        let device = Default::default();
        let head   = store.load_module::<InferBackend, _>(stem, meta.head.init::<InferBackend>(&device), &device)?;
        Ok(Self { head, inputs: meta.inputs, targets: meta.targets })
    }
}

/// Fit a LinearHead mapping `features` to `targets`.
///
/// Inputs are always standardised; targets only for SquaredError,
/// Logistic targets stay 0/1.
pub fn fit_linear(
    what:      &str,
    features:  &FeatureMatrix,
    targets:   &FeatureMatrix,
    objective: Objective,
    options:   &FitOptions,
) -> Result<LinearFit, ModelError> {
    if features.rows() != targets.rows() {
        return Err(ModelError::DimensionMismatch {
            what:     format!("{what} targets"),
            expected: features.rows(),
            found:    targets.rows(),
        });
    }

    let inputs        = ColumnScaler::fit(features);
    let target_scaler = match objective {
        Objective::Logistic     => ColumnScaler::identity(targets.cols()),
        Objective::SquaredError => ColumnScaler::fit(targets),
    };

    let device = Default::default();
    let x = inputs.transform(features).to_tensor::<TrainBackend>(&device);
    let y = target_scaler.transform(targets).to_tensor::<TrainBackend>(&device);

    let mut model: LinearHead<TrainBackend> =
        LinearHeadConfig::new(features.cols(), targets.cols()).init(&device);
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    tracing::debug!(
        "Fitting {} ({:?}): {} rows, {} inputs, {} outputs, {} epochs",
        what, objective, features.rows(), features.cols(), targets.cols(), options.epochs,
    );

    for epoch in 1..=options.epochs {
        let output = model.forward(x.clone());
        let loss   = objective.loss(output, y.clone());

        if epoch == 1 || epoch % 100 == 0 || epoch == options.epochs {
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            tracing::debug!("{} epoch {:>4}/{} | loss={:.6}", what, epoch, options.epochs, loss_val);
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(options.learning_rate, model, grads);
    }

    Ok(LinearFit { head: model.valid(), inputs, targets: target_scaler })
}

fn coefficients_or_warn(what: &str, read: Result<Vec<f32>, ModelError>) -> Option<Vec<f32>> {
    match read {
        Ok(weights) => Some(weights),
        Err(e) => {
            tracing::warn!("Could not read {what} weights: {e}");
            None
        }
    }
}

/// Logistic link used to read classifier outputs
pub fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[Vec<f64>]) -> FeatureMatrix {
        FeatureMatrix::from_owned_rows("test", rows).unwrap()
    }

    #[test]
    fn test_squared_error_fits_a_line() {
        // y = 2·x0 − 1
        let x = matrix(&[vec![0.0], vec![1.0], vec![0.0], vec![1.0]]);
        let y = matrix(&[vec![-1.0], vec![1.0], vec![-1.0], vec![1.0]]);
        let options = FitOptions { epochs: 400, learning_rate: 0.05, ..FitOptions::default() };
        let model   = fit_linear("line", &x, &y, Objective::SquaredError, &options).unwrap();

        let pred = model.predict_rows(&x).unwrap();
        assert!((pred[0][0] + 1.0).abs() < 0.1, "got {}", pred[0][0]);
        assert!((pred[1][0] - 1.0).abs() < 0.1, "got {}", pred[1][0]);
    }

    #[test]
    fn test_logistic_separates_labels() {
        let x = matrix(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
        let y = matrix(&[vec![1.0], vec![0.0], vec![1.0], vec![0.0]]);
        let options = FitOptions { epochs: 200, learning_rate: 0.1, ..FitOptions::default() };
        let model   = fit_linear("labels", &x, &y, Objective::Logistic, &options).unwrap();

        let pred = model.predict_rows(&x).unwrap();
        assert!(sigmoid(pred[0][0]) > 0.5);
        assert!(sigmoid(pred[1][0]) < 0.5);
    }

    #[test]
    fn test_row_mismatch_is_rejected() {
        let x   = matrix(&[vec![1.0], vec![0.0]]);
        let y   = matrix(&[vec![1.0]]);
        let err = fit_linear("bad", &x, &y, Objective::SquaredError, &FitOptions::default()).unwrap_err();
        assert!(matches!(err, ModelError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_predict_one_checks_width() {
        let x     = matrix(&[vec![1.0, 0.0]]);
        let y     = matrix(&[vec![1.0]]);
        let opts  = FitOptions { epochs: 1, ..FitOptions::default() };
        let model = fit_linear("w", &x, &y, Objective::SquaredError, &opts).unwrap();
        assert!(matches!(
            model.predict_one(&[1.0]),
            Err(ModelError::DimensionMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_large_inputs_are_standardised() {
        // a rent-like fact in the hundreds next to a 0/1 flag
        let x = matrix(&[vec![800.0, 1.0], vec![650.0, 0.0], vec![900.0, 1.0], vec![700.0, 0.0]]);
        let y = matrix(&[vec![1.0], vec![0.0], vec![1.0], vec![0.0]]);
        let options = FitOptions { epochs: 200, learning_rate: 0.1, ..FitOptions::default() };
        let model   = fit_linear("rent", &x, &y, Objective::Logistic, &options).unwrap();

        let pred = model.predict_one(&[850.0, 1.0]).unwrap();
        assert!(sigmoid(pred[0]) > 0.5);
        assert_eq!(model.meta().inputs.mean, vec![762.5, 0.5]);
    }

    #[test]
    fn test_restore_reproduces_predictions() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let x     = matrix(&[vec![0.0], vec![1.0], vec![2.0]]);
        let y     = matrix(&[vec![10.0], vec![20.0], vec![30.0]]);
        let opts  = FitOptions { epochs: 50, ..FitOptions::default() };
        let model = fit_linear("restore", &x, &y, Objective::SquaredError, &opts).unwrap();

        model.save(&store, "restore_model").unwrap();
        let back = LinearFit::restore(&store, "restore_model", model.meta()).unwrap();
        assert_eq!(back.predict_rows(&x).unwrap(), model.predict_rows(&x).unwrap());
    }

    #[test]
    fn test_holdout_keeps_tiny_corpus_for_training() {
        let opts = FitOptions::default();
        let (train, test) = holdout(&[7u8], &opts);
        assert_eq!((train, test.len()), (vec![7], 0));

        let (train, test) = holdout(&(0..10).collect::<Vec<u8>>(), &opts);
        assert_eq!((train.len(), test.len()), (8, 2));
    }

    #[test]
    fn test_weight_read_failure_is_none() {
        let failed = Err(ModelError::Backend("tensor conversion".to_string()));
        assert_eq!(coefficients_or_warn("classifier", failed), None);
        assert_eq!(coefficients_or_warn("classifier", Ok(vec![0.5])), Some(vec![0.5]));
    }

    #[test]
    fn test_sigmoid_midpoint() {
        assert_eq!(sigmoid(0.0), 0.5);
    }
}
