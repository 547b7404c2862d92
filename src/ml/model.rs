use burn::{
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
};

use crate::domain::error::ModelError;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct LinearHeadConfig {
    /// Facts vector width
    pub d_input:  usize,
    /// One output per predicted column
    pub d_output: usize,
}

impl LinearHeadConfig {
    /// Zero-initialised, so training from the same data always
    /// starts from the same point.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LinearHead<B> {
        let linear = LinearConfig::new(self.d_input, self.d_output)
            .with_initializer(Initializer::Zeros)
            .init(device);
        LinearHead { linear }
    }
}

/// A single affine layer: `x · W + b`.
/// Logistic when its outputs are read through a sigmoid (classifier),
/// plain linear regression otherwise.
#[derive(Module, Debug)]
pub struct LinearHead<B: Backend> {
    pub linear: Linear<B>,
}

impl<B: Backend> LinearHead<B> {
    /// x: [rows, d_input] → [rows, d_output]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(x)
    }

    pub fn d_input(&self) -> usize {
        self.linear.weight.val().dims()[0]
    }

    pub fn d_output(&self) -> usize {
        self.linear.weight.val().dims()[1]
    }

    /// Weights of output 0 over every input, i.e. the first
    /// coefficient vector of the linear model
    pub fn first_coefficients(&self) -> Result<Vec<f32>, ModelError> {
        let d_in = self.d_input();
        self.linear
            .weight
            .val()
            .slice([0..d_in, 0..1])
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ModelError::Backend(format!("{e:?}")))
    }
}
