//! Dense (fully connected) layer implementation
//!
//! This module provides a DenseLayer that performs the transformation
//! `activs = f(W · x + b)` and keeps every buffer the backward pass needs.

use tracing::warn;

use crate::error::{NetworkError, Result};
use crate::optimizers::{Optimizer, ParamShape, ParamSlot};
use crate::utils::{Activation, SimpleRng};

/// Dense (fully connected) layer with weights, biases and training buffers.
///
/// # Layout
///
/// The weight matrix is `output_size × input_size`, row-major and flattened:
/// `weights[i * input_size + j]` connects input `j` to neuron `i`. Weight
/// gradients share that layout. Biases, bias gradients, pre-activation sums,
/// activations and deltas all have one entry per neuron.
///
/// # Example
///
/// ```
/// use feedforward::layers::DenseLayer;
/// use feedforward::utils::{Activation, SimpleRng};
///
/// let mut rng = SimpleRng::new(42);
/// let layer = DenseLayer::new(784, 16, Activation::Relu, &mut rng).unwrap();
/// assert_eq!(layer.input_size(), 784);
/// assert_eq!(layer.output_size(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct DenseLayer {
    input_size: usize,
    output_size: usize,
    weights: Vec<f32>,
    weight_grads: Vec<f32>,
    biases: Vec<f32>,
    bias_grads: Vec<f32>,
    deltas: Vec<f32>,
    sums: Vec<f32>,
    activs: Vec<f32>,
    activation: Activation,
}

impl DenseLayer {
    /// Create a new DenseLayer with normally distributed weights.
    ///
    /// Weights are drawn from N(0, gain / sqrt(input_size)) where the gain is
    /// sqrt(2) for ReLU layers and 1 otherwise. Biases start at zero.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` if either width is zero.
    pub fn new(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        check_widths(input_size, output_size)?;

        let gain = match activation {
            Activation::Relu => 2.0f32.sqrt(),
            _ => 1.0,
        };
        let stddev = gain / (input_size as f32).sqrt();

        let weights = (0..input_size * output_size)
            .map(|_| rng.next_normal(0.0, stddev))
            .collect();

        Ok(Self::with_buffers(
            input_size,
            output_size,
            weights,
            vec![0.0; output_size],
            activation,
        ))
    }

    /// Build a layer from explicit parameters.
    ///
    /// `weights` must hold `input_size * output_size` values in the layout
    /// described on [`DenseLayer`] and `biases` one value per neuron. All
    /// training buffers start at zero.
    pub fn from_parameters(
        input_size: usize,
        output_size: usize,
        weights: Vec<f32>,
        biases: Vec<f32>,
        activation: Activation,
    ) -> Result<Self> {
        check_widths(input_size, output_size)?;
        if weights.len() != input_size * output_size {
            return Err(NetworkError::ShapeMismatch {
                expected: input_size * output_size,
                actual: weights.len(),
            });
        }
        if biases.len() != output_size {
            return Err(NetworkError::ShapeMismatch {
                expected: output_size,
                actual: biases.len(),
            });
        }

        Ok(Self::with_buffers(
            input_size,
            output_size,
            weights,
            biases,
            activation,
        ))
    }

    fn with_buffers(
        input_size: usize,
        output_size: usize,
        weights: Vec<f32>,
        biases: Vec<f32>,
        activation: Activation,
    ) -> Self {
        Self {
            input_size,
            output_size,
            weight_grads: vec![0.0; weights.len()],
            weights,
            biases,
            bias_grads: vec![0.0; output_size],
            deltas: vec![0.0; output_size],
            sums: vec![0.0; output_size],
            activs: vec![0.0; output_size],
            activation,
        }
    }

    /// Get the input size of the layer.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Get the output size of the layer.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Mutable access to the weights, for fixtures and gradient checks.
    pub fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    pub fn biases_mut(&mut self) -> &mut [f32] {
        &mut self.biases
    }

    pub fn weight_grads(&self) -> &[f32] {
        &self.weight_grads
    }

    pub fn bias_grads(&self) -> &[f32] {
        &self.bias_grads
    }

    pub fn deltas(&self) -> &[f32] {
        &self.deltas
    }

    /// Pre-activation sums from the last forward pass.
    pub fn sums(&self) -> &[f32] {
        &self.sums
    }

    /// Post-activation outputs from the last forward pass.
    pub fn activations(&self) -> &[f32] {
        &self.activs
    }

    /// Get the number of trainable parameters.
    ///
    /// Returns input_size × output_size (weights) + output_size (biases).
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Parameter counts used to size optimizer caches.
    pub fn shape(&self) -> ParamShape {
        ParamShape {
            weights: self.weights.len(),
            biases: self.biases.len(),
        }
    }

    /// Forward pass: `sums = W · input + b`, then the activation into `activs`.
    pub fn forward(&mut self, input: &[f32]) -> Result<()> {
        if input.len() != self.input_size {
            warn!(
                "dense forward: input length {} != layer input {}",
                input.len(),
                self.input_size
            );
            return Err(NetworkError::InvalidArgument(format!(
                "input has {} values, layer expects {}",
                input.len(),
                self.input_size
            )));
        }

        for (i, sum) in self.sums.iter_mut().enumerate() {
            let row = &self.weights[i * self.input_size..(i + 1) * self.input_size];
            *sum = row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + self.biases[i];
        }
        self.activation.apply(&self.sums, &mut self.activs)
    }

    /// Output-layer deltas.
    ///
    /// With `canonical` set (softmax + categorical cross-entropy or sigmoid +
    /// binary cross-entropy) the delta reduces to `a - y`. Otherwise the
    /// squared-error form `(a - y) · f'(sum)` is used.
    pub(crate) fn set_output_deltas(&mut self, y_true: &[f32], canonical: bool) -> Result<()> {
        if y_true.len() != self.output_size {
            return Err(NetworkError::ShapeMismatch {
                expected: self.output_size,
                actual: y_true.len(),
            });
        }

        for i in 0..self.output_size {
            let error = self.activs[i] - y_true[i];
            self.deltas[i] = if canonical {
                error
            } else {
                error * self.derivative_at(i)?
            };
        }
        Ok(())
    }

    /// Hidden-layer deltas, pulled back through the following layer.
    ///
    /// `delta[i] = (Σ_j next.delta[j] · next.w[j][i]) · f'(sum[i])`
    pub(crate) fn set_hidden_deltas(&mut self, next: &DenseLayer) -> Result<()> {
        if next.input_size != self.output_size {
            return Err(NetworkError::ShapeMismatch {
                expected: self.output_size,
                actual: next.input_size,
            });
        }

        for i in 0..self.output_size {
            let mut error = 0.0;
            for j in 0..next.output_size {
                error += next.deltas[j] * next.weights[j * next.input_size + i];
            }
            self.deltas[i] = error * self.derivative_at(i)?;
        }
        Ok(())
    }

    /// Adds `delta ⊗ prev` to the weight gradients and `delta` to the bias
    /// gradients. `prev` is the input this layer saw on the forward pass.
    pub(crate) fn accumulate_gradients(&mut self, prev: &[f32]) -> Result<()> {
        if prev.len() != self.input_size {
            return Err(NetworkError::ShapeMismatch {
                expected: self.input_size,
                actual: prev.len(),
            });
        }

        for (i, &delta) in self.deltas.iter().enumerate() {
            let row = &mut self.weight_grads[i * self.input_size..(i + 1) * self.input_size];
            for (grad, &x) in row.iter_mut().zip(prev) {
                *grad += delta * x;
            }
            self.bias_grads[i] += delta;
        }
        Ok(())
    }

    /// Hand the weights then the biases of layer `index` to the optimizer.
    pub(crate) fn apply_update(&mut self, index: usize, optimizer: &mut dyn Optimizer) -> Result<()> {
        optimizer.update(ParamSlot::weights(index), &mut self.weights, &self.weight_grads)?;
        optimizer.update(ParamSlot::biases(index), &mut self.biases, &self.bias_grads)
    }

    /// Clear both gradient buffers to exactly zero.
    pub fn zero_grads(&mut self) {
        self.weight_grads.fill(0.0);
        self.bias_grads.fill(0.0);
    }

    fn derivative_at(&self, i: usize) -> Result<f32> {
        self.activation.derivative(self.sums[i]).ok_or_else(|| {
            NetworkError::InvalidArgument(format!(
                "{} has no pointwise derivative",
                self.activation
            ))
        })
    }
}

fn check_widths(input_size: usize, output_size: usize) -> Result<()> {
    if input_size == 0 || output_size == 0 {
        warn!(
            "dense layer widths must be positive, got {}x{}",
            input_size, output_size
        );
        return Err(NetworkError::InvalidArgument(format!(
            "layer widths must be positive, got {} -> {}",
            input_size, output_size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fixture() -> DenseLayer {
        // 2 inputs -> 2 neurons
        DenseLayer::from_parameters(
            2,
            2,
            vec![0.5, -1.0, 2.0, 0.25],
            vec![0.1, -0.2],
            Activation::Linear,
        )
        .unwrap()
    }

    #[test]
    fn test_dense_layer_creation() {
        let mut rng = SimpleRng::new(42);
        let layer = DenseLayer::new(10, 5, Activation::Sigmoid, &mut rng).unwrap();

        assert_eq!(layer.input_size(), 10);
        assert_eq!(layer.output_size(), 5);
        assert_eq!(layer.weights().len(), 50); // 10 × 5
        assert_eq!(layer.biases().len(), 5);
        assert_eq!(layer.weight_grads().len(), 50);
        assert_eq!(layer.sums().len(), 5);
        assert_eq!(layer.activation(), Activation::Sigmoid);
    }

    #[test]
    fn test_zero_width_rejected() {
        let mut rng = SimpleRng::new(1);
        assert!(DenseLayer::new(0, 3, Activation::Relu, &mut rng).is_err());
        assert!(DenseLayer::new(3, 0, Activation::Relu, &mut rng).is_err());
    }

    #[test]
    fn test_dense_layer_parameter_count() {
        let mut rng = SimpleRng::new(42);
        let layer = DenseLayer::new(784, 16, Activation::Relu, &mut rng).unwrap();

        assert_eq!(layer.parameter_count(), 784 * 16 + 16);
        assert_eq!(
            layer.shape(),
            ParamShape {
                weights: 784 * 16,
                biases: 16
            }
        );
    }

    #[test]
    fn test_normal_initialization() {
        let mut rng = SimpleRng::new(42);
        let layer = DenseLayer::new(200, 50, Activation::Relu, &mut rng).unwrap();

        let n = layer.weights().len() as f32;
        let mean = layer.weights().iter().sum::<f32>() / n;
        let var = layer
            .weights()
            .iter()
            .map(|w| (w - mean) * (w - mean))
            .sum::<f32>()
            / n;

        // He-style std: sqrt(2) / sqrt(200) = 0.1
        assert!(mean.abs() < 0.01);
        assert!((var.sqrt() - 0.1).abs() < 0.01);
        assert!(layer.biases().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_deterministic_initialization() {
        let mut rng1 = SimpleRng::new(42);
        let layer1 = DenseLayer::new(10, 5, Activation::Linear, &mut rng1).unwrap();

        let mut rng2 = SimpleRng::new(42);
        let layer2 = DenseLayer::new(10, 5, Activation::Linear, &mut rng2).unwrap();

        assert_eq!(layer1.weights(), layer2.weights());
    }

    #[test]
    fn test_from_parameters_checks_lengths() {
        let result = DenseLayer::from_parameters(2, 2, vec![0.0; 3], vec![0.0; 2], Activation::Linear);
        assert!(matches!(
            result,
            Err(NetworkError::ShapeMismatch {
                expected: 4,
                actual: 3
            })
        ));
        let result = DenseLayer::from_parameters(2, 2, vec![0.0; 4], vec![0.0; 1], Activation::Linear);
        assert!(result.is_err());
    }

    #[test]
    fn test_forward_row_major() {
        let mut layer = fixture();
        layer.forward(&[1.0, 2.0]).unwrap();

        // neuron 0: 0.5*1 - 1*2 + 0.1, neuron 1: 2*1 + 0.25*2 - 0.2
        assert_relative_eq!(layer.sums()[0], -1.4, epsilon = 1e-6);
        assert_relative_eq!(layer.sums()[1], 2.3, epsilon = 1e-6);
        assert_eq!(layer.sums(), layer.activations());
    }

    #[test]
    fn test_forward_rejects_wrong_input() {
        let mut layer = fixture();
        assert!(layer.forward(&[1.0]).is_err());
    }

    #[test]
    fn test_accumulate_and_zero() {
        let mut layer = fixture();
        layer.forward(&[1.0, 2.0]).unwrap();
        layer.set_output_deltas(&[0.0, 0.0], false).unwrap();
        layer.accumulate_gradients(&[1.0, 2.0]).unwrap();

        assert_relative_eq!(layer.weight_grads()[0], -1.4, epsilon = 1e-6);
        assert_relative_eq!(layer.weight_grads()[1], -2.8, epsilon = 1e-6);
        assert_relative_eq!(layer.bias_grads()[1], 2.3, epsilon = 1e-6);

        layer.zero_grads();
        assert!(layer.weight_grads().iter().all(|&g| g == 0.0));
        assert!(layer.bias_grads().iter().all(|&g| g == 0.0));
    }

    #[test]
    fn test_softmax_has_no_hidden_delta() {
        let mut hidden =
            DenseLayer::from_parameters(2, 2, vec![0.0; 4], vec![0.0; 2], Activation::Softmax).unwrap();
        let next = fixture();
        assert!(hidden.set_hidden_deltas(&next).is_err());
    }
}
