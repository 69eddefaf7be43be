//! The network engine
//!
//! A [`Network`] owns an ordered stack of dense layers together with the loss
//! and optimizer chosen for it. The stack has a capacity fixed at creation;
//! the network becomes usable ("ready") once exactly that many layers have
//! been appended. Every numeric operation checks readiness first.
//!
//! # Example
//!
//! ```
//! use feedforward::network::Network;
//! use feedforward::optimizers::{OptimizerConfig, OptimizerKind};
//! use feedforward::utils::{Activation, Loss, SimpleRng};
//!
//! let mut rng = SimpleRng::new(7);
//! let mut net = Network::new(2).unwrap();
//! net.add_layer(2, 4, Activation::Sigmoid, &mut rng).unwrap();
//! net.add_layer(4, 1, Activation::Sigmoid, &mut rng).unwrap();
//! net.setup_loss(Loss::BinaryCrossEntropy);
//! net.setup_optimizer(OptimizerConfig::new(OptimizerKind::Adam, 0.01)).unwrap();
//!
//! net.forward(&[1.0, 0.0]).unwrap();
//! net.backward(&[1.0, 0.0], &[1.0]).unwrap();
//! net.update_weights().unwrap();
//! net.zero_grads().unwrap();
//! ```

mod batch;
mod persistence;

pub use batch::BatchAccumulator;

use std::fmt;
use std::fmt::Write as _;

use tracing::{debug, warn};

use crate::error::{NetworkError, Result};
use crate::layers::DenseLayer;
use crate::optimizers::{Optimizer, OptimizerConfig, ParamShape};
use crate::utils::{Activation, Loss, SimpleRng};

/// Layers and neurons shown by [`Network::summary`].
const SUMMARY_LIMIT: usize = 10;

/// A fixed-depth stack of dense layers with its training configuration.
#[derive(Debug)]
pub struct Network {
    capacity: usize,
    layers: Vec<DenseLayer>,
    loss: Option<Loss>,
    optimizer: Option<Box<dyn Optimizer>>,
}

impl Network {
    /// Create an empty network that will hold exactly `capacity` layers.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            warn!("network capacity must be positive");
            return Err(NetworkError::InvalidArgument(
                "network must have at least one layer".to_string(),
            ));
        }
        debug!(capacity, "network created");
        Ok(Self {
            capacity,
            layers: Vec::new(),
            loss: None,
            optimizer: None,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of layers appended so far.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// True once every declared layer has been appended.
    pub fn is_ready(&self) -> bool {
        self.layers.len() == self.capacity
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&DenseLayer> {
        self.layers.get(index)
    }

    /// Mutable access to one layer's parameters.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut DenseLayer> {
        self.layers.get_mut(index)
    }

    /// Total number of weights across all layers.
    pub fn num_weights(&self) -> usize {
        self.layers.iter().map(|l| l.weights().len()).sum()
    }

    /// Total number of biases across all layers.
    pub fn num_biases(&self) -> usize {
        self.layers.iter().map(|l| l.biases().len()).sum()
    }

    pub fn parameter_count(&self) -> usize {
        self.num_weights() + self.num_biases()
    }

    pub fn input_size(&self) -> Option<usize> {
        self.layers.first().map(DenseLayer::input_size)
    }

    pub fn output_size(&self) -> Option<usize> {
        self.layers.last().map(DenseLayer::output_size)
    }

    /// Append a freshly initialized layer.
    ///
    /// # Errors
    ///
    /// - `AlreadyInitialized` if the network already holds `capacity` layers
    /// - `InvalidArgument` for a zero width
    /// - `ShapeMismatch` if `input_size` differs from the previous layer's output
    pub fn add_layer(
        &mut self,
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut SimpleRng,
    ) -> Result<()> {
        self.check_can_append(input_size)?;
        let layer = DenseLayer::new(input_size, output_size, activation, rng)?;
        self.push_layer(layer)
    }

    /// Append a layer built elsewhere, e.g. with [`DenseLayer::from_parameters`].
    pub fn push_layer(&mut self, layer: DenseLayer) -> Result<()> {
        self.check_can_append(layer.input_size())?;
        debug!(
            index = self.layers.len(),
            input = layer.input_size(),
            output = layer.output_size(),
            activation = %layer.activation(),
            "layer added"
        );
        self.layers.push(layer);
        Ok(())
    }

    fn check_can_append(&self, input_size: usize) -> Result<()> {
        if self.is_ready() {
            warn!("layer rejected: network already holds {} layers", self.capacity);
            return Err(NetworkError::AlreadyInitialized {
                capacity: self.capacity,
            });
        }
        if let Some(prev) = self.layers.last() {
            if prev.output_size() != input_size {
                warn!(
                    "layer rejected: input {} does not match previous output {}",
                    input_size,
                    prev.output_size()
                );
                return Err(NetworkError::ShapeMismatch {
                    expected: prev.output_size(),
                    actual: input_size,
                });
            }
        }
        Ok(())
    }

    fn check_ready(&self) -> Result<()> {
        if !self.is_ready() {
            warn!(
                "network not ready: {} of {} layers",
                self.layers.len(),
                self.capacity
            );
            return Err(NetworkError::NotReady {
                declared: self.capacity,
                initialized: self.layers.len(),
            });
        }
        Ok(())
    }

    /// Select the loss used by [`Network::compute_loss`] and [`Network::backward`].
    pub fn setup_loss(&mut self, loss: Loss) {
        debug!(%loss, "loss configured");
        self.loss = Some(loss);
    }

    pub fn loss(&self) -> Option<Loss> {
        self.loss
    }

    /// Build the optimizer described by `config` and size its cache to this
    /// network. Replaces any previously configured optimizer and its state.
    pub fn setup_optimizer(&mut self, config: OptimizerConfig) -> Result<()> {
        self.check_ready()?;
        let mut optimizer = config.build()?;
        let shapes: Vec<ParamShape> = self.layers.iter().map(DenseLayer::shape).collect();
        optimizer.allocate(&shapes);
        debug!(
            optimizer = %config.kind,
            learning_rate = config.learning_rate,
            "optimizer configured"
        );
        self.optimizer = Some(optimizer);
        Ok(())
    }

    pub fn optimizer(&self) -> Option<&dyn Optimizer> {
        self.optimizer.as_deref()
    }

    pub fn optimizer_mut(&mut self) -> Option<&mut (dyn Optimizer + 'static)> {
        self.optimizer.as_deref_mut()
    }

    /// Run the input through every layer and return the final activations.
    pub fn forward(&mut self, input: &[f32]) -> Result<&[f32]> {
        self.check_ready()?;

        let (first, rest) = self
            .layers
            .split_first_mut()
            .ok_or(NetworkError::NotReady {
                declared: self.capacity,
                initialized: 0,
            })?;
        first.forward(input)?;

        let mut prev: &DenseLayer = first;
        for layer in rest.iter_mut() {
            layer.forward(prev.activations())?;
            prev = layer;
        }
        Ok(prev.activations())
    }

    /// Final activations from the most recent forward pass.
    pub fn output(&self) -> Result<&[f32]> {
        self.check_ready()?;
        self.layers
            .last()
            .map(DenseLayer::activations)
            .ok_or(NetworkError::NotReady {
                declared: self.capacity,
                initialized: 0,
            })
    }

    /// Evaluate the configured loss on the last forward pass.
    pub fn compute_loss(&self, y_true: &[f32]) -> Result<f32> {
        self.check_ready()?;
        let loss = self.loss.ok_or(NetworkError::LossNotConfigured)?;
        let output = self.output()?;
        if y_true.len() != output.len() {
            warn!("target length {} != output width {}", y_true.len(), output.len());
            return Err(NetworkError::ShapeMismatch {
                expected: output.len(),
                actual: y_true.len(),
            });
        }
        loss.compute(y_true, output)
    }

    /// Check that the configured loss and the layer stack can be
    /// differentiated, returning whether the output pairing is canonical.
    fn check_backward_support(&self, loss: Loss) -> Result<bool> {
        let last = self.layers.len() - 1;
        for (index, layer) in self.layers[..last].iter().enumerate() {
            if layer.activation() == Activation::Softmax {
                warn!("backward rejected: hidden layer {} uses softmax", index);
                return Err(NetworkError::SoftmaxInHiddenLayer { layer: index });
            }
        }

        let output = self.layers[last].activation();
        match (loss, output) {
            (Loss::CategoricalCrossEntropy, Activation::Softmax)
            | (Loss::BinaryCrossEntropy, Activation::Sigmoid) => Ok(true),
            (Loss::MeanSquaredError, activation) if activation != Activation::Softmax => Ok(false),
            (loss, activation) => {
                warn!("backward rejected: {} loss with {} output", loss, activation);
                Err(NetworkError::UnsupportedCombination {
                    loss: loss.name(),
                    activation: activation.name(),
                })
            }
        }
    }

    /// Back-propagate the error for `y_true` and add the resulting gradients
    /// to every layer's gradient buffers.
    ///
    /// Uses the sums and activations of the last [`Network::forward`] call,
    /// which must have been made with the same `input`. Gradients accumulate
    /// across calls until [`Network::zero_grads`].
    ///
    /// The whole stack is validated before anything is written, so a rejected
    /// call leaves every buffer as it was.
    pub fn backward(&mut self, input: &[f32], y_true: &[f32]) -> Result<()> {
        self.check_ready()?;
        let loss = self.loss.ok_or(NetworkError::LossNotConfigured)?;

        let (input_size, output_size) = match (self.input_size(), self.output_size()) {
            (Some(i), Some(o)) => (i, o),
            _ => {
                return Err(NetworkError::NotReady {
                    declared: self.capacity,
                    initialized: 0,
                })
            }
        };
        if input.len() != input_size {
            warn!("backward: input length {} != {}", input.len(), input_size);
            return Err(NetworkError::ShapeMismatch {
                expected: input_size,
                actual: input.len(),
            });
        }
        if y_true.len() != output_size {
            warn!("backward: target length {} != {}", y_true.len(), output_size);
            return Err(NetworkError::ShapeMismatch {
                expected: output_size,
                actual: y_true.len(),
            });
        }
        let canonical = self.check_backward_support(loss)?;

        let last = self.layers.len() - 1;
        for l in (0..=last).rev() {
            let (before, rest) = self.layers.split_at_mut(l);
            let (current, after) = rest.split_at_mut(1);
            let layer = &mut current[0];

            match after.first() {
                None => layer.set_output_deltas(y_true, canonical)?,
                Some(next) => layer.set_hidden_deltas(next)?,
            }

            let prev = match before.last() {
                Some(prev_layer) => prev_layer.activations(),
                None => input,
            };
            layer.accumulate_gradients(prev)?;
        }
        Ok(())
    }

    /// Apply one optimizer step to every layer, weights then biases, in
    /// layer order.
    pub fn update_weights(&mut self) -> Result<()> {
        self.check_ready()?;
        let optimizer = match self.optimizer.as_mut() {
            Some(optimizer) => optimizer,
            None => {
                warn!("update rejected: optimizer not configured");
                return Err(NetworkError::OptimizerNotConfigured);
            }
        };

        for (index, layer) in self.layers.iter_mut().enumerate() {
            layer.apply_update(index, &mut **optimizer)?;
        }
        Ok(())
    }

    /// Reset every gradient buffer to zero.
    pub fn zero_grads(&mut self) -> Result<()> {
        self.check_ready()?;
        for layer in &mut self.layers {
            layer.zero_grads();
        }
        Ok(())
    }

    /// Multi-line dump of the first layers and neurons: weights, bias,
    /// gradients, last sum and activation.
    pub fn summary(&self) -> String {
        if !self.is_ready() {
            return format!(
                "Network not ready: {} of {} layers initialized\n",
                self.layers.len(),
                self.capacity
            );
        }

        let mut out = String::new();
        for (l, layer) in self.layers.iter().take(SUMMARY_LIMIT).enumerate() {
            // Writing into a String cannot fail.
            let _ = write_layer(&mut out, l, layer);
        }
        if self.layers.len() > SUMMARY_LIMIT {
            out.push_str("...\n");
        }
        out
    }
}

fn write_layer(out: &mut String, index: usize, layer: &DenseLayer) -> fmt::Result {
    let input = layer.input_size();
    let shown = input.min(SUMMARY_LIMIT);
    let more = if input > SUMMARY_LIMIT { " ..." } else { "" };

    writeln!(
        out,
        "Layer: {} Input size: {} Output size: {}\n",
        index + 1,
        input,
        layer.output_size()
    )?;

    for i in 0..layer.output_size().min(SUMMARY_LIMIT) {
        let row = &layer.weights()[i * input..i * input + shown];
        let grad_row = &layer.weight_grads()[i * input..i * input + shown];

        writeln!(out, "  Neuron {}:", i + 1)?;
        writeln!(out, "             Weights:  [{}{} ]", spaced(row), more)?;
        writeln!(out, "                Bias:  {:.6}", layer.biases()[i])?;
        writeln!(out, "    Weight gradients:  [{}{} ]", spaced(grad_row), more)?;
        writeln!(out, "       Bias gradient:  {:.6}", layer.bias_grads()[i])?;
        writeln!(out, "                 Sum:  {:.6}", layer.sums()[i])?;
        writeln!(out, "          Activation:  {:.6}\n", layer.activations()[i])?;
    }
    if layer.output_size() > SUMMARY_LIMIT {
        writeln!(out, "  ...\n")?;
    }

    writeln!(out, "  Activation function: {}", layer.activation())?;
    writeln!(out, "  Number of weights:   {}", layer.weights().len())?;
    writeln!(out, "  Number of biases:    {}\n", layer.biases().len())
}

fn spaced(values: &[f32]) -> String {
    values.iter().map(|v| format!(" {:.6}", v)).collect()
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizers::OptimizerKind;
    use approx::assert_relative_eq;

    fn two_layer(activation: Activation) -> Network {
        let mut net = Network::new(2).unwrap();
        net.push_layer(
            DenseLayer::from_parameters(2, 2, vec![0.1, 0.2, 0.3, 0.4], vec![0.0, 0.0], Activation::Relu)
                .unwrap(),
        )
        .unwrap();
        net.push_layer(
            DenseLayer::from_parameters(2, 2, vec![0.5, -0.5, 0.25, 0.75], vec![0.1, -0.1], activation)
                .unwrap(),
        )
        .unwrap();
        net
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            Network::new(0),
            Err(NetworkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_not_ready_until_full() {
        let mut rng = SimpleRng::new(1);
        let mut net = Network::new(2).unwrap();
        net.add_layer(3, 2, Activation::Relu, &mut rng).unwrap();

        assert!(!net.is_ready());
        assert!(matches!(
            net.forward(&[1.0, 2.0, 3.0]),
            Err(NetworkError::NotReady {
                declared: 2,
                initialized: 1
            })
        ));
        assert!(net.zero_grads().is_err());
        assert!(net
            .setup_optimizer(OptimizerConfig::new(OptimizerKind::Sgd, 0.01))
            .is_err());
    }

    #[test]
    fn test_add_beyond_capacity() {
        let mut rng = SimpleRng::new(1);
        let mut net = Network::new(1).unwrap();
        net.add_layer(2, 2, Activation::Linear, &mut rng).unwrap();
        assert!(matches!(
            net.add_layer(2, 2, Activation::Linear, &mut rng),
            Err(NetworkError::AlreadyInitialized { capacity: 1 })
        ));
    }

    #[test]
    fn test_add_rejects_unchained_width() {
        let mut rng = SimpleRng::new(1);
        let mut net = Network::new(2).unwrap();
        net.add_layer(4, 3, Activation::Relu, &mut rng).unwrap();
        assert!(matches!(
            net.add_layer(2, 1, Activation::Sigmoid, &mut rng),
            Err(NetworkError::ShapeMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert_eq!(net.len(), 1);
    }

    #[test]
    fn test_forward_chains_layers() {
        let mut net = two_layer(Activation::Linear);
        let out = net.forward(&[1.0, 2.0]).unwrap().to_vec();

        // hidden: relu([0.5, 1.1]); output: [0.5*0.5 - 0.5*1.1 + 0.1, 0.25*0.5 + 0.75*1.1 - 0.1]
        assert_relative_eq!(out[0], -0.2, epsilon = 1e-6);
        assert_relative_eq!(out[1], 0.85, epsilon = 1e-6);
        assert_eq!(net.output().unwrap(), out.as_slice());
    }

    #[test]
    fn test_forward_rejects_wrong_input() {
        let mut net = two_layer(Activation::Linear);
        assert!(net.forward(&[1.0]).is_err());
    }

    #[test]
    fn test_loss_requires_configuration() {
        let mut net = two_layer(Activation::Softmax);
        net.forward(&[1.0, 2.0]).unwrap();
        assert!(matches!(
            net.compute_loss(&[1.0, 0.0]),
            Err(NetworkError::LossNotConfigured)
        ));
        assert!(matches!(
            net.backward(&[1.0, 2.0], &[1.0, 0.0]),
            Err(NetworkError::LossNotConfigured)
        ));

        net.setup_loss(Loss::CategoricalCrossEntropy);
        assert!(net.compute_loss(&[1.0, 0.0]).unwrap() > 0.0);
        assert!(matches!(
            net.compute_loss(&[1.0]),
            Err(NetworkError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_unsupported_output_pairing() {
        let mut net = two_layer(Activation::Softmax);
        net.setup_loss(Loss::MeanSquaredError);
        net.forward(&[1.0, 2.0]).unwrap();

        let result = net.backward(&[1.0, 2.0], &[1.0, 0.0]);
        assert!(matches!(
            result,
            Err(NetworkError::UnsupportedCombination {
                loss: "MeanSquaredError",
                activation: "Softmax"
            })
        ));
        assert!(net.layers().iter().all(|l| l.weight_grads().iter().all(|&g| g == 0.0)));
    }

    #[test]
    fn test_bce_requires_sigmoid_output() {
        let mut net = two_layer(Activation::Linear);
        net.setup_loss(Loss::BinaryCrossEntropy);
        net.forward(&[1.0, 2.0]).unwrap();
        assert!(net.backward(&[1.0, 2.0], &[1.0, 0.0]).is_err());
    }

    #[test]
    fn test_update_requires_optimizer() {
        let mut net = two_layer(Activation::Linear);
        assert!(matches!(
            net.update_weights(),
            Err(NetworkError::OptimizerNotConfigured)
        ));
    }

    #[test]
    fn test_sgd_update_follows_gradients() {
        let mut net = two_layer(Activation::Linear);
        net.setup_loss(Loss::MeanSquaredError);
        net.setup_optimizer(OptimizerConfig::new(OptimizerKind::Sgd, 0.1))
            .unwrap();

        net.forward(&[1.0, 2.0]).unwrap();
        net.backward(&[1.0, 2.0], &[0.0, 0.0]).unwrap();

        let before = net.layer(1).unwrap().weights().to_vec();
        let grads = net.layer(1).unwrap().weight_grads().to_vec();
        net.update_weights().unwrap();

        for ((after, b), g) in net.layer(1).unwrap().weights().iter().zip(&before).zip(&grads) {
            assert_relative_eq!(*after, b - 0.1 * g, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_counts() {
        let net = two_layer(Activation::Linear);
        assert_eq!(net.num_weights(), 8);
        assert_eq!(net.num_biases(), 4);
        assert_eq!(net.parameter_count(), 12);
        assert_eq!(net.input_size(), Some(2));
        assert_eq!(net.output_size(), Some(2));
    }

    #[test]
    fn test_summary() {
        let net = two_layer(Activation::Sigmoid);
        let summary = net.summary();
        assert!(summary.contains("Layer: 1 Input size: 2 Output size: 2"));
        assert!(summary.contains("Activation function: ReLU"));
        assert!(summary.contains("Activation function: Sigmoid"));
        assert!(summary.contains("Number of weights:   4"));
        assert_eq!(net.to_string(), summary);

        let partial = Network::new(3).unwrap();
        assert!(partial.summary().starts_with("Network not ready"));
    }

    #[test]
    fn test_summary_truncates_wide_layers() {
        let mut rng = SimpleRng::new(3);
        let mut net = Network::new(1).unwrap();
        net.add_layer(12, 11, Activation::Linear, &mut rng).unwrap();
        let summary = net.summary();

        assert!(summary.contains("Neuron 10:"));
        assert!(!summary.contains("Neuron 11:"));
        assert!(summary.contains(" ... ]"));
    }
}
