//! Architecture configuration structures
//!
//! This module provides configuration structures for defining network architectures
//! via JSON configuration files. This enables architecture experimentation without code changes.

use crate::network::Network;
use crate::utils::{Activation, SimpleRng};
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Configuration for a single layer in the network.
///
/// Only dense layers exist. `activation` is one of "linear", "relu",
/// "sigmoid" or "softmax"; the capitalized display names are accepted too.
/// Unknown keys such as a legacy `layer_type` are ignored.
///
/// # Example
///
/// ```json
/// {
///   "input_size": 784,
///   "output_size": 16,
///   "activation": "relu"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LayerConfig {
    /// Input width of the layer
    pub input_size: usize,

    /// Output width (number of neurons)
    pub output_size: usize,

    /// Activation applied after the affine transform
    pub activation: Activation,
}

impl LayerConfig {
    pub fn dense(input_size: usize, output_size: usize, activation: Activation) -> Self {
        Self {
            input_size,
            output_size,
            activation,
        }
    }
}

/// Configuration for the entire network architecture.
///
/// Layers are applied in the order they appear in the configuration.
///
/// # Example
///
/// ```json
/// {
///   "layers": [
///     { "input_size": 784, "output_size": 16, "activation": "relu" },
///     { "input_size": 16, "output_size": 16, "activation": "relu" },
///     { "input_size": 16, "output_size": 10, "activation": "softmax" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureConfig {
    /// Sequence of layer configurations defining the network structure
    pub layers: Vec<LayerConfig>,
}

impl ArchitectureConfig {
    /// The three-layer MNIST classifier: 784 → 16 → 16 → 10, ReLU/ReLU/Softmax.
    pub fn mnist_default() -> Self {
        Self {
            layers: vec![
                LayerConfig::dense(784, 16, Activation::Relu),
                LayerConfig::dense(16, 16, Activation::Relu),
                LayerConfig::dense(16, 10, Activation::Softmax),
            ],
        }
    }
}

/// Loads an architecture configuration from a JSON file.
///
/// Reads the file at `path` and deserializes its JSON contents into an `ArchitectureConfig`.
/// Performs validation on the layer list and the connections between layers.
///
/// # Returns
///
/// `Ok(ArchitectureConfig)` on success, or an error if the file cannot be read, the JSON is
/// invalid, or the layers do not form a valid network.
///
/// # Examples
///
/// ```no_run
/// use feedforward::architecture::load_architecture;
///
/// let arch = load_architecture("config/architectures/mnist_dense.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture<P: AsRef<Path>>(
    path: P,
) -> Result<ArchitectureConfig, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let config: ArchitectureConfig = serde_json::from_str(&contents)?;
    validate_architecture(&config)?;
    Ok(config)
}

fn invalid(message: String) -> Box<dyn Error> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// Validates the architecture configuration.
///
/// # Errors
///
/// Returns an error if validation fails with a descriptive message.
fn validate_architecture(config: &ArchitectureConfig) -> Result<(), Box<dyn Error>> {
    if config.layers.is_empty() {
        return Err(invalid("Architecture must have at least one layer".to_string()));
    }

    for (i, layer) in config.layers.iter().enumerate() {
        validate_layer(layer, i)?;
    }

    // Output of layer i must match input of layer i+1
    for (i, pair) in config.layers.windows(2).enumerate() {
        let (current, next) = (&pair[0], &pair[1]);
        if current.output_size != next.input_size {
            return Err(invalid(format!(
                "Layer connection mismatch: Layer {} output size ({}) does not match Layer {} input size ({})",
                i,
                current.output_size,
                i + 1,
                next.input_size
            )));
        }
    }

    Ok(())
}

/// Validates a single layer configuration.
fn validate_layer(layer: &LayerConfig, index: usize) -> Result<(), Box<dyn Error>> {
    if layer.input_size == 0 {
        return Err(invalid(format!("Layer {}: input_size must be positive", index)));
    }
    if layer.output_size == 0 {
        return Err(invalid(format!("Layer {}: output_size must be positive", index)));
    }
    Ok(())
}

/// Builds a network from an architecture configuration.
///
/// Each layer is initialized from `rng`, so the same seed yields the same
/// weights. The returned network has no loss or optimizer configured.
///
/// # Errors
///
/// Returns an error if a layer configuration is invalid or if layer construction fails.
///
/// # Examples
///
/// ```
/// use feedforward::architecture::{build_network, ArchitectureConfig};
/// use feedforward::utils::SimpleRng;
///
/// let config = ArchitectureConfig::mnist_default();
/// let mut rng = SimpleRng::new(42);
/// let network = build_network(&config, &mut rng).unwrap();
/// assert!(network.is_ready());
/// assert_eq!(network.output_size(), Some(10));
/// ```
pub fn build_network(
    config: &ArchitectureConfig,
    rng: &mut SimpleRng,
) -> Result<Network, Box<dyn Error>> {
    validate_architecture(config)?;

    let mut network = Network::new(config.layers.len())?;
    for layer in &config.layers {
        network.add_layer(layer.input_size, layer.output_size, layer.activation, rng)?;
    }
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn layer(input_size: usize, output_size: usize, activation: Activation) -> LayerConfig {
        LayerConfig::dense(input_size, output_size, activation)
    }

    fn write_json(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_validate_dense_layer() {
        assert!(validate_layer(&layer(784, 16, Activation::Relu), 0).is_ok());
        assert!(validate_layer(&layer(16, 10, Activation::Softmax), 0).is_ok());
    }

    #[test]
    fn test_validate_zero_width() {
        assert!(validate_layer(&layer(0, 16, Activation::Relu), 0).is_err());
        assert!(validate_layer(&layer(16, 0, Activation::Relu), 0).is_err());
    }

    #[test]
    fn test_load_rejects_unknown_activation() {
        let file = write_json(
            r#"{"layers": [{ "input_size": 4, "output_size": 4, "activation": "tanh" }]}"#,
        );
        let err = load_architecture(file.path()).unwrap_err();
        assert!(err.to_string().contains("tanh"));
    }

    #[test]
    fn test_load_accepts_display_case_activations() {
        let file = write_json(
            r#"{
  "layers": [
    { "input_size": 4, "output_size": 3, "activation": "ReLU" },
    { "input_size": 3, "output_size": 2, "activation": "Softmax" }
  ]
}"#,
        );
        let config = load_architecture(file.path()).unwrap();
        assert_eq!(config.layers[0].activation, Activation::Relu);
        assert_eq!(config.layers[1].activation, Activation::Softmax);
    }

    #[test]
    fn test_validate_empty_architecture() {
        let config = ArchitectureConfig { layers: vec![] };
        assert!(validate_architecture(&config).is_err());
    }

    #[test]
    fn test_validate_connection_mismatch() {
        let config = ArchitectureConfig {
            layers: vec![layer(4, 8, Activation::Relu), layer(6, 2, Activation::Sigmoid)],
        };
        let err = validate_architecture(&config).unwrap_err();
        assert!(err.to_string().contains("connection mismatch"));
    }

    #[test]
    fn test_load_architecture() {
        let file = write_json(
            r#"{
  "layers": [
    { "input_size": 784, "output_size": 16, "activation": "relu" },
    { "layer_type": "dense", "input_size": 16, "output_size": 10, "activation": "softmax" }
  ]
}"#,
        );

        let config = load_architecture(file.path()).unwrap();
        assert_eq!(config.layers.len(), 2);
        assert_eq!(config.layers[0].input_size, 784);
        assert_eq!(config.layers[0].activation, Activation::Relu);
        assert_eq!(config.layers[1].output_size, 10);
        assert_eq!(config.layers[1].activation, Activation::Softmax);
    }

    #[test]
    fn test_build_network() {
        let config = ArchitectureConfig {
            layers: vec![layer(3, 5, Activation::Relu), layer(5, 2, Activation::Sigmoid)],
        };
        let mut rng = SimpleRng::new(42);
        let network = build_network(&config, &mut rng).unwrap();

        assert!(network.is_ready());
        assert_eq!(network.len(), 2);
        assert_eq!(network.layer(0).unwrap().activation(), Activation::Relu);
        assert_eq!(network.layer(1).unwrap().activation(), Activation::Sigmoid);
        assert_eq!(network.parameter_count(), 3 * 5 + 5 + 5 * 2 + 2);
    }

    #[test]
    fn test_build_network_is_seeded() {
        let config = ArchitectureConfig::mnist_default();
        let a = build_network(&config, &mut SimpleRng::new(9)).unwrap();
        let b = build_network(&config, &mut SimpleRng::new(9)).unwrap();
        assert_eq!(a.layer(2).unwrap().weights(), b.layer(2).unwrap().weights());
    }

    #[test]
    fn test_build_network_rejects_mismatch() {
        let config = ArchitectureConfig {
            layers: vec![layer(3, 5, Activation::Relu), layer(4, 2, Activation::Sigmoid)],
        };
        assert!(build_network(&config, &mut SimpleRng::new(1)).is_err());
    }
}
