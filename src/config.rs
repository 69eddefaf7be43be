//! Configuration structures for training
//!
//! This module provides the training hyperparameters read by the trainer
//! binary: loss, optimizer and its hyperparameters, batching, epochs, the
//! held-out fraction and the accuracy needed before a snapshot is saved.

use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::optimizers::{OptimizerConfig, OptimizerKind};
use crate::utils::Loss;

/// Configuration for a training run.
///
/// Every field except `loss`, `optimizer` and `learning_rate` has a default,
/// matching the built-in MNIST setup.
///
/// # Example
///
/// ```json
/// {
///   "loss": "categorical_cross_entropy",
///   "optimizer": "adam",
///   "learning_rate": 0.001,
///   "beta1": 0.9,
///   "batch_size": 64,
///   "epochs": 100,
///   "test_fraction": 0.2,
///   "save_threshold": 93.0
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// "mse", "binary_cross_entropy" or "categorical_cross_entropy"
    pub loss: Loss,

    /// "sgd", "momentum", "adagrad", "rmsprop" or "adam"
    pub optimizer: OptimizerKind,

    /// Step size, in (0, 0.1]
    pub learning_rate: f32,

    /// First-moment decay for momentum and Adam (default 0.9)
    pub beta1: Option<f32>,

    /// Second-moment decay for RMSProp and Adam (default 0.999)
    pub beta2: Option<f32>,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_epochs")]
    pub epochs: usize,

    /// Fraction of the samples held out for evaluation, in [0, 1]
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f32,

    /// Seed for weight initialization; seeded from the clock when absent
    pub seed: Option<u64>,

    /// Epochs between loss reports
    #[serde(default = "default_log_every")]
    pub log_every: usize,

    /// Minimum test accuracy, in percent, for the model to be saved
    #[serde(default = "default_save_threshold")]
    pub save_threshold: f32,
}

fn default_batch_size() -> usize {
    64
}

fn default_epochs() -> usize {
    100
}

fn default_test_fraction() -> f32 {
    0.2
}

fn default_log_every() -> usize {
    10
}

fn default_save_threshold() -> f32 {
    93.0
}

impl TrainingConfig {
    /// Optimizer hyperparameters, with the default betas filled in.
    pub fn optimizer_config(&self) -> OptimizerConfig {
        let mut config = OptimizerConfig::new(self.optimizer, self.learning_rate);
        if let Some(beta1) = self.beta1 {
            config = config.with_beta1(beta1);
        }
        if let Some(beta2) = self.beta2 {
            config = config.with_beta2(beta2);
        }
        config
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            loss: Loss::CategoricalCrossEntropy,
            optimizer: OptimizerKind::Adam,
            learning_rate: 0.001,
            beta1: None,
            beta2: None,
            batch_size: default_batch_size(),
            epochs: default_epochs(),
            test_fraction: default_test_fraction(),
            seed: None,
            log_every: default_log_every(),
            save_threshold: default_save_threshold(),
        }
    }
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path` and deserializes its JSON contents into a `TrainingConfig`.
///
/// # Returns
///
/// `Ok(TrainingConfig)` on success, or an error if the file cannot be read, the JSON is
/// invalid, or a value is out of range.
///
/// # Examples
///
/// ```no_run
/// use feedforward::config::load_config;
///
/// let cfg = load_config("config/mnist_dense.json").unwrap();
/// assert!(cfg.batch_size > 0);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TrainingConfig, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn invalid(message: impl Into<String>) -> Box<dyn Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message.into(),
    ))
}

fn validate_config(config: &TrainingConfig) -> Result<(), Box<dyn Error>> {
    config
        .optimizer_config()
        .validate()
        .map_err(|e| invalid(e.to_string()))?;

    if config.batch_size == 0 {
        return Err(invalid("batch_size must be positive"));
    }

    if config.epochs == 0 {
        return Err(invalid("epochs must be positive"));
    }

    if !(0.0..=1.0).contains(&config.test_fraction) {
        return Err(invalid(format!(
            "test_fraction must be in [0, 1], got {}",
            config.test_fraction
        )));
    }

    if config.log_every == 0 {
        return Err(invalid("log_every must be positive"));
    }

    if !(0.0..=100.0).contains(&config.save_threshold) {
        return Err(invalid(format!(
            "save_threshold is a percentage, got {}",
            config.save_threshold
        )));
    }

    Ok(())
}
