//! Optimizer abstractions for network parameter updates
//!
//! This module provides the Optimizer trait and the five update rules the
//! engine supports, together with the per-layer accumulator cache used by the
//! stateful ones.
//!
//! # Overview
//!
//! The network calls the optimizer once per layer for its weights and once for
//! its biases. Each call names a [`ParamSlot`] (layer index + region), which
//! stateful optimizers use to find the accumulator region belonging to that
//! tensor inside their [`OptimizerCache`].
//!
//! # Available Optimizers
//!
//! - SGD: Vanilla stochastic gradient descent (stateless)
//! - Momentum: exponential moving average of the gradient
//! - Adagrad: ever-growing sum of squared gradients
//! - RMSProp: exponential moving average of squared gradients
//! - Adam: both moving averages with bias correction
//!
//! # Example
//!
//! ```
//! use feedforward::optimizers::{Optimizer, OptimizerConfig, OptimizerKind, ParamShape, ParamSlot};
//!
//! let mut optimizer = OptimizerConfig::new(OptimizerKind::Adam, 0.01).build().unwrap();
//! optimizer.allocate(&[ParamShape { weights: 3, biases: 1 }]);
//!
//! let mut weights = vec![1.0, 2.0, 3.0];
//! optimizer
//!     .update(ParamSlot::weights(0), &mut weights, &[0.1, 0.2, 0.3])
//!     .unwrap();
//! assert!(weights[0] < 1.0);
//! ```

pub mod adagrad;
pub mod adam;
pub mod cache;
pub mod momentum;
pub mod rmsprop;
pub mod sgd;

pub use adagrad::Adagrad;
pub use adam::Adam;
pub use cache::OptimizerCache;
pub use momentum::Momentum;
pub use rmsprop::RMSProp;
pub use sgd::SGD;

use std::fmt;

use serde::Deserialize;
use tracing::warn;

use crate::error::{NetworkError, Result};

/// Added to the root of the squared-gradient estimate before dividing.
pub const EPSILON: f32 = 1e-12;

/// Upper bound (inclusive) accepted for the learning rate.
pub const MAX_LEARNING_RATE: f32 = 0.1;

/// Which parameter tensor of a layer an update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamRegion {
    Weights,
    Biases,
}

/// Key of one parameter tensor: the layer index and its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamSlot {
    pub layer: usize,
    pub region: ParamRegion,
}

impl ParamSlot {
    pub fn weights(layer: usize) -> Self {
        Self {
            layer,
            region: ParamRegion::Weights,
        }
    }

    pub fn biases(layer: usize) -> Self {
        Self {
            layer,
            region: ParamRegion::Biases,
        }
    }
}

/// Parameter counts of one layer, used to size optimizer caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamShape {
    pub weights: usize,
    pub biases: usize,
}

/// Closed set of update rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    Momentum,
    Adagrad,
    RmsProp,
    Adam,
}

impl OptimizerKind {
    pub fn name(self) -> &'static str {
        match self {
            OptimizerKind::Sgd => "SGD",
            OptimizerKind::Momentum => "Momentum",
            OptimizerKind::Adagrad => "Adagrad",
            OptimizerKind::RmsProp => "RMSProp",
            OptimizerKind::Adam => "Adam",
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Core trait for parameter update rules.
///
/// Stateful optimizers keep one accumulator region per [`ParamSlot`]; the
/// regions are sized once by [`Optimizer::allocate`] and reused on every
/// update. Updates validate their inputs and leave the parameters untouched
/// when they fail.
pub trait Optimizer: fmt::Debug {
    /// The rule this optimizer implements.
    fn kind(&self) -> OptimizerKind;

    /// Size the accumulator cache for a network with the given layer shapes.
    ///
    /// Stateless optimizers ignore this. Calling it again discards any
    /// accumulated state.
    fn allocate(&mut self, _shapes: &[ParamShape]) {}

    /// Apply one update step to `parameters` in place.
    ///
    /// # Errors
    ///
    /// Fails when the buffers are empty or differ in length, or when the slot
    /// has no matching cache region.
    fn update(&mut self, slot: ParamSlot, parameters: &mut [f32], gradients: &[f32])
        -> Result<()>;

    /// Clear accumulated statistics and step counters, keeping the allocation.
    fn reset(&mut self);

    /// Get the learning rate for this optimizer.
    fn learning_rate(&self) -> f32;

    /// Set the learning rate, validated to (0, 0.1].
    fn set_learning_rate(&mut self, lr: f32) -> Result<()>;
}

/// Hyperparameters needed to build an optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub kind: OptimizerKind,
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
}

impl OptimizerConfig {
    pub const DEFAULT_BETA1: f32 = 0.9;
    pub const DEFAULT_BETA2: f32 = 0.999;

    /// Config with the default decay rates.
    pub fn new(kind: OptimizerKind, learning_rate: f32) -> Self {
        Self {
            kind,
            learning_rate,
            beta1: Self::DEFAULT_BETA1,
            beta2: Self::DEFAULT_BETA2,
        }
    }

    pub fn with_beta1(mut self, beta1: f32) -> Self {
        self.beta1 = beta1;
        self
    }

    pub fn with_beta2(mut self, beta2: f32) -> Self {
        self.beta2 = beta2;
        self
    }

    /// Checks the learning rate against (0, 0.1] and both betas against [0, 1).
    pub fn validate(&self) -> Result<()> {
        validate_learning_rate(self.learning_rate)?;
        validate_beta("beta1", self.beta1)?;
        validate_beta("beta2", self.beta2)
    }

    /// Builds the optimizer described by this config.
    pub fn build(&self) -> Result<Box<dyn Optimizer>> {
        self.validate()?;
        let optimizer: Box<dyn Optimizer> = match self.kind {
            OptimizerKind::Sgd => Box::new(SGD::new(self.learning_rate)?),
            OptimizerKind::Momentum => Box::new(Momentum::new(self.learning_rate, self.beta1)?),
            OptimizerKind::Adagrad => Box::new(Adagrad::new(self.learning_rate)?),
            OptimizerKind::RmsProp => Box::new(RMSProp::new(self.learning_rate, self.beta2)?),
            OptimizerKind::Adam => {
                Box::new(Adam::new(self.learning_rate, self.beta1, self.beta2)?)
            }
        };
        Ok(optimizer)
    }
}

/// Rejects learning rates outside (0, 0.1].
pub fn validate_learning_rate(lr: f32) -> Result<()> {
    if !(lr > 0.0 && lr <= MAX_LEARNING_RATE) {
        warn!("learning rate {} outside (0, {}]", lr, MAX_LEARNING_RATE);
        return Err(NetworkError::InvalidHyperparameter {
            name: "learning_rate",
            value: lr,
        });
    }
    Ok(())
}

/// Rejects decay rates outside [0, 1).
pub fn validate_beta(name: &'static str, value: f32) -> Result<()> {
    if !(0.0..1.0).contains(&value) {
        warn!("{} = {} outside [0, 1)", name, value);
        return Err(NetworkError::InvalidHyperparameter { name, value });
    }
    Ok(())
}

/// Shared argument check for every update rule.
pub(crate) fn check_update(parameters: &[f32], gradients: &[f32]) -> Result<()> {
    if parameters.is_empty() {
        return Err(NetworkError::InvalidArgument(
            "parameter buffer must not be empty".to_string(),
        ));
    }
    if parameters.len() != gradients.len() {
        return Err(NetworkError::ShapeMismatch {
            expected: parameters.len(),
            actual: gradients.len(),
        });
    }
    Ok(())
}
