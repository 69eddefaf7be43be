//! Adam (Adaptive Moment Estimation) optimizer implementation
//!
//! This module provides the Adam optimizer, which combines momentum and
//! adaptive learning rates with bias correction for improved convergence.

use crate::error::Result;
use crate::optimizers::{
    check_update, validate_beta, validate_learning_rate, Optimizer, OptimizerCache, OptimizerKind,
    ParamShape, ParamSlot, EPSILON,
};

/// Adam (Adaptive Moment Estimation) optimizer.
///
/// Adam combines ideas from momentum optimization and RMSprop to provide
/// adaptive learning rates for each parameter. It maintains two moving
/// averages for each parameter:
///
/// 1. First moment (mean) of gradients (momentum)
/// 2. Second moment (uncentered variance) of gradients (adaptive learning rate)
///
/// The update rule is:
///
/// ```text
/// m_t = β1 * m_{t-1} + (1 - β1) * gradient
/// v_t = β2 * v_{t-1} + (1 - β2) * gradient²
/// m_hat = m_t / (1 - β1^t)
/// v_hat = v_t / (1 - β2^t)
/// parameter = parameter - α * m_hat / (√v_hat + ε)
/// ```
///
/// The step counter `t` advances on every [`Optimizer::update`] call, not once
/// per sweep. A network with L layers therefore moves it by 2L per
/// `update_weights` (one call for weights, one for biases, per layer).
///
/// # Example
///
/// ```
/// use feedforward::optimizers::{Adam, Optimizer, ParamShape, ParamSlot};
///
/// let mut optimizer = Adam::new(0.001, 0.9, 0.999).unwrap();
/// optimizer.allocate(&[ParamShape { weights: 3, biases: 1 }]);
///
/// let mut weights = vec![1.0, 2.0, 3.0];
/// optimizer
///     .update(ParamSlot::weights(0), &mut weights, &[0.1, 0.2, 0.3])
///     .unwrap();
/// assert_eq!(optimizer.step(), 1);
/// ```
///
/// # Reference
///
/// Kingma, D. P., & Ba, J. (2014). Adam: A method for stochastic optimization.
/// arXiv preprint arXiv:1412.6980.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    /// First moment estimates (momentum)
    momentum: OptimizerCache,
    /// Second moment estimates (adaptive learning rate)
    squared_grads: OptimizerCache,
    /// Time step counter for bias correction
    t: u32,
}

impl Adam {
    /// Creates a new Adam optimizer with the specified hyperparameters.
    ///
    /// # Arguments
    ///
    /// * `learning_rate` - The step size for parameter updates, in (0, 0.1]
    /// * `beta1` - Exponential decay rate for first moment estimates, in [0, 1)
    /// * `beta2` - Exponential decay rate for second moment estimates, in [0, 1)
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32) -> Result<Self> {
        validate_learning_rate(learning_rate)?;
        validate_beta("beta1", beta1)?;
        validate_beta("beta2", beta2)?;
        Ok(Self {
            learning_rate,
            beta1,
            beta2,
            momentum: OptimizerCache::default(),
            squared_grads: OptimizerCache::default(),
            t: 0,
        })
    }

    /// Number of update calls since creation or the last reset.
    pub fn step(&self) -> u32 {
        self.t
    }

    pub fn momentum(&self) -> &OptimizerCache {
        &self.momentum
    }

    pub fn squared_grads(&self) -> &OptimizerCache {
        &self.squared_grads
    }
}

impl Optimizer for Adam {
    fn kind(&self) -> OptimizerKind {
        OptimizerKind::Adam
    }

    fn allocate(&mut self, shapes: &[ParamShape]) {
        self.momentum = OptimizerCache::new(shapes);
        self.squared_grads = OptimizerCache::new(shapes);
        self.t = 0;
    }

    fn update(&mut self, slot: ParamSlot, parameters: &mut [f32], gradients: &[f32]) -> Result<()> {
        check_update(parameters, gradients)?;
        let momentum = self.momentum.region_mut(slot, parameters.len())?;
        let squared = self.squared_grads.region_mut(slot, parameters.len())?;

        // Only count calls that actually apply a step.
        self.t += 1;
        let t = self.t as i32;
        let bias_correction1 = 1.0 - self.beta1.powi(t);
        let bias_correction2 = 1.0 - self.beta2.powi(t);

        for i in 0..parameters.len() {
            let grad = gradients[i];
            momentum[i] = self.beta1 * momentum[i] + (1.0 - self.beta1) * grad;
            squared[i] = self.beta2 * squared[i] + (1.0 - self.beta2) * grad * grad;

            let m_hat = momentum[i] / bias_correction1;
            let v_hat = squared[i] / bias_correction2;

            parameters[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + EPSILON);
        }
        Ok(())
    }

    /// Clears both moment estimates and the step counter.
    fn reset(&mut self) {
        self.momentum.clear();
        self.squared_grads.clear();
        self.t = 0;
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) -> Result<()> {
        validate_learning_rate(lr)?;
        self.learning_rate = lr;
        Ok(())
    }
}
