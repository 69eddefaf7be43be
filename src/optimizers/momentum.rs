//! Momentum optimizer implementation
//!
//! Keeps an exponential moving average of each parameter's gradient and steps
//! along that average instead of the raw gradient.

use crate::error::Result;
use crate::optimizers::{
    check_update, validate_beta, validate_learning_rate, Optimizer, OptimizerCache, OptimizerKind,
    ParamShape, ParamSlot,
};

/// Gradient descent with momentum.
///
/// ```text
/// m = β1 * m + (1 - β1) * gradient
/// parameter = parameter - α * m
/// ```
#[derive(Debug, Clone)]
pub struct Momentum {
    learning_rate: f32,
    beta1: f32,
    /// Moving average of gradients, one region per parameter slot
    momentum: OptimizerCache,
}

impl Momentum {
    /// Creates a momentum optimizer.
    ///
    /// # Errors
    ///
    /// Fails if the learning rate lies outside (0, 0.1] or `beta1` outside [0, 1).
    pub fn new(learning_rate: f32, beta1: f32) -> Result<Self> {
        validate_learning_rate(learning_rate)?;
        validate_beta("beta1", beta1)?;
        Ok(Self {
            learning_rate,
            beta1,
            momentum: OptimizerCache::default(),
        })
    }

    pub fn cache(&self) -> &OptimizerCache {
        &self.momentum
    }
}

impl Optimizer for Momentum {
    fn kind(&self) -> OptimizerKind {
        OptimizerKind::Momentum
    }

    fn allocate(&mut self, shapes: &[ParamShape]) {
        self.momentum = OptimizerCache::new(shapes);
    }

    fn update(&mut self, slot: ParamSlot, parameters: &mut [f32], gradients: &[f32]) -> Result<()> {
        check_update(parameters, gradients)?;
        let momentum = self.momentum.region_mut(slot, parameters.len())?;

        for ((param, &grad), m) in parameters.iter_mut().zip(gradients).zip(momentum.iter_mut()) {
            *m = *m * self.beta1 + (1.0 - self.beta1) * grad;
            *param -= self.learning_rate * *m;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.momentum.clear();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;

    fn allocated(lr: f32, beta1: f32) -> Momentum {
        let mut optimizer = Momentum::new(lr, beta1).unwrap();
        optimizer.allocate(&[ParamShape {
            weights: 2,
            biases: 1,
        }]);
        optimizer
    }

    #[test]
    fn test_first_step_uses_damped_gradient() {
        let mut optimizer = allocated(0.1, 0.9);
        let mut params = vec![1.0, 1.0];
        optimizer
            .update(ParamSlot::weights(0), &mut params, &[1.0, -2.0])
            .unwrap();

        // m = 0.1 * g, w -= 0.1 * m
        assert!((params[0] - (1.0 - 0.01)).abs() < 1e-6);
        assert!((params[1] - (1.0 + 0.02)).abs() < 1e-6);
    }

    #[test]
    fn test_velocity_builds_up() {
        let mut optimizer = allocated(0.1, 0.9);
        let mut params = vec![0.0, 0.0];
        let mut steps = Vec::new();
        for _ in 0..3 {
            let before = params[0];
            optimizer
                .update(ParamSlot::weights(0), &mut params, &[1.0, 1.0])
                .unwrap();
            steps.push(before - params[0]);
        }
        assert!(steps[1] > steps[0]);
        assert!(steps[2] > steps[1]);
    }

    #[test]
    fn test_bias_region_is_separate() {
        let mut optimizer = allocated(0.1, 0.5);
        let mut weights = vec![0.0, 0.0];
        let mut biases = vec![0.0];
        optimizer
            .update(ParamSlot::weights(0), &mut weights, &[1.0, 1.0])
            .unwrap();
        optimizer
            .update(ParamSlot::biases(0), &mut biases, &[1.0])
            .unwrap();

        // A fresh region takes the same first step as the weights did.
        assert!((biases[0] - weights[0]).abs() < 1e-7);
    }

    #[test]
    fn test_unallocated_slot_is_rejected() {
        let mut optimizer = Momentum::new(0.01, 0.9).unwrap();
        let mut params = vec![1.0];
        let result = optimizer.update(ParamSlot::weights(0), &mut params, &[1.0]);
        assert!(matches!(result, Err(NetworkError::InvalidArgument(_))));
        assert_eq!(params, vec![1.0]);
    }

    #[test]
    fn test_reset_clears_velocity() {
        let mut optimizer = allocated(0.1, 0.9);
        let mut params = vec![0.0, 0.0];
        optimizer
            .update(ParamSlot::weights(0), &mut params, &[1.0, 1.0])
            .unwrap();
        optimizer.reset();
        assert!(optimizer
            .cache()
            .region(ParamSlot::weights(0))
            .unwrap()
            .iter()
            .all(|&m| m == 0.0));
    }
}
