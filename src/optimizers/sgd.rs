//! Stochastic Gradient Descent (SGD) optimizer implementation
//!
//! This module provides a vanilla SGD optimizer that performs the basic
//! gradient descent update: `parameter = parameter - learning_rate * gradient`

use crate::error::Result;
use crate::optimizers::{check_update, validate_learning_rate, Optimizer, OptimizerKind, ParamSlot};

/// Stochastic Gradient Descent optimizer.
///
/// Implements the basic gradient descent update rule without momentum or
/// adaptive learning rates:
///
/// `w = w - η * ∇L/∂w`
///
/// SGD keeps no per-parameter state, so it never allocates a cache and the
/// slot passed to [`Optimizer::update`] is ignored.
///
/// # Example
///
/// ```
/// use feedforward::optimizers::{Optimizer, ParamSlot, SGD};
///
/// let mut optimizer = SGD::new(0.1).unwrap();
/// let mut params = vec![1.0, 2.0, 3.0];
/// optimizer
///     .update(ParamSlot::weights(0), &mut params, &[0.1, 0.2, 0.3])
///     .unwrap();
/// assert!((params[0] - 0.99).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct SGD {
    learning_rate: f32,
}

impl SGD {
    /// Creates a new SGD optimizer with the specified learning rate.
    ///
    /// # Errors
    ///
    /// Fails if the learning rate lies outside (0, 0.1].
    pub fn new(learning_rate: f32) -> Result<Self> {
        validate_learning_rate(learning_rate)?;
        Ok(Self { learning_rate })
    }
}

impl Optimizer for SGD {
    fn kind(&self) -> OptimizerKind {
        OptimizerKind::Sgd
    }

    fn update(&mut self, _slot: ParamSlot, parameters: &mut [f32], gradients: &[f32]) -> Result<()> {
        check_update(parameters, gradients)?;

        for (param, grad) in parameters.iter_mut().zip(gradients) {
            *param -= self.learning_rate * grad;
        }
        Ok(())
    }

    fn reset(&mut self) {
        // Vanilla SGD has no state to reset
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

    #[test]
    fn test_sgd_new() {
        let optimizer = SGD::new(0.01).unwrap();
        assert_eq!(optimizer.learning_rate(), 0.01);
    }

    #[test]
    fn test_sgd_rejects_out_of_range_learning_rate() {
        assert!(SGD::new(0.0).is_err());
        assert!(SGD::new(0.5).is_err());
    }

    #[test]
    fn test_sgd_multiple_updates() {
        let mut optimizer = SGD::new(0.01).unwrap();
        let mut params = vec![1.0, 1.0];
        let grads = vec![1.0, -1.0];

        optimizer.update(ParamSlot::weights(0), &mut params, &grads).unwrap();
        assert!((params[0] - 0.99).abs() < 1e-6);
        assert!((params[1] - 1.01).abs() < 1e-6);

        optimizer.update(ParamSlot::weights(0), &mut params, &grads).unwrap();
        assert!((params[0] - 0.98).abs() < 1e-6);
        assert!((params[1] - 1.02).abs() < 1e-6);
    }

    #[test]
    fn test_sgd_learning_rate_update() {
        let mut optimizer = SGD::new(0.1).unwrap();
        optimizer.set_learning_rate(0.01).unwrap();
        assert_eq!(optimizer.learning_rate(), 0.01);
        assert!(optimizer.set_learning_rate(2.0).is_err());
        assert_eq!(optimizer.learning_rate(), 0.01);
    }

    #[test]
    fn test_sgd_mismatched_lengths() {
        let mut optimizer = SGD::new(0.01).unwrap();
        let mut params = vec![1.0, 2.0];
        let result = optimizer.update(ParamSlot::biases(0), &mut params, &[0.1, 0.2, 0.3]);

        assert!(matches!(result, Err(NetworkError::ShapeMismatch { .. })));
        assert_eq!(params, vec![1.0, 2.0]);
    }

    #[test]
    fn test_sgd_negative_gradients() {
        let mut optimizer = SGD::new(0.1).unwrap();
        let mut params = vec![1.0, 2.0];
        optimizer
            .update(ParamSlot::weights(3), &mut params, &[-0.5, -1.0])
            .unwrap();

        assert!((params[0] - 1.05).abs() < 1e-6);
        assert!((params[1] - 2.1).abs() < 1e-6);
    }
}
