//! Adagrad optimizer implementation

use crate::error::Result;
use crate::optimizers::{
    check_update, validate_learning_rate, Optimizer, OptimizerCache, OptimizerKind, ParamShape,
    ParamSlot, EPSILON,
};

/// Adaptive gradient optimizer.
///
/// Accumulates every squared gradient it has seen and scales each step by the
/// inverse root of that sum, so frequently-updated parameters slow down:
///
/// ```text
/// v = v + gradient²
/// parameter = parameter - α * gradient / (√v + ε)
/// ```
#[derive(Debug, Clone)]
pub struct Adagrad {
    learning_rate: f32,
    squared_grads: OptimizerCache,
}

impl Adagrad {
    pub fn new(learning_rate: f32) -> Result<Self> {
        validate_learning_rate(learning_rate)?;
        Ok(Self {
            learning_rate,
            squared_grads: OptimizerCache::default(),
        })
    }

    pub fn cache(&self) -> &OptimizerCache {
        &self.squared_grads
    }
}

impl Optimizer for Adagrad {
    fn kind(&self) -> OptimizerKind {
        OptimizerKind::Adagrad
    }

    fn allocate(&mut self, shapes: &[ParamShape]) {
        self.squared_grads = OptimizerCache::new(shapes);
    }

    fn update(&mut self, slot: ParamSlot, parameters: &mut [f32], gradients: &[f32]) -> Result<()> {
        check_update(parameters, gradients)?;
        let squared = self.squared_grads.region_mut(slot, parameters.len())?;

        for ((param, &grad), v) in parameters.iter_mut().zip(gradients).zip(squared.iter_mut()) {
            *v += grad * grad;
            *param -= self.learning_rate * grad / (v.sqrt() + EPSILON);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.squared_grads.clear();
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

    fn allocated() -> Adagrad {
        let mut optimizer = Adagrad::new(0.1).unwrap();
        optimizer.allocate(&[ParamShape {
            weights: 1,
            biases: 1,
        }]);
        optimizer
    }

    #[test]
    fn test_first_step_is_sign_times_lr() {
        let mut optimizer = allocated();
        let mut params = vec![1.0];
        optimizer
            .update(ParamSlot::weights(0), &mut params, &[4.0])
            .unwrap();
        assert!((params[0] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_steps_shrink_under_constant_gradient() {
        let mut optimizer = allocated();
        let mut params = vec![0.0];
        let mut previous = f32::INFINITY;
        for k in 1..=4 {
            let before = params[0];
            optimizer
                .update(ParamSlot::biases(0), &mut params, &[1.0])
                .unwrap();
            let step = before - params[0];
            // After k steps the accumulator is k, so the step is lr / sqrt(k).
            assert!((step - 0.1 / (k as f32).sqrt()).abs() < 1e-6);
            assert!(step < previous);
            previous = step;
        }
    }

    #[test]
    fn test_accumulator_never_decays() {
        let mut optimizer = allocated();
        let mut params = vec![0.0];
        optimizer
            .update(ParamSlot::weights(0), &mut params, &[2.0])
            .unwrap();
        optimizer
            .update(ParamSlot::weights(0), &mut params, &[1.0])
            .unwrap();
        let v = optimizer.cache().region(ParamSlot::weights(0)).unwrap()[0];
        assert!((v - 5.0).abs() < 1e-6);
    }
}
