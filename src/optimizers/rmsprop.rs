//! RMSProp optimizer implementation
//!
//! Same step shape as Adagrad, but the squared-gradient statistic is an
//! exponential moving average, so old gradients are forgotten.

use crate::error::Result;
use crate::optimizers::{
    check_update, validate_beta, validate_learning_rate, Optimizer, OptimizerCache, OptimizerKind,
    ParamShape, ParamSlot, EPSILON,
};

/// Root-mean-square propagation.
///
/// ```text
/// v = β2 * v + (1 - β2) * gradient²
/// parameter = parameter - α * gradient / (√v + ε)
/// ```
#[derive(Debug, Clone)]
pub struct RMSProp {
    learning_rate: f32,
    beta2: f32,
    squared_grads: OptimizerCache,
}

impl RMSProp {
    pub fn new(learning_rate: f32, beta2: f32) -> Result<Self> {
        validate_learning_rate(learning_rate)?;
        validate_beta("beta2", beta2)?;
        Ok(Self {
            learning_rate,
            beta2,
            squared_grads: OptimizerCache::default(),
        })
    }

    pub fn cache(&self) -> &OptimizerCache {
        &self.squared_grads
    }
}

impl Optimizer for RMSProp {
    fn kind(&self) -> OptimizerKind {
        OptimizerKind::RmsProp
    }

    fn allocate(&mut self, shapes: &[ParamShape]) {
        self.squared_grads = OptimizerCache::new(shapes);
    }

    fn update(&mut self, slot: ParamSlot, parameters: &mut [f32], gradients: &[f32]) -> Result<()> {
        check_update(parameters, gradients)?;
        let squared = self.squared_grads.region_mut(slot, parameters.len())?;

        for ((param, &grad), v) in parameters.iter_mut().zip(gradients).zip(squared.iter_mut()) {
            *v = *v * self.beta2 + (1.0 - self.beta2) * grad * grad;
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

    #[test]
    fn test_first_step() {
        let mut optimizer = RMSProp::new(0.01, 0.99).unwrap();
        optimizer.allocate(&[ParamShape {
            weights: 2,
            biases: 1,
        }]);
        let mut params = vec![1.0, 1.0];
        optimizer
            .update(ParamSlot::weights(0), &mut params, &[0.5, -0.5])
            .unwrap();

        // v = 0.01 * 0.25, step = 0.01 * 0.5 / 0.05 = 0.1
        assert!((params[0] - 0.9).abs() < 1e-5);
        assert!((params[1] - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_accumulator_decays() {
        let mut optimizer = RMSProp::new(0.01, 0.5).unwrap();
        optimizer.allocate(&[ParamShape {
            weights: 1,
            biases: 1,
        }]);
        let mut params = vec![0.0];
        optimizer
            .update(ParamSlot::biases(0), &mut params, &[2.0])
            .unwrap();
        optimizer
            .update(ParamSlot::biases(0), &mut params, &[0.0])
            .unwrap();

        let v = optimizer.cache().region(ParamSlot::biases(0)).unwrap()[0];
        assert!((v - 1.0).abs() < 1e-6); // 0.5 * (0.5 * 4)
    }
}
