//! Mini-batch gradient accumulation
//!
//! Gradients add up across [`Network::backward`] calls, so a batch is simply a
//! run of backward passes followed by one update. [`BatchAccumulator`] counts
//! pending samples and applies the update once `batch_size` have been seen;
//! whatever is left at the end of an epoch is applied by [`BatchAccumulator::flush`].

use tracing::{trace, warn};

use super::Network;
use crate::error::{NetworkError, Result};

#[derive(Debug, Clone)]
pub struct BatchAccumulator {
    batch_size: usize,
    pending: usize,
}

impl BatchAccumulator {
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            warn!("batch size must be positive");
            return Err(NetworkError::InvalidArgument(
                "batch size must be positive".to_string(),
            ));
        }
        Ok(Self {
            batch_size,
            pending: 0,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Samples whose gradients have been accumulated but not applied.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Forward, loss and backward for one sample; returns the sample loss.
    ///
    /// Applies the update as soon as a full batch is pending.
    pub fn accumulate(&mut self, net: &mut Network, input: &[f32], target: &[f32]) -> Result<f32> {
        net.forward(input)?;
        let loss = net.compute_loss(target)?;
        net.backward(input, target)?;

        self.pending += 1;
        if self.pending == self.batch_size {
            self.flush(net)?;
        }
        Ok(loss)
    }

    /// Apply and clear any pending gradients. Returns whether an update ran.
    pub fn flush(&mut self, net: &mut Network) -> Result<bool> {
        if self.pending == 0 {
            return Ok(false);
        }
        net.update_weights()?;
        net.zero_grads()?;
        trace!(samples = self.pending, "batch applied");
        self.pending = 0;
        Ok(true)
    }
}
