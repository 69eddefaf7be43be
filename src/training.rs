//! Epoch-level training and evaluation
//!
//! Drives a configured [`Network`] over a [`Dataset`]: one call to
//! [`train_epoch`] visits every sample once in order through a
//! [`BatchAccumulator`] and flushes the tail batch, [`evaluate`] reports
//! arg-max accuracy.

use std::time::Instant;

use tracing::{debug, info};

use crate::data::Dataset;
use crate::error::{NetworkError, Result};
use crate::network::{BatchAccumulator, Network};
use crate::utils::argmax;

/// Summary of one pass over the training set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    pub epoch: usize,
    pub average_loss: f32,
    pub seconds: f32,
}

/// Train for one epoch and return the mean per-sample loss.
///
/// Every sample's gradients are accumulated; the network is updated each
/// time the accumulator fills and once more for any remainder.
pub fn train_epoch(
    net: &mut Network,
    batch: &mut BatchAccumulator,
    data: &Dataset,
    epoch: usize,
) -> Result<EpochStats> {
    if data.is_empty() {
        return Err(NetworkError::InvalidArgument(
            "training set is empty".to_string(),
        ));
    }

    let start = Instant::now();
    let mut total_loss = 0.0f32;
    for (input, target) in data.iter() {
        total_loss += batch.accumulate(net, input, target)?;
    }
    batch.flush(net)?;

    let stats = EpochStats {
        epoch,
        average_loss: total_loss / data.len() as f32,
        seconds: start.elapsed().as_secs_f32(),
    };
    debug!(
        epoch = stats.epoch,
        loss = stats.average_loss,
        seconds = stats.seconds,
        "epoch finished"
    );
    Ok(stats)
}

/// Run `epochs` epochs, logging the loss every `log_every` epochs.
pub fn train(
    net: &mut Network,
    data: &Dataset,
    batch_size: usize,
    epochs: usize,
    log_every: usize,
) -> Result<Vec<EpochStats>> {
    let mut batch = BatchAccumulator::new(batch_size)?;
    let log_every = log_every.max(1);

    let mut history = Vec::with_capacity(epochs);
    for epoch in 1..=epochs {
        let stats = train_epoch(net, &mut batch, data, epoch)?;
        if epoch % log_every == 0 {
            info!(
                "Epoch: {} Loss: {:.6} Time: {:.2}s",
                epoch, stats.average_loss, stats.seconds
            );
        }
        history.push(stats);
    }
    Ok(history)
}

/// Percentage of samples whose predicted class (arg-max of the output)
/// matches the arg-max of the target.
pub fn evaluate(net: &mut Network, data: &Dataset) -> Result<f32> {
    if data.is_empty() {
        return Err(NetworkError::InvalidArgument(
            "evaluation set is empty".to_string(),
        ));
    }

    let mut correct = 0usize;
    for (input, target) in data.iter() {
        let predicted = argmax(net.forward(input)?);
        if predicted.is_some() && predicted == argmax(target) {
            correct += 1;
        }
    }
    Ok(correct as f32 / data.len() as f32 * 100.0)
}
