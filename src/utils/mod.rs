//! Shared utilities for the network engine
//!
//! This module provides the elementwise activation and loss functions, the
//! seeded random number generator used for weight initialization, and small
//! vector helpers used by the training driver.

pub mod activations;
pub mod loss;
pub mod rng;

pub use activations::{grad, linear, relu, sigmoid, softmax, Activation};
pub use loss::{binary_cross_entropy, categorical_cross_entropy, mean_squared_error, Loss};
pub use rng::SimpleRng;

/// Index of the largest value, the first one on ties.
///
/// Returns `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<usize> {
    if values.is_empty() {
        return None;
    }

    let mut best = 0usize;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if values[best] < value {
            best = i;
        }
    }
    Some(best)
}

/// Formats a vector as `[a, b, c]` with `precision` decimals.
pub fn format_vector(values: &[f32], precision: usize) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| format!("{:.*}", precision, v))
        .collect();
    format!("[{}]", items.join(", "))
}
