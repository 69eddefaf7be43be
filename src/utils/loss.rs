//! Loss functions
//!
//! Scalar losses comparing a target vector with the network's prediction:
//! half mean squared error, binary cross-entropy and categorical
//! cross-entropy over a one-hot target.

use std::fmt;

use serde::Deserialize;
use tracing::warn;

use crate::error::{NetworkError, Result};

/// Clamp applied to probabilities before taking logarithms.
pub const EPSILON: f32 = 1e-12;

/// Loss selected for a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    #[serde(alias = "mse")]
    MeanSquaredError,
    BinaryCrossEntropy,
    CategoricalCrossEntropy,
}

impl Loss {
    /// Evaluates the loss for one sample.
    pub fn compute(self, y_true: &[f32], y_pred: &[f32]) -> Result<f32> {
        match self {
            Loss::MeanSquaredError => mean_squared_error(y_true, y_pred),
            Loss::BinaryCrossEntropy => binary_cross_entropy(y_true, y_pred),
            Loss::CategoricalCrossEntropy => categorical_cross_entropy(y_true, y_pred),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Loss::MeanSquaredError => "MeanSquaredError",
            Loss::BinaryCrossEntropy => "BinaryCrossEntropy",
            Loss::CategoricalCrossEntropy => "CategoricalCrossEntropy",
        }
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn check_pair(name: &str, y_true: &[f32], y_pred: &[f32]) -> Result<()> {
    if y_true.is_empty() {
        warn!("{}: empty target", name);
        return Err(NetworkError::InvalidArgument(format!(
            "{}: target must not be empty",
            name
        )));
    }
    if y_true.len() != y_pred.len() {
        warn!(
            "{}: prediction length {} != target length {}",
            name,
            y_pred.len(),
            y_true.len()
        );
        return Err(NetworkError::ShapeMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    Ok(())
}

/// Half mean squared error: `0.5 * Σ(y - p)² / n`.
pub fn mean_squared_error(y_true: &[f32], y_pred: &[f32]) -> Result<f32> {
    check_pair("mean_squared_error", y_true, y_pred)?;

    let sum: f32 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&y, &p)| {
            let error = y - p;
            error * error
        })
        .sum();

    Ok(0.5 * sum / y_true.len() as f32)
}

/// Mean binary cross-entropy with `p` and `1 - p` both floored at `EPSILON`.
pub fn binary_cross_entropy(y_true: &[f32], y_pred: &[f32]) -> Result<f32> {
    check_pair("binary_cross_entropy", y_true, y_pred)?;

    let mut sum = 0.0f32;
    for (&y, &p) in y_true.iter().zip(y_pred) {
        // 1 - EPSILON rounds to 1.0 in f32, so floor the complement separately.
        let clipped = p.clamp(EPSILON, 1.0);
        sum += y * clipped.ln() + (1.0 - y) * (1.0 - clipped).max(EPSILON).ln();
    }

    Ok(-sum / y_true.len() as f32)
}

/// Categorical cross-entropy for a one-hot target.
///
/// Uses the first index whose target is exactly 1.0. A target without such an
/// entry yields [`NetworkError::MissingClass`].
pub fn categorical_cross_entropy(y_true: &[f32], y_pred: &[f32]) -> Result<f32> {
    check_pair("categorical_cross_entropy", y_true, y_pred)?;

    let class_index = match y_true.iter().position(|&y| y == 1.0) {
        Some(index) => index,
        None => {
            warn!("categorical_cross_entropy: no class index in target");
            return Err(NetworkError::MissingClass);
        }
    };

    Ok(-y_pred[class_index].max(EPSILON).ln())
}
