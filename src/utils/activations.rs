//! Activation functions for dense layers
//!
//! This module provides the closed set of activations a layer can carry:
//! - Linear (identity)
//! - ReLU
//! - Sigmoid
//! - Softmax (numerically stabilized)
//!
//! Each function writes into a caller-provided buffer of the same length as
//! its input. The [`Activation`] tag selects one of them at runtime and is what
//! layers store and what the model file records.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

use crate::error::{NetworkError, Result};

/// Activation carried by a dense layer.
///
/// The discriminant doubles as the on-disk tag, so the order must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[serde(alias = "Linear", alias = "LINEAR")]
    Linear = 0,
    #[serde(alias = "ReLU", alias = "Relu", alias = "RELU")]
    Relu = 1,
    #[serde(alias = "Sigmoid", alias = "SIGMOID")]
    Sigmoid = 2,
    #[serde(alias = "Softmax", alias = "SOFTMAX")]
    Softmax = 3,
}

impl Activation {
    /// All activations, ordered by tag.
    pub const ALL: [Activation; 4] = [
        Activation::Linear,
        Activation::Relu,
        Activation::Sigmoid,
        Activation::Softmax,
    ];

    /// Small-integer tag written to model files.
    pub fn tag(self) -> i32 {
        self as i32
    }

    /// Inverse of [`Activation::tag`].
    pub fn from_tag(tag: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.tag() == tag)
    }

    /// Display name, also used by the name-based model layout.
    pub fn name(self) -> &'static str {
        match self {
            Activation::Linear => "Linear",
            Activation::Relu => "ReLU",
            Activation::Sigmoid => "Sigmoid",
            Activation::Softmax => "Softmax",
        }
    }

    /// Looks up an activation by its display name (exact match).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Applies the activation elementwise from `x` into `out`.
    pub fn apply(self, x: &[f32], out: &mut [f32]) -> Result<()> {
        match self {
            Activation::Linear => linear(x, out),
            Activation::Relu => relu(x, out),
            Activation::Sigmoid => sigmoid(x, out),
            Activation::Softmax => softmax(x, out),
        }
    }

    /// Derivative of the activation at the pre-activation value `x`.
    ///
    /// Softmax has no pointwise derivative and yields `None`.
    pub fn derivative(self, x: f32) -> Option<f32> {
        match self {
            Activation::Linear => Some(1.0),
            Activation::Relu => Some(if x > 0.0 { 1.0 } else { 0.0 }),
            Activation::Sigmoid => {
                let s = sigmoid_scalar(x);
                Some(s * (1.0 - s))
            }
            Activation::Softmax => None,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = NetworkError;

    /// Parses config-style names ("relu", "sigmoid", ...), case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(Activation::Linear),
            "relu" => Ok(Activation::Relu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "softmax" => Ok(Activation::Softmax),
            _ => Err(NetworkError::UnknownActivation(s.to_string())),
        }
    }
}

/// Scalar derivative lookup, `None` for softmax.
pub fn grad(kind: Activation, x: f32) -> Option<f32> {
    kind.derivative(x)
}

fn check_buffers(name: &str, x: &[f32], out: &[f32]) -> Result<()> {
    if x.is_empty() {
        warn!("{}: empty input", name);
        return Err(NetworkError::InvalidArgument(format!(
            "{}: input must not be empty",
            name
        )));
    }
    if x.len() != out.len() {
        warn!("{}: output length {} != input length {}", name, out.len(), x.len());
        return Err(NetworkError::ShapeMismatch {
            expected: x.len(),
            actual: out.len(),
        });
    }
    Ok(())
}

fn sigmoid_scalar(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Identity activation.
pub fn linear(x: &[f32], out: &mut [f32]) -> Result<()> {
    check_buffers("linear", x, out)?;
    out.copy_from_slice(x);
    Ok(())
}

/// ReLU activation: negative values become 0.0.
pub fn relu(x: &[f32], out: &mut [f32]) -> Result<()> {
    check_buffers("relu", x, out)?;
    for (o, &v) in out.iter_mut().zip(x) {
        *o = if v > 0.0 { v } else { 0.0 };
    }
    Ok(())
}

/// Sigmoid activation: 1 / (1 + exp(-x)).
pub fn sigmoid(x: &[f32], out: &mut [f32]) -> Result<()> {
    check_buffers("sigmoid", x, out)?;
    for (o, &v) in out.iter_mut().zip(x) {
        *o = sigmoid_scalar(v);
    }
    Ok(())
}

/// Softmax activation.
///
/// Subtracts the maximum input before exponentiating so large logits do not
/// overflow, then normalizes by the sum.
pub fn softmax(x: &[f32], out: &mut [f32]) -> Result<()> {
    check_buffers("softmax", x, out)?;

    let mut max_value = x[0];
    for &value in x.iter().skip(1) {
        if value > max_value {
            max_value = value;
        }
    }

    let mut sum = 0.0f32;
    for (o, &v) in out.iter_mut().zip(x) {
        *o = (v - max_value).exp();
        sum += *o;
    }

    for o in out.iter_mut() {
        *o /= sum;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON_F32: f32 = 1e-6;

    #[test]
    fn test_sigmoid_zero() {
        let mut out = [0.0f32];
        sigmoid(&[0.0], &mut out).unwrap();
        assert!((out[0] - 0.5).abs() < EPSILON_F32);
    }

    #[test]
    fn test_relu_mixed() {
        let mut out = [9.0f32; 5];
        relu(&[-2.0, -1.0, 0.0, 1.0, 2.0], &mut out).unwrap();
        assert_eq!(out, [0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_linear_copies() {
        let mut out = [0.0f32; 3];
        linear(&[1.5, -2.0, 0.25], &mut out).unwrap();
        assert_eq!(out, [1.5, -2.0, 0.25]);
    }

    #[test]
    fn test_softmax_uniform_input() {
        let mut out = [0.0f32; 3];
        softmax(&[1.0, 1.0, 1.0], &mut out).unwrap();
        for &val in &out {
            assert!((val - 1.0 / 3.0).abs() < EPSILON_F32);
        }
    }

    #[test]
    fn test_softmax_numerical_stability() {
        let mut out = [0.0f32; 3];
        softmax(&[1000.0, 1001.0, 1002.0], &mut out).unwrap();
        let sum: f32 = out.iter().sum();
        assert!((sum - 1.0).abs() < EPSILON_F32);
        assert!(!out.iter().any(|&x| x.is_nan() || x.is_infinite()));
    }

    #[test]
    fn test_empty_input_rejected_without_writing() {
        let mut out: [f32; 0] = [];
        assert!(matches!(
            relu(&[], &mut out),
            Err(NetworkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_length_mismatch_leaves_output_untouched() {
        let mut out = [7.0f32; 2];
        let err = sigmoid(&[0.0, 1.0, 2.0], &mut out).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::ShapeMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(out, [7.0, 7.0]);
    }

    #[test]
    fn test_derivatives() {
        assert_eq!(grad(Activation::Linear, -3.0), Some(1.0));
        assert_eq!(grad(Activation::Relu, 2.0), Some(1.0));
        assert_eq!(grad(Activation::Relu, 0.0), Some(0.0));
        assert!((grad(Activation::Sigmoid, 0.0).unwrap() - 0.25).abs() < EPSILON_F32);
        assert_eq!(grad(Activation::Softmax, 0.3), None);
    }

    #[test]
    fn test_tag_and_name_lookup() {
        for activation in Activation::ALL {
            assert_eq!(Activation::from_tag(activation.tag()), Some(activation));
            assert_eq!(Activation::from_name(activation.name()), Some(activation));
        }
        assert_eq!(Activation::from_tag(4), None);
        assert_eq!(Activation::from_name("Tanh"), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("ReLU".parse::<Activation>().unwrap(), Activation::Relu);
        assert_eq!("softmax".parse::<Activation>().unwrap(), Activation::Softmax);
        assert!("gelu".parse::<Activation>().is_err());
    }
}
