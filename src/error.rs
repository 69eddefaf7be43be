//! Error types for the network engine.

use thiserror::Error;

/// Errors returned by every fallible engine operation.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("network not ready: {initialized} of {declared} layers initialized")]
    NotReady { declared: usize, initialized: usize },

    #[error("network already holds its declared {capacity} layers")]
    AlreadyInitialized { capacity: usize },

    #[error("loss function not configured")]
    LossNotConfigured,

    #[error("optimizer not configured")]
    OptimizerNotConfigured,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("invalid hyperparameter {name} = {value}")]
    InvalidHyperparameter { name: &'static str, value: f32 },

    #[error("unsupported output pairing: {loss} loss with {activation} activation")]
    UnsupportedCombination {
        loss: &'static str,
        activation: &'static str,
    },

    #[error("hidden layer {layer} uses softmax, which has no pointwise derivative")]
    SoftmaxInHiddenLayer { layer: usize },

    #[error("label vector has no entry equal to 1.0")]
    MissingClass,

    #[error("unknown activation: {0}")]
    UnknownActivation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, NetworkError>;
