//! Layer implementations for the network engine
//!
//! The engine supports a single layer type: a fully connected layer followed
//! by one of the built-in activations.

pub mod dense;

pub use dense::DenseLayer;
