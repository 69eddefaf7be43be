//! Feedforward neural network engine
//!
//! A small engine for fully connected networks: a fixed stack of dense
//! layers, forward inference, back-propagation with gradient accumulation,
//! five optimizers and a binary model format.
//!
//! # Modules
//!
//! - `network`: the [`Network`] engine, batching and model files
//! - `layers`: the dense layer and its buffers
//! - `optimizers`: Optimizer trait and implementations (SGD, Momentum, Adagrad, RMSProp, Adam)
//! - `utils`: activations, losses, RNG and small vector helpers
//! - `data`: CSV sample loading and train/test splitting
//! - `training`: epoch loop and accuracy evaluation
//! - `config`: Training configuration structures
//! - `architecture`: Architecture configuration and network building

pub mod architecture;
pub mod config;
pub mod data;
pub mod error;
pub mod layers;
pub mod network;
pub mod optimizers;
pub mod training;
pub mod utils;

pub use error::{NetworkError, Result};
pub use layers::DenseLayer;
pub use network::{BatchAccumulator, Network};
pub use optimizers::{Optimizer, OptimizerConfig, OptimizerKind};
pub use utils::{Activation, Loss, SimpleRng};
