//! Per-layer accumulator storage for stateful optimizers.

use crate::error::{NetworkError, Result};
use crate::optimizers::{ParamRegion, ParamShape, ParamSlot};

/// One accumulator buffer per layer and region.
///
/// The cache is an arena keyed by layer index: region `(l, Weights)` holds as
/// many values as layer `l` has weights, `(l, Biases)` as many as it has
/// biases. Summed over layers, the cache covers every parameter of the network
/// exactly once.
#[derive(Debug, Clone, Default)]
pub struct OptimizerCache {
    weights: Vec<Vec<f32>>,
    biases: Vec<Vec<f32>>,
}

impl OptimizerCache {
    /// Zero-filled cache matching `shapes`.
    pub fn new(shapes: &[ParamShape]) -> Self {
        Self {
            weights: shapes.iter().map(|s| vec![0.0; s.weights]).collect(),
            biases: shapes.iter().map(|s| vec![0.0; s.biases]).collect(),
        }
    }

    /// Number of layers the cache was sized for.
    pub fn layer_count(&self) -> usize {
        self.weights.len()
    }

    /// Total weight accumulators across all layers.
    pub fn weight_count(&self) -> usize {
        self.weights.iter().map(Vec::len).sum()
    }

    /// Total bias accumulators across all layers.
    pub fn bias_count(&self) -> usize {
        self.biases.iter().map(Vec::len).sum()
    }

    /// Read access to one region.
    pub fn region(&self, slot: ParamSlot) -> Option<&[f32]> {
        let regions = match slot.region {
            ParamRegion::Weights => &self.weights,
            ParamRegion::Biases => &self.biases,
        };
        regions.get(slot.layer).map(Vec::as_slice)
    }

    /// Mutable access to one region, checked against the expected length.
    pub fn region_mut(&mut self, slot: ParamSlot, len: usize) -> Result<&mut [f32]> {
        let regions = match slot.region {
            ParamRegion::Weights => &mut self.weights,
            ParamRegion::Biases => &mut self.biases,
        };
        let region = regions.get_mut(slot.layer).ok_or_else(|| {
            NetworkError::InvalidArgument(format!(
                "optimizer cache has no region for layer {}",
                slot.layer
            ))
        })?;
        if region.len() != len {
            return Err(NetworkError::ShapeMismatch {
                expected: region.len(),
                actual: len,
            });
        }
        Ok(region.as_mut_slice())
    }

    /// Zero every accumulator.
    pub fn clear(&mut self) {
        for region in self.weights.iter_mut().chain(self.biases.iter_mut()) {
            region.fill(0.0);
        }
    }
}
