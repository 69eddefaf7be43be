//! Simple random number generator for reproducible weight initialization.
//!
//! This module provides a lightweight xorshift-based PRNG plus a normal sampler,
//! so a seeded network is built identically on every run.

use std::time::{SystemTime, UNIX_EPOCH};

/// Simple RNG for reproducibility without external crates.
///
/// Uses xorshift algorithm for fast, deterministic random number generation.
/// Normal samples come from the Marsaglia polar method, which produces two
/// values per round; the second one is kept for the next call.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
    spare: Option<f32>,
}

impl SimpleRng {
    /// Create a new RNG with explicit seed (if zero, use a fixed value).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state, spare: None }
    }

    /// Reseed based on the current time.
    pub fn reseed_from_time(&mut self) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        self.state = if nanos == 0 {
            0x9e3779b97f4a7c15
        } else {
            nanos
        };
        self.spare = None;
    }

    /// Basic xorshift to generate u32.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 32) as u32
    }

    /// Convert to [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        unit_f32(self.next_u32())
    }

    /// Uniform sample in [low, high).
    pub fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32()
    }

    /// Normal sample with the given mean and standard deviation.
    pub fn next_normal(&mut self, mean: f32, stddev: f32) -> f32 {
        if let Some(spare) = self.spare.take() {
            return mean + stddev * spare;
        }

        loop {
            let u = self.gen_range_f32(-1.0, 1.0);
            let v = self.gen_range_f32(-1.0, 1.0);
            let s = u * u + v * v;
            if s >= 1.0 || s == 0.0 {
                continue;
            }

            let scale = (-2.0 * s.ln() / s).sqrt();
            self.spare = Some(v * scale);
            return mean + stddev * (u * scale);
        }
    }
}

// Top 24 bits only; every value is exact in f32 and stays below 1.0.
fn unit_f32(bits: u32) -> f32 {
    (bits >> 8) as f32 / (1u32 << 24) as f32
}
