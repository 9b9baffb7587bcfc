//! Reproducible test data.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded generator of f64 buffers
pub struct Sampler {
    rng: ChaCha8Rng,
}

impl Sampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// `n` samples drawn uniformly from `[lo, hi)`
    pub fn uniform(&mut self, n: usize, lo: f64, hi: f64) -> Vec<f64> {
        (0..n).map(|_| self.rng.gen_range(lo..hi)).collect()
    }

    /// `n` samples drawn uniformly from `[0, 1)`
    pub fn unit(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.rng.gen::<f64>()).collect()
    }

    /// One sample from `[lo, hi)`
    pub fn scalar(&mut self, lo: f64, hi: f64) -> f64 {
        self.rng.gen_range(lo..hi)
    }
}
