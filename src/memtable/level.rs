//! Tower height generation
//!
//! One uniform draw per insert instead of a coin flip per level: the draw is
//! located in a geometric threshold table (8, 64, 512, ...) and small draws
//! map to tall towers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::MAX_SUPPORTED_HEIGHT;

/// Fan-out between adjacent levels
pub const BRANCHING_FACTOR: u64 = 8;

/// Draws tower heights in `1..=max_height` with P(height >= k) ~ 8^-(k-1)
pub struct LevelGenerator {
    /// 8^1, 8^2, ..., 8^max_height
    thresholds: Vec<u64>,
    rng: StdRng,
}

impl LevelGenerator {
    /// Generator seeded from OS entropy
    pub fn new(max_height: usize) -> Self {
        Self::with_rng(max_height, StdRng::from_entropy())
    }

    /// Deterministic generator
    pub fn with_seed(max_height: usize, seed: u64) -> Self {
        Self::with_rng(max_height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(max_height: usize, rng: StdRng) -> Self {
        assert!(
            (1..=MAX_SUPPORTED_HEIGHT).contains(&max_height),
            "max height must be in 1..={}, got {}",
            MAX_SUPPORTED_HEIGHT,
            max_height
        );
        let thresholds = (1..=max_height as u32)
            .map(|k| BRANCHING_FACTOR.pow(k))
            .collect();
        Self { thresholds, rng }
    }

    pub fn max_height(&self) -> usize {
        self.thresholds.len()
    }

    /// Height of the next tower
    pub fn next_height(&mut self) -> usize {
        let bound = self.thresholds[self.thresholds.len() - 1];
        let draw = self.rng.gen_range(0..bound);
        self.height_for(draw)
    }

    /// Map a draw in `[0, 8^max_height)` to a height: the smallest threshold
    /// >= draw at index `i` gives height `max_height - i`.
    pub fn height_for(&self, draw: u64) -> usize {
        let idx = self.thresholds.partition_point(|&t| t < draw);
        (self.thresholds.len() - idx).max(1)
    }
}
