//! Configuration for sdbkv
//!
//! Centralized configuration with sensible defaults.

use std::sync::Arc;

use crate::comparator::{BytewiseComparator, Comparator};
use crate::error::{Result, SdbError};

/// Highest tower a skiplist may be configured with (8^12 still fits a u64 draw)
pub const MAX_SUPPORTED_HEIGHT: usize = 12;

/// Main configuration shared by the memtable and the table builder/reader
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Arena Configuration
    // -------------------------------------------------------------------------
    /// Size of each block the arena carves allocations from (in bytes).
    /// Also the largest single allocation the arena accepts.
    pub arena_block_size: usize,

    /// Maximum number of blocks the arena may hold at once
    pub arena_max_blocks: usize,

    // -------------------------------------------------------------------------
    // Skiplist Configuration
    // -------------------------------------------------------------------------
    /// Tallest tower the level generator produces
    pub max_height: usize,

    /// Fixed seed for the level generator (None = seed from OS entropy)
    pub level_seed: Option<u64>,

    // -------------------------------------------------------------------------
    // Table Configuration
    // -------------------------------------------------------------------------
    /// Capacity of the buffer holding all leaf blocks of one table (in bytes)
    pub leaf_buffer_size: usize,

    /// Capacity of the buffer holding the index block of one table (in bytes)
    pub index_buffer_size: usize,

    // -------------------------------------------------------------------------
    // Ordering
    // -------------------------------------------------------------------------
    /// Key order used by the skiplist, blocks and tables
    pub comparator: Arc<dyn Comparator>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arena_block_size: 128 * 1024 * 1024, // 128 MB
            arena_max_blocks: 128,
            max_height: 9,
            level_seed: None,
            leaf_buffer_size: 4 * 1024 * 1024, // 4 MB
            index_buffer_size: 1024 * 1024,    // 1 MB
            comparator: Arc::new(BytewiseComparator),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<()> {
        if self.arena_block_size == 0 {
            return Err(SdbError::Config("arena_block_size must be non-zero".to_string()));
        }
        if self.arena_max_blocks == 0 {
            return Err(SdbError::Config("arena_max_blocks must be non-zero".to_string()));
        }
        if self.max_height == 0 || self.max_height > MAX_SUPPORTED_HEIGHT {
            return Err(SdbError::Config(format!(
                "max_height must be in 1..={}, got {}",
                MAX_SUPPORTED_HEIGHT, self.max_height
            )));
        }
        // Block offsets and trailers are u32
        for (name, size) in [
            ("leaf_buffer_size", self.leaf_buffer_size),
            ("index_buffer_size", self.index_buffer_size),
        ] {
            if size == 0 || size > u32::MAX as usize {
                return Err(SdbError::Config(format!(
                    "{} must be in 1..={}, got {}",
                    name,
                    u32::MAX,
                    size
                )));
            }
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the arena block size (in bytes)
    pub fn arena_block_size(mut self, size: usize) -> Self {
        self.config.arena_block_size = size;
        self
    }

    /// Set the maximum number of arena blocks
    pub fn arena_max_blocks(mut self, count: usize) -> Self {
        self.config.arena_max_blocks = count;
        self
    }

    /// Set the tallest skiplist tower
    pub fn max_height(mut self, height: usize) -> Self {
        self.config.max_height = height;
        self
    }

    /// Seed the level generator for reproducible tower heights
    pub fn level_seed(mut self, seed: u64) -> Self {
        self.config.level_seed = Some(seed);
        self
    }

    /// Set the leaf region buffer size (in bytes)
    pub fn leaf_buffer_size(mut self, size: usize) -> Self {
        self.config.leaf_buffer_size = size;
        self
    }

    /// Set the index block buffer size (in bytes)
    pub fn index_buffer_size(mut self, size: usize) -> Self {
        self.config.index_buffer_size = size;
        self
    }

    /// Use a custom key order
    pub fn comparator(mut self, comparator: Arc<dyn Comparator>) -> Self {
        self.config.comparator = comparator;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
