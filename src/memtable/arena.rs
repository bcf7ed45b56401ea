//! Arena allocator
//!
//! Bump allocation out of fixed-size blocks, released all at once.

use crate::config::Config;
use crate::error::{Result, SdbError};

/// Handle to a byte range issued by an [`Arena`].
///
/// Handles are plain data. They stay usable until the arena is reset; using
/// one afterwards is a broken contract and panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaSlice {
    generation: u64,
    block: usize,
    offset: usize,
    len: usize,
}

impl ArenaSlice {
    /// Number of bytes the handle covers
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Bump allocator over a pool of equally sized, zero-filled blocks
///
/// ## Layout
/// ```text
/// blocks[0]   [######## retired ########]
/// blocks[1]   [######## retired ######  ]   (tail too short for a request)
/// blocks[2]   [#####|                   ]   current
///                   ^ cursor
/// ```
/// Memory is never handed out twice within one generation, so every
/// allocation starts zeroed. `reset_all` drops every block and starts a new
/// generation.
pub struct Arena {
    /// Size of every block, also the largest single allocation
    block_size: usize,
    /// Cap on the number of blocks held at once
    max_blocks: usize,
    /// All blocks; the last one is the current block
    blocks: Vec<Box<[u8]>>,
    /// Next free byte in the current block
    cursor: usize,
    /// Bumped by every reset; stamped into each handle
    generation: u64,
    /// Bytes handed out since the last reset
    allocated: usize,
}

impl Arena {
    /// Create an empty arena. No block is allocated until the first request.
    pub fn new(block_size: usize, max_blocks: usize) -> Self {
        assert!(block_size > 0, "arena block size must be non-zero");
        Self {
            block_size,
            max_blocks,
            blocks: Vec::new(),
            cursor: 0,
            generation: 0,
            allocated: 0,
        }
    }

    /// Create an arena sized by the config
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.arena_block_size, config.arena_max_blocks)
    }

    /// Carve `size` zeroed bytes out of the current block, moving to a fresh
    /// block when the current one is too short.
    ///
    /// Panics if `size` exceeds the block size. Returns `ArenaExhausted` when
    /// a new block is needed but the block cap is reached.
    pub fn allocate(&mut self, size: usize) -> Result<ArenaSlice> {
        assert!(
            size <= self.block_size,
            "allocation of {} bytes exceeds arena block size {}",
            size,
            self.block_size
        );

        if self.blocks.is_empty() || self.block_size - self.cursor < size {
            if self.blocks.len() >= self.max_blocks {
                return Err(SdbError::ArenaExhausted {
                    blocks: self.blocks.len(),
                });
            }
            self.blocks
                .push(vec![0u8; self.block_size].into_boxed_slice());
            self.cursor = 0;
            tracing::debug!(
                blocks = self.blocks.len(),
                block_size = self.block_size,
                "arena mapped new block"
            );
        }

        let slice = ArenaSlice {
            generation: self.generation,
            block: self.blocks.len() - 1,
            offset: self.cursor,
            len: size,
        };
        self.cursor += size;
        self.allocated += size;
        Ok(slice)
    }

    /// Allocate room for `bytes` and copy them in
    pub fn alloc_copy(&mut self, bytes: &[u8]) -> Result<ArenaSlice> {
        let slice = self.allocate(bytes.len())?;
        self.get_mut(slice).copy_from_slice(bytes);
        Ok(slice)
    }

    /// Bytes behind a handle. Panics on a handle from before the last reset.
    pub fn get(&self, slice: ArenaSlice) -> &[u8] {
        self.check_live(slice);
        &self.blocks[slice.block][slice.offset..slice.offset + slice.len]
    }

    /// Mutable bytes behind a handle. Panics on a handle from before the last reset.
    pub fn get_mut(&mut self, slice: ArenaSlice) -> &mut [u8] {
        self.check_live(slice);
        &mut self.blocks[slice.block][slice.offset..slice.offset + slice.len]
    }

    /// Whether a handle was issued in the current generation
    pub fn is_live(&self, slice: ArenaSlice) -> bool {
        slice.generation == self.generation
    }

    /// Release every block, including the current one. All handles issued so
    /// far become invalid.
    pub fn reset_all(&mut self) {
        tracing::debug!(
            blocks = self.blocks.len(),
            allocated = self.allocated,
            "arena reset"
        );
        self.blocks = Vec::new();
        self.cursor = 0;
        self.allocated = 0;
        self.generation += 1;
    }

    /// Bytes handed out since the last reset
    pub fn allocated_bytes(&self) -> usize {
        self.allocated
    }

    /// Number of blocks currently held
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn check_live(&self, slice: ArenaSlice) {
        assert!(
            self.is_live(slice),
            "arena handle from generation {} used after reset (now generation {})",
            slice.generation,
            self.generation
        );
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
