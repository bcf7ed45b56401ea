//! Table Builder
//!
//! Accepts sorted entries, packs them into leaf blocks with differential keys
//! and writes `[leaf region][index block]` to a sink on finish.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::comparator::Comparator;
use crate::config::Config;
use crate::encoding::prefix::{encode_differential_key_into, encode_full_key_into};
use crate::error::{Result, SdbError};
use crate::storage::block::BlockBuilder;
use crate::storage::sink::Sink;

use super::{TableInfo, ENTRIES_PER_FULL_KEY, ENTRIES_PER_LEAF, INDEX_VALUE_SIZE};

/// Builder for creating a table from sorted entries
pub struct TableBuilder<'a> {
    /// Destination of the finished table
    sink: &'a mut dyn Sink,
    comparator: Arc<dyn Comparator>,
    /// All leaf blocks, back to back
    leaf: BlockBuilder,
    /// The single index block
    index: BlockBuilder,
    /// Entries in the active leaf
    leaf_entries: usize,
    /// End of the last finished leaf (= leaf region size so far)
    leaf_end: usize,
    num_entries: u64,
    num_leaves: u64,
    /// Last full key added, the base for the next differential key
    last_key: Vec<u8>,
    /// Reused buffer for the encoded key
    scratch: Vec<u8>,
}

impl<'a> TableBuilder<'a> {
    /// Create a builder writing to `sink`, with buffers sized by `config`
    pub fn new(sink: &'a mut dyn Sink, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sink,
            comparator: Arc::clone(&config.comparator),
            leaf: BlockBuilder::with_capacity(config.leaf_buffer_size),
            index: BlockBuilder::with_capacity(config.index_buffer_size),
            leaf_entries: 0,
            leaf_end: 0,
            num_entries: 0,
            num_leaves: 0,
            last_key: Vec::new(),
            scratch: Vec::new(),
        })
    }

    /// Add an entry. Keys must be strictly ascending.
    ///
    /// `BufferBound` means the table is full: finish it and start another.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.num_entries > 0
            && self.comparator.compare(key, &self.last_key) != Ordering::Greater
        {
            return Err(SdbError::OutOfOrder);
        }

        if self.leaf_entries == ENTRIES_PER_LEAF {
            self.finish_leaf()?;
        }

        if self.leaf_entries % ENTRIES_PER_FULL_KEY == 0 {
            encode_full_key_into(key, &mut self.scratch);
        } else {
            encode_differential_key_into(&self.last_key, key, &mut self.scratch);
        }

        // Keep room to finish the leaf and to index it under this key
        if !self.leaf.fits(self.scratch.len(), value.len())
            || !self.index.fits(key.len(), INDEX_VALUE_SIZE)
        {
            return Err(SdbError::BufferBound {
                needed: self.scratch.len() + value.len(),
                available: self.leaf.capacity() - self.leaf.offset(),
            });
        }
        self.leaf.add(&self.scratch, value)?;

        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.leaf_entries += 1;
        self.num_entries += 1;
        Ok(())
    }

    /// Finish the active leaf and index it under its last key
    fn finish_leaf(&mut self) -> Result<()> {
        // Check the index first so a failure leaves both builders untouched
        if !self.index.fits(self.last_key.len(), INDEX_VALUE_SIZE) {
            return Err(SdbError::BufferBound {
                needed: self.last_key.len() + INDEX_VALUE_SIZE,
                available: self.index.capacity() - self.index.offset(),
            });
        }

        let handle = self.leaf.finish()?;
        self.index
            .add(&self.last_key, &handle.last_offset.to_le_bytes())?;

        tracing::trace!(
            leaf = self.num_leaves,
            entries = handle.num_keys,
            end = handle.last_offset,
            "leaf block finished"
        );

        self.leaf_end = handle.last_offset as usize;
        self.leaf_entries = 0;
        self.num_leaves += 1;
        Ok(())
    }

    /// Finish building: flush the partial leaf, finish the index block and
    /// append leaf region then index block to the sink.
    ///
    /// The sink is not closed.
    pub fn finish(mut self) -> Result<TableInfo> {
        if self.leaf_entries > 0 {
            self.finish_leaf()?;
        }
        let index = self.index.finish()?;
        let index_size = index.last_offset as usize;

        self.sink.append(&self.leaf.buffer()[..self.leaf_end])?;
        self.sink.append(&self.index.buffer()[..index_size])?;

        let info = TableInfo {
            num_entries: self.num_entries,
            num_leaves: self.num_leaves,
            leaf_size: self.leaf_end as u64,
            index_size: index_size as u64,
            file_size: (self.leaf_end + index_size) as u64,
        };

        tracing::debug!(
            entries = info.num_entries,
            leaves = info.num_leaves,
            size = info.file_size,
            "table written"
        );

        Ok(info)
    }

    /// Entries added so far
    pub fn num_entries(&self) -> u64 {
        self.num_entries
    }

    /// Rough size of the table if finished now
    pub fn estimated_size(&self) -> usize {
        self.leaf.offset() + self.index.offset()
    }
}
