//! Table Reader
//!
//! Opens an in-memory table image and decodes leaf blocks on demand.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use crate::comparator::Comparator;
use crate::encoding::{is_full_key, read_u32_le};
use crate::error::{Result, SdbError};
use crate::iterator::KvIterator;
use crate::storage::block::{Block, OFFSET_SIZE, TRAILER_SIZE};

use super::iterator::TableIterator;
use super::INDEX_VALUE_SIZE;

/// Read-only table: one index block over a shared leaf region
#[derive(Debug, Clone)]
pub struct Table {
    index: Block,
    /// Every leaf block, back to back
    leaf_data: Bytes,
    comparator: Arc<dyn Comparator>,
}

impl Table {
    /// Open a table from its complete file image.
    ///
    /// The index block ends at `data.len()`; the leaf region is everything
    /// before it.
    pub fn open(data: Bytes, comparator: Arc<dyn Comparator>) -> Result<Self> {
        let len = data.len();
        if len < TRAILER_SIZE {
            return Err(SdbError::Corruption(format!(
                "table of {} bytes is shorter than a block trailer",
                len
            )));
        }

        // Index block length, relative to its own start
        let trailer = len - TRAILER_SIZE;
        let (num_keys, restart) = match (
            read_u32_le(&data, trailer + 4),
            read_u32_le(&data, trailer + 8),
        ) {
            (Some(n), Some(r)) => (n as u64, r as u64),
            _ => return Err(SdbError::Corruption("truncated index trailer".to_string())),
        };
        let index_len = restart + num_keys * OFFSET_SIZE as u64 + TRAILER_SIZE as u64;
        if index_len > len as u64 {
            return Err(SdbError::Corruption(format!(
                "index block of {} bytes larger than table of {} bytes",
                index_len, len
            )));
        }

        let index_start = len - index_len as usize;
        let index = Block::decode(data.slice(index_start..), index_len as usize)?;
        let leaf_data = data.slice(..index_start);

        let table = Self {
            index,
            leaf_data,
            comparator,
        };
        table.validate_index()?;

        tracing::debug!(
            size = len,
            leaves = table.num_leaves(),
            leaf_region = index_start,
            "table opened"
        );

        Ok(table)
    }

    /// Read a whole table file into memory and open it
    pub fn open_file(path: &Path, comparator: Arc<dyn Comparator>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::open(Bytes::from(data), comparator)
    }

    /// Index values must be ascending leaf end offsets, the last one closing
    /// the leaf region
    fn validate_index(&self) -> Result<()> {
        let mut prev_end = 0usize;
        for idx in 0..self.index.num_keys() {
            let end = leaf_end_offset(&self.index.value_at(idx))?;
            if end <= prev_end || end > self.leaf_data.len() {
                return Err(SdbError::Corruption(format!(
                    "leaf {} ends at {} (previous end {}, region {} bytes)",
                    idx,
                    end,
                    prev_end,
                    self.leaf_data.len()
                )));
            }
            prev_end = end;
        }
        if prev_end != self.leaf_data.len() {
            return Err(SdbError::Corruption(format!(
                "leaves end at {} but the leaf region is {} bytes",
                prev_end,
                self.leaf_data.len()
            )));
        }
        Ok(())
    }

    /// Open the leaf addressed by an index value.
    ///
    /// Only the trailer and the first entry are read; the rest of the leaf is
    /// parsed as the iterator reaches it.
    pub(crate) fn decode_leaf(&self, index_value: &[u8]) -> Result<Block> {
        let end = leaf_end_offset(index_value)?;
        let context = format!("leaf ending at {}", end);
        let leaf = Block::decode_trailer(self.leaf_data.clone(), end)
            .map_err(|e| e.into_corruption(&context))?;

        if leaf.is_empty() {
            return Err(SdbError::Corruption(format!("{}: no entries", context)));
        }
        let (first, _) = leaf.entry(0).map_err(|e| e.into_corruption(&context))?;
        if !is_full_key(&first) {
            return Err(SdbError::Corruption(format!(
                "{}: does not start with a full key",
                context
            )));
        }
        Ok(leaf)
    }

    /// Point lookup
    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let mut iter = self.iter();
        iter.seek(key);
        iter.status()?;
        if iter.valid() && self.comparator.compare(&iter.key(), key) == Ordering::Equal {
            return Ok(Some(iter.value()));
        }
        Ok(None)
    }

    /// Positional iterator over every entry, keys fully reconstructed
    pub fn iter(&self) -> TableIterator {
        TableIterator::new(self.clone())
    }

    pub(crate) fn index(&self) -> &Block {
        &self.index
    }

    pub(crate) fn comparator(&self) -> &Arc<dyn Comparator> {
        &self.comparator
    }

    /// Number of leaf blocks
    pub fn num_leaves(&self) -> usize {
        self.index.num_keys()
    }

    /// Bytes of the leaf region
    pub fn leaf_region_size(&self) -> usize {
        self.leaf_data.len()
    }

    /// Bytes of the index block
    pub fn index_size(&self) -> usize {
        self.index.handle().last_offset as usize
    }

    /// Last key of every leaf, in order
    pub fn leaf_boundaries(&self) -> Vec<Bytes> {
        (0..self.index.num_keys())
            .map(|idx| self.index.key_at(idx))
            .collect()
    }
}

/// Decode an index value into the end offset of its leaf
fn leaf_end_offset(value: &[u8]) -> Result<usize> {
    if value.len() != INDEX_VALUE_SIZE {
        return Err(SdbError::Corruption(format!(
            "index value of {} bytes, expected {}",
            value.len(),
            INDEX_VALUE_SIZE
        )));
    }
    read_u32_le(value, 0)
        .map(|end| end as usize)
        .ok_or_else(|| SdbError::Corruption("truncated index value".to_string()))
}
