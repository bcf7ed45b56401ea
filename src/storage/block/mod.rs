//! Block Module
//!
//! A block is an immutable, sorted run of key/value entries followed by an
//! index of entry offsets and a fixed trailer.
//!
//! ## Block Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Entries (data_size bytes, starting at first_offset)     │
//! │   [KeyLen: varint][ValLen: varint][Key][Value]          │
//! │   ... repeated for each entry ...                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Zero padding up to the next 8-byte boundary             │
//! ├─────────────────────────────────────────────────────────┤
//! │ Offset Array (at restart_offset)                        │
//! │   [EntryOffset: u32 LE] ... one per entry               │
//! ├─────────────────────────────────────────────────────────┤
//! │ Trailer (12 bytes)                                      │
//! │   DataSize: u32 | NumKeys: u32 | RestartOffset: u32     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! Offsets are absolute within the buffer the block was built in, so several
//! blocks can share one buffer back to back (as the leaves of a table do).

mod builder;
mod iterator;

use std::sync::Arc;

use bytes::Bytes;

use crate::comparator::Comparator;
use crate::encoding::{parse_varint, read_u32_le};
use crate::error::{Result, SdbError};

pub use builder::BlockBuilder;
pub use iterator::BlockIterator;

// =============================================================================
// Shared Constants (used by builder, iterator, decode)
// =============================================================================

/// Trailer size: DataSize (4) + NumKeys (4) + RestartOffset (4) = 12 bytes
pub const TRAILER_SIZE: usize = 12;

/// The offset array starts on this boundary
pub const RESTART_ALIGNMENT: usize = 8;

/// Size of one entry in the offset array
pub(crate) const OFFSET_SIZE: usize = 4;

pub(crate) fn align_up(offset: usize, alignment: usize) -> usize {
    offset.div_ceil(alignment) * alignment
}

// =============================================================================
// Block Handle
// =============================================================================

/// Location and shape of a finished block inside its buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle {
    /// Offset of the first entry
    pub first_offset: u32,
    /// One past the trailer
    pub last_offset: u32,
    /// Start of the offset array (8-byte aligned)
    pub restart_offset: u32,
    /// Bytes taken by entries
    pub data_size: u32,
    pub num_keys: u32,
}

// =============================================================================
// Block
// =============================================================================

/// Read-only view of a finished block
#[derive(Debug, Clone)]
pub struct Block {
    /// The whole buffer the block lives in
    data: Bytes,
    handle: BlockHandle,
}

impl Block {
    /// Wrap a block the builder just finished
    pub(crate) fn new(data: Bytes, handle: BlockHandle) -> Self {
        Self { data, handle }
    }

    /// Rebuild a block from the trailer ending at `end_offset`.
    ///
    /// Every entry is checked to lie inside the data region, so the panicking
    /// accessors (`key_at`, `value_at`) are safe on a decoded block.
    pub fn decode(data: Bytes, end_offset: usize) -> Result<Self> {
        let block = Self::decode_trailer(data, end_offset)?;
        block.validate_entries()?;
        Ok(block)
    }

    /// Rebuild a block from its trailer and offset array only.
    ///
    /// Entries are parsed when read: use [`Block::entry`], which reports a
    /// bad entry as `Corruption`.
    ///
    /// An empty block carries no entry offsets, so its `first_offset` comes
    /// back as its restart offset, the same value the builder reports.
    pub fn decode_trailer(data: Bytes, end_offset: usize) -> Result<Self> {
        if end_offset > data.len() || end_offset < TRAILER_SIZE {
            return Err(SdbError::Corruption(format!(
                "block end offset {} outside buffer of {} bytes",
                end_offset,
                data.len()
            )));
        }

        let trailer = end_offset - TRAILER_SIZE;
        let (data_size, num_keys, restart) = match (
            read_u32_le(&data, trailer),
            read_u32_le(&data, trailer + 4),
            read_u32_le(&data, trailer + 8),
        ) {
            (Some(d), Some(n), Some(r)) => (d as usize, n as usize, r as usize),
            _ => return Err(SdbError::Corruption("truncated block trailer".to_string())),
        };

        if restart % RESTART_ALIGNMENT != 0 {
            return Err(SdbError::Corruption(format!(
                "restart offset {} is not {}-byte aligned",
                restart, RESTART_ALIGNMENT
            )));
        }
        if num_keys
            .checked_mul(OFFSET_SIZE)
            .and_then(|len| len.checked_add(restart))
            != Some(trailer)
        {
            return Err(SdbError::Corruption(format!(
                "offset array of {} entries at {} does not end at trailer {}",
                num_keys, restart, trailer
            )));
        }
        if data_size > restart {
            return Err(SdbError::Corruption(format!(
                "data size {} larger than restart offset {}",
                data_size, restart
            )));
        }

        let first_offset = if num_keys == 0 {
            restart - data_size
        } else {
            read_u32_le(&data, restart).unwrap_or(0) as usize
        };
        let data_end = first_offset + data_size;
        if data_end > restart || align_up(data_end, RESTART_ALIGNMENT) != restart {
            return Err(SdbError::Corruption(format!(
                "entries [{}, {}) do not end just before restart offset {}",
                first_offset, data_end, restart
            )));
        }

        let handle = BlockHandle {
            first_offset: first_offset as u32,
            last_offset: end_offset as u32,
            restart_offset: restart as u32,
            data_size: data_size as u32,
            num_keys: num_keys as u32,
        };
        Ok(Self { data, handle })
    }

    /// Check that entries are back to back and inside the data region
    fn validate_entries(&self) -> Result<()> {
        let mut expected = self.handle.first_offset as usize;
        for idx in 0..self.num_keys() {
            let offset = self.entry_offset(idx);
            if offset != expected {
                return Err(SdbError::Corruption(format!(
                    "entry {} at offset {}, expected {}",
                    idx, offset, expected
                )));
            }
            let (_, _, next) = self.parse_entry(offset)?;
            expected = next;
        }
        if expected != self.data_end() {
            return Err(SdbError::Corruption(format!(
                "entries end at {}, data region ends at {}",
                expected,
                self.data_end()
            )));
        }
        Ok(())
    }

    /// Parse the entry at `offset`: (key range, value range, next entry offset)
    fn parse_entry(
        &self,
        offset: usize,
    ) -> Result<(std::ops::Range<usize>, std::ops::Range<usize>, usize)> {
        let region = &self.data[..self.data_end()];

        let bad_header = |e: SdbError| e.into_corruption(&format!("entry at {}", offset));

        let (key_len, n) = parse_varint(region, offset).map_err(bad_header)?;
        let mut pos = offset + n;
        let (val_len, n) = parse_varint(region, pos).map_err(bad_header)?;
        pos += n;

        let key_end = pos.checked_add(key_len as usize);
        let val_end = key_end.and_then(|k| k.checked_add(val_len as usize));
        match (key_end, val_end) {
            (Some(key_end), Some(val_end)) if val_end <= region.len() => {
                Ok((pos..key_end, key_end..val_end, val_end))
            }
            _ => Err(SdbError::Corruption(format!(
                "entry at {} overruns the data region",
                offset
            ))),
        }
    }

    fn data_end(&self) -> usize {
        (self.handle.first_offset + self.handle.data_size) as usize
    }

    /// Offset of entry `idx`, read from the offset array
    pub(crate) fn entry_offset(&self, idx: usize) -> usize {
        let slot = self.handle.restart_offset as usize + idx * OFFSET_SIZE;
        match read_u32_le(&self.data, slot) {
            Some(offset) => offset as usize,
            None => panic!("entry index {} outside offset array", idx),
        }
    }

    /// Key and value of entry `idx`
    pub fn entry(&self, idx: usize) -> Result<(Bytes, Bytes)> {
        assert!(
            idx < self.num_keys(),
            "entry index {} out of range for block of {} keys",
            idx,
            self.num_keys()
        );
        let (key, value, _) = self.parse_entry(self.entry_offset(idx))?;
        Ok((self.data.slice(key), self.data.slice(value)))
    }

    /// Key of entry `idx`
    pub fn key_at(&self, idx: usize) -> Bytes {
        match self.entry(idx) {
            Ok((key, _)) => key,
            Err(e) => panic!("unreadable block entry {}: {}", idx, e),
        }
    }

    /// Value of entry `idx`
    pub fn value_at(&self, idx: usize) -> Bytes {
        match self.entry(idx) {
            Ok((_, value)) => value,
            Err(e) => panic!("unreadable block entry {}: {}", idx, e),
        }
    }

    /// Positional iterator ordered by `comparator`
    pub fn iter(&self, comparator: Arc<dyn Comparator>) -> BlockIterator {
        BlockIterator::new(self.clone(), comparator)
    }

    pub fn handle(&self) -> BlockHandle {
        self.handle
    }

    pub fn num_keys(&self) -> usize {
        self.handle.num_keys as usize
    }

    pub fn is_empty(&self) -> bool {
        self.handle.num_keys == 0
    }

    /// The encoded block, `[first_offset, last_offset)`
    pub fn as_bytes(&self) -> Bytes {
        self.data
            .slice(self.handle.first_offset as usize..self.handle.last_offset as usize)
    }
}
