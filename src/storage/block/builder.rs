//! Block Builder
//!
//! Writes entries into a fixed-size buffer supplied up front. The buffer never
//! grows: when an entry does not fit, `add` reports `BufferBound` and the
//! caller decides what to do (finish the block, use a bigger buffer).

use bytes::Bytes;

use crate::encoding::{append_varint, varint_len, write_u32_le};
use crate::error::{Result, SdbError};

use super::{align_up, Block, BlockHandle, OFFSET_SIZE, RESTART_ALIGNMENT, TRAILER_SIZE};

/// Builds blocks back to back inside one buffer
pub struct BlockBuilder {
    /// Destination buffer; its length is the capacity
    buf: Vec<u8>,
    /// Where the block under construction starts
    start_offset: usize,
    /// Next free byte
    cursor: usize,
    /// Start offset of every entry added so far
    offsets: Vec<u32>,
}

impl BlockBuilder {
    /// Start a block at `start_offset` inside `buf`.
    ///
    /// All of `buf` (its length, not its spare capacity) is writable.
    pub fn new(buf: Vec<u8>, start_offset: usize) -> Self {
        assert!(
            buf.len() <= u32::MAX as usize,
            "block buffers are addressed with u32 offsets"
        );
        assert!(
            start_offset <= buf.len(),
            "start offset {} outside buffer of {} bytes",
            start_offset,
            buf.len()
        );
        Self {
            buf,
            start_offset,
            cursor: start_offset,
            offsets: Vec::new(),
        }
    }

    /// Builder over a zeroed buffer of `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(vec![0u8; capacity], 0)
    }

    /// Append an entry. Keys must be added in ascending order.
    ///
    /// On `BufferBound` nothing has been written.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let needed = Self::entry_size(key.len(), value.len());
        let available = self.buf.len() - self.cursor;
        if needed > available {
            return Err(SdbError::BufferBound { needed, available });
        }

        let entry_offset = self.cursor;
        let mut pos = self.cursor;
        pos += append_varint(&mut self.buf, pos, key.len() as u64)?;
        pos += append_varint(&mut self.buf, pos, value.len() as u64)?;
        self.buf[pos..pos + key.len()].copy_from_slice(key);
        pos += key.len();
        self.buf[pos..pos + value.len()].copy_from_slice(value);
        pos += value.len();

        self.offsets.push(entry_offset as u32);
        self.cursor = pos;
        Ok(())
    }

    /// Whether an entry of this shape fits, leaving room to finish the block
    pub fn fits(&self, key_len: usize, value_len: usize) -> bool {
        let cursor = self.cursor + Self::entry_size(key_len, value_len);
        let end = align_up(cursor, RESTART_ALIGNMENT)
            + (self.offsets.len() + 1) * OFFSET_SIZE
            + TRAILER_SIZE;
        end <= self.buf.len()
    }

    /// Write padding, the offset array and the trailer.
    ///
    /// On success the builder is re-armed: the next `add` starts a new block
    /// right after this one. On `BufferBound` nothing has been written.
    pub fn finish(&mut self) -> Result<BlockHandle> {
        let restart = align_up(self.cursor, RESTART_ALIGNMENT);
        let end = restart + self.offsets.len() * OFFSET_SIZE + TRAILER_SIZE;
        if end > self.buf.len() {
            return Err(SdbError::BufferBound {
                needed: end - self.cursor,
                available: self.buf.len() - self.cursor,
            });
        }

        self.buf[self.cursor..restart].fill(0);

        let mut pos = restart;
        for &offset in &self.offsets {
            write_u32_le(&mut self.buf, pos, offset);
            pos += OFFSET_SIZE;
        }

        let data_size = (self.cursor - self.start_offset) as u32;
        let num_keys = self.offsets.len() as u32;
        write_u32_le(&mut self.buf, pos, data_size);
        write_u32_le(&mut self.buf, pos + 4, num_keys);
        write_u32_le(&mut self.buf, pos + 8, restart as u32);

        // An empty block has no entry to anchor its start; report the
        // restart offset, which is also what decoding it yields
        let first_offset = if num_keys == 0 { restart } else { self.start_offset };
        let handle = BlockHandle {
            first_offset: first_offset as u32,
            last_offset: end as u32,
            restart_offset: restart as u32,
            data_size,
            num_keys,
        };

        self.start_offset = end;
        self.cursor = end;
        self.offsets.clear();

        Ok(handle)
    }

    /// Finish the block and freeze the buffer into a read-only `Block`
    pub fn build(mut self) -> Result<Block> {
        let handle = self.finish()?;
        Ok(Block::new(Bytes::from(self.buf), handle))
    }

    /// Number of entries in the block under construction
    pub fn num_keys(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Bytes of entry data in the block under construction
    pub fn data_size(&self) -> usize {
        self.cursor - self.start_offset
    }

    /// Next byte `add` would write
    pub fn offset(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Everything written so far, from the start of the buffer
    pub fn buffer(&self) -> &[u8] {
        &self.buf[..self.cursor]
    }

    pub fn into_buffer(self) -> Vec<u8> {
        self.buf
    }

    fn entry_size(key_len: usize, value_len: usize) -> usize {
        varint_len(key_len as u64) + varint_len(value_len as u64) + key_len + value_len
    }
}
