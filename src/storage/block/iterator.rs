//! Block Iterator
//!
//! Index-based cursor over a block's offset array.

use std::cmp::Ordering;
use std::sync::Arc;

use bytes::Bytes;

use crate::comparator::Comparator;
use crate::iterator::KvIterator;

use super::Block;

/// Cursor over the entries of one block
#[derive(Clone)]
pub struct BlockIterator {
    block: Block,
    comparator: Arc<dyn Comparator>,
    /// Position in `[-1, num_keys]`; both ends are invalid
    idx: i64,
}

impl BlockIterator {
    pub(crate) fn new(block: Block, comparator: Arc<dyn Comparator>) -> Self {
        Self {
            block,
            comparator,
            idx: -1,
        }
    }

    /// Current position (may be out of range)
    pub fn position(&self) -> i64 {
        self.idx
    }

    /// Jump to an entry index; out-of-range positions are simply invalid
    pub fn seek_to_position(&mut self, idx: i64) {
        self.idx = idx;
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    fn current(&self) -> usize {
        assert!(
            self.valid(),
            "block iterator read at invalid position {} (num_keys {})",
            self.idx,
            self.block.num_keys()
        );
        self.idx as usize
    }
}

impl KvIterator for BlockIterator {
    fn valid(&self) -> bool {
        self.idx >= 0 && self.idx < self.block.num_keys() as i64
    }

    fn seek_to_first(&mut self) {
        self.idx = if self.block.is_empty() { -1 } else { 0 };
    }

    fn seek_to_last(&mut self) {
        self.idx = self.block.num_keys() as i64;
    }

    /// Binary search for the first key >= `target`; past the end if none
    fn seek(&mut self, target: &[u8]) {
        let (mut lo, mut hi) = (0usize, self.block.num_keys());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let key = self.block.key_at(mid);
            if self.comparator.compare(&key, target) == Ordering::Less {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        self.idx = lo as i64;
    }

    fn next(&mut self) {
        self.idx += 1;
    }

    fn prev(&mut self) {
        self.idx -= 1;
    }

    fn key(&self) -> Bytes {
        self.block.key_at(self.current())
    }

    fn value(&self) -> Bytes {
        self.block.value_at(self.current())
    }
}
