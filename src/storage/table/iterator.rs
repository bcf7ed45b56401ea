//! Table Iterator
//!
//! Two-level cursor: an index block iterator picks the leaf, a block
//! iterator walks inside it. Leaf keys are stored differentially and are
//! rebuilt on read.
//!
//! Leaves are opened from their trailer alone and parsed as the cursor moves,
//! so a seek touches at most one checkpoint interval of its leaf. A bad entry
//! met on the way leaves the iterator invalid and is reported by
//! [`TableIterator::status`].

use std::cmp::Ordering;

use bytes::Bytes;

use crate::comparator::Comparator;
use crate::encoding::{decode_differential_key, is_full_key};
use crate::error::{Result, SdbError};
use crate::iterator::KvIterator;
use crate::storage::block::{Block, BlockIterator};

use super::reader::Table;
use super::ENTRIES_PER_FULL_KEY;

/// Iterator over every entry of a [`Table`]
pub struct TableIterator {
    table: Table,
    index_iter: BlockIterator,
    /// None until positioned, for an empty table, or after a bad leaf
    leaf_iter: Option<BlockIterator>,
    /// Full key and value at the current position
    current: Option<(Bytes, Bytes)>,
    /// First corruption met while moving
    error: Option<String>,
}

impl TableIterator {
    pub(crate) fn new(table: Table) -> Self {
        let index_iter = table.index().iter(table.comparator().clone());
        Self {
            table,
            index_iter,
            leaf_iter: None,
            current: None,
            error: None,
        }
    }

    /// `Corruption` if a leaf or an entry could not be decoded while moving
    pub fn status(&self) -> Result<()> {
        match &self.error {
            Some(msg) => Err(SdbError::Corruption(msg.clone())),
            None => Ok(()),
        }
    }

    /// Stop on a corrupted leaf: invalid until repositioned
    fn fail(&mut self, error: SdbError) {
        tracing::warn!(
            leaf = self.index_iter.position(),
            error = %error,
            "corrupted leaf block"
        );
        let msg = match error {
            SdbError::Corruption(msg) => msg,
            other => other.to_string(),
        };
        self.error.get_or_insert(msg);
        self.leaf_iter = None;
        self.current = None;
    }

    /// Open the leaf the index iterator points at
    fn load_leaf(&mut self) -> bool {
        self.current = None;
        if !self.index_iter.valid() {
            self.leaf_iter = None;
            return false;
        }
        match self.table.decode_leaf(&self.index_iter.value()) {
            Ok(leaf) => {
                self.leaf_iter = Some(leaf.iter(self.table.comparator().clone()));
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    fn leaf_mut(&mut self) -> Option<&mut BlockIterator> {
        self.leaf_iter.as_mut()
    }

    /// Read the entry under the leaf cursor. `prev` is the full key of the
    /// entry just before it, when known.
    fn settle(&mut self, prev: Option<Bytes>) {
        self.current = None;
        let read = match &self.leaf_iter {
            Some(leaf) if leaf.valid() => {
                read_entry(leaf.block(), leaf.position() as usize, prev.as_deref())
            }
            _ => return,
        };
        match read {
            Ok(entry) => self.current = Some(entry),
            Err(e) => self.fail(e),
        }
    }

    fn current(&self) -> &(Bytes, Bytes) {
        match &self.current {
            Some(entry) => entry,
            None => panic!("table iterator read at an invalid position"),
        }
    }
}

impl KvIterator for TableIterator {
    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn seek_to_first(&mut self) {
        self.index_iter.seek_to_first();
        if self.load_leaf() {
            if let Some(leaf) = self.leaf_mut() {
                leaf.seek_to_first();
            }
        }
        self.settle(None);
    }

    /// Past the last entry of the last leaf; `prev` once reaches it
    fn seek_to_last(&mut self) {
        self.index_iter.seek_to_last();
        self.index_iter.prev();
        if self.load_leaf() {
            if let Some(leaf) = self.leaf_mut() {
                leaf.seek_to_last();
            }
        }
        self.current = None;
    }

    /// First key >= `target`. Past the end of the table, behaves like
    /// `seek_to_last`.
    fn seek(&mut self, target: &[u8]) {
        // Leaves are indexed by their last key, so this is the only leaf
        // that can hold the lower bound
        self.index_iter.seek(target);
        if !self.index_iter.valid() {
            self.seek_to_last();
            return;
        }
        if !self.load_leaf() {
            return;
        }

        let comparator = self.table.comparator().clone();
        let found = match &self.leaf_iter {
            Some(leaf) => leaf_lower_bound(leaf.block(), target, comparator.as_ref()),
            None => return,
        };
        match found {
            Ok(idx) => {
                if let Some(leaf) = self.leaf_mut() {
                    leaf.seek_to_position(idx as i64);
                }
                self.settle(None);
            }
            Err(e) => self.fail(e),
        }
    }

    fn next(&mut self) {
        let prev = self.current.take().map(|(key, _)| key);
        let Some(leaf) = self.leaf_iter.as_mut() else {
            return;
        };

        leaf.next();
        let num_keys = leaf.block().num_keys() as i64;
        if leaf.position() < num_keys {
            self.settle(prev);
            return;
        }

        self.index_iter.next();
        if self.index_iter.valid() {
            if self.load_leaf() {
                if let Some(leaf) = self.leaf_mut() {
                    leaf.seek_to_first();
                }
            }
            self.settle(None);
        } else {
            // Stay on the last leaf, one past its end
            self.index_iter.prev();
            leaf.seek_to_position(num_keys);
        }
    }

    fn prev(&mut self) {
        self.current = None;
        let Some(leaf) = self.leaf_iter.as_mut() else {
            return;
        };

        leaf.prev();
        if leaf.position() >= 0 {
            self.settle(None);
            return;
        }

        self.index_iter.prev();
        if self.index_iter.valid() {
            if self.load_leaf() {
                if let Some(leaf) = self.leaf_mut() {
                    leaf.seek_to_last();
                    leaf.prev();
                }
            }
            self.settle(None);
        } else {
            // Stay on the first leaf, one before its start
            self.index_iter.next();
            leaf.seek_to_position(-1);
        }
    }

    fn key(&self) -> Bytes {
        self.current().0.clone()
    }

    fn value(&self) -> Bytes {
        self.current().1.clone()
    }
}

/// Encoded key of entry `idx`
fn encoded_key(leaf: &Block, idx: usize) -> Result<Bytes> {
    leaf.entry(idx)
        .map(|(key, _)| key)
        .map_err(|e| e.into_corruption(&format!("leaf entry {}", idx)))
}

/// Full key of entry `idx` given the full key of entry `idx - 1`
fn decode_at(leaf: &Block, idx: usize, prev: &[u8]) -> Result<Vec<u8>> {
    let encoded = encoded_key(leaf, idx)?;
    decode_differential_key(prev, &encoded)
        .map_err(|e| e.into_corruption(&format!("leaf entry {}", idx)))
}

/// Rebuild the full key of entry `idx`: back up to the nearest full key and
/// replay the differential keys forward
fn reconstruct_key(leaf: &Block, idx: usize) -> Result<Vec<u8>> {
    let mut start = idx;
    while start > 0 && !is_full_key(&encoded_key(leaf, start)?) {
        start -= 1;
    }

    let mut key = Vec::new();
    for i in start..=idx {
        key = decode_at(leaf, i, &key)?;
    }
    Ok(key)
}

/// Full key and value of entry `idx`
fn read_entry(leaf: &Block, idx: usize, prev: Option<&[u8]>) -> Result<(Bytes, Bytes)> {
    let key = match prev {
        Some(prev) => decode_at(leaf, idx, prev)?,
        None => reconstruct_key(leaf, idx)?,
    };
    let (_, value) = leaf
        .entry(idx)
        .map_err(|e| e.into_corruption(&format!("leaf entry {}", idx)))?;
    Ok((Bytes::from(key), value))
}

/// Index of the first entry whose key is >= `target`, `num_keys` if none.
///
/// Binary search over the full-key checkpoints, then a forward walk of at
/// most one checkpoint interval.
fn leaf_lower_bound(leaf: &Block, target: &[u8], comparator: &dyn Comparator) -> Result<usize> {
    let num_keys = leaf.num_keys();

    // First checkpoint whose key is >= target
    let (mut lo, mut hi) = (0usize, num_keys.div_ceil(ENTRIES_PER_FULL_KEY));
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let key = reconstruct_key(leaf, mid * ENTRIES_PER_FULL_KEY)?;
        if comparator.compare(&key, target) == Ordering::Less {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    if lo == 0 {
        return Ok(0);
    }

    // The answer lies after checkpoint lo - 1 and no later than checkpoint lo
    let start = (lo - 1) * ENTRIES_PER_FULL_KEY;
    let end = (lo * ENTRIES_PER_FULL_KEY).min(num_keys);
    let mut key = reconstruct_key(leaf, start)?;
    let mut idx = start;
    while comparator.compare(&key, target) == Ordering::Less {
        idx += 1;
        if idx == end {
            break;
        }
        key = decode_at(leaf, idx, &key)?;
    }
    Ok(idx)
}
