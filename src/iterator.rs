//! Positional iterator over sorted key/value entries
//!
//! Shared by blocks and tables. Unlike `std::iter::Iterator` it moves in
//! both directions and can be repositioned with a seek.
//!
//! ## Position Model
//! ```text
//!   -1      0      1     ...    n-1      n
//!  before  first                last    past
//!  (invalid)                           (invalid)
//! ```
//! `seek_to_last` lands on `n`, one past the last entry: call `prev()` once
//! to reach it. `next`/`prev` never clamp.

use bytes::Bytes;

pub trait KvIterator {
    /// Whether the iterator is positioned on an entry
    fn valid(&self) -> bool;

    /// Position on the first entry (invalid if there are none)
    fn seek_to_first(&mut self);

    /// Position one past the last entry
    fn seek_to_last(&mut self);

    /// Position on the first entry whose key is >= `target`
    fn seek(&mut self, target: &[u8]);

    fn next(&mut self);

    fn prev(&mut self);

    /// Key at the current position. Panics if `!valid()`.
    fn key(&self) -> Bytes;

    /// Value at the current position. Panics if `!valid()`.
    fn value(&self) -> Bytes;
}
