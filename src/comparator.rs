//! Key ordering
//!
//! A comparator defines the total order of keys in the skiplist, in every
//! block and across a table. Returning `Ordering` keeps the contract to
//! exactly three outcomes.

use std::cmp::Ordering;
use std::fmt;

/// Total order over byte sequences
pub trait Comparator: Send + Sync {
    /// Compare two keys
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// Stable name, used in logs and debug output
    fn name(&self) -> &'static str;
}

impl fmt::Debug for dyn Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Comparator({})", self.name())
    }
}

/// Byte-lexicographic order (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct BytewiseComparator;

impl Comparator for BytewiseComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn name(&self) -> &'static str {
        "sdbkv.BytewiseComparator"
    }
}
