//! Table Module
//!
//! Immutable sorted table built from blocks: many leaf blocks holding
//! prefix-compressed keys and one index block mapping the last key of each
//! leaf to where that leaf ends.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Leaf Region                                             │
//! │   [Leaf Block 1][Leaf Block 2] ... [Leaf Block N]       │
//! │   keys: [0][full key] every 8th entry (1st of a leaf),  │
//! │         [shared len][suffix] otherwise                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Index Block                                             │
//! │   key   = last full key of leaf i                       │
//! │   value = end offset of leaf i in the leaf region       │
//! │           (u32 LE)                                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! The index block is found from the end of the file: its trailer gives the
//! restart offset and key count, hence its length.

mod builder;
mod iterator;
mod reader;

pub use builder::TableBuilder;
pub use iterator::TableIterator;
pub use reader::Table;

// =============================================================================
// Shared Constants (used by builder, reader, iterator)
// =============================================================================

/// A full key is stored every this many entries of a leaf
pub const ENTRIES_PER_FULL_KEY: usize = 8;

/// A leaf block is finished once it holds this many entries
pub const ENTRIES_PER_LEAF: usize = 512;

/// Size of an index value (leaf end offset)
pub(crate) const INDEX_VALUE_SIZE: usize = 4;

// =============================================================================
// Table Metadata
// =============================================================================

/// Summary of a table written by [`TableBuilder::finish`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInfo {
    /// Number of key/value entries
    pub num_entries: u64,
    /// Number of leaf blocks (= index entries)
    pub num_leaves: u64,
    /// Bytes of the leaf region
    pub leaf_size: u64,
    /// Bytes of the index block
    pub index_size: u64,
    /// Total bytes appended to the sink
    pub file_size: u64,
}
