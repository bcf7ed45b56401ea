//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Fast inserts and point lookups in memory
//! - Insert-if-absent semantics (a key is written once per memtable)
//! - Ordered iteration for table creation
//! - Release all memory at once after a flush
//!
//! ## Data Structure Choice
//! A skiplist with branching factor 8 whose key/value bytes are bump
//! allocated from an arena:
//! - Ordered keys (required for table generation)
//! - No per-entry heap allocation for payload bytes
//! - One `clear()` frees everything
//!
//! Single writer only: every mutating call takes `&mut self`.

mod arena;
mod level;
mod skiplist;

pub use arena::{Arena, ArenaSlice};
pub use level::{LevelGenerator, BRANCHING_FACTOR};
pub use skiplist::{Skiplist, SkiplistIter};
