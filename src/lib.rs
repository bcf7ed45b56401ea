//! # sdbkv
//!
//! The data path of a log-structured merge key-value store:
//! - Arena backed skiplist memtable with insert-if-absent writes
//! - Compact block format with varint lengths and an offset array
//! - Tables of prefix-compressed leaf blocks under one index block
//! - Pluggable key ordering through a comparator
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Skiplist                             │
//! │        (index towers, branching factor 8, LevelGenerator)   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ key/value bytes
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                         Arena                               │
//! │               (fixed-size bump-allocated blocks)            │
//! └─────────────────────────────────────────────────────────────┘
//!                       │ sorted iteration (flush)
//!                       ▼
//!               ┌───────────────┐        ┌─────────────┐
//!               │ TableBuilder  │───────▶│    Sink     │
//!               │ (leaf + index │        │ (Vec, File) │
//!               │    blocks)    │        └─────────────┘
//!               └───────────────┘
//!                       │ file image
//!                       ▼
//!               ┌───────────────┐
//!               │ Table         │
//!               │ TableIterator │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod comparator;
pub mod config;
pub mod error;

pub mod encoding;
pub mod iterator;
pub mod memtable;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use comparator::{BytewiseComparator, Comparator};
pub use config::{Config, ConfigBuilder};
pub use error::{Result, SdbError};
pub use iterator::KvIterator;
pub use memtable::{Arena, LevelGenerator, Skiplist};
pub use storage::{Block, BlockBuilder, FileSink, Sink, Table, TableBuilder, TableInfo};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of sdbkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
