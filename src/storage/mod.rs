//! Storage Module
//!
//! On-disk layout of immutable sorted data.
//!
//! ## Responsibilities
//! - Pack sorted entries into blocks with an offset array for binary search
//! - Group leaf blocks under one index block to form a table
//! - Shrink keys with differential (shared prefix) encoding
//! - Write finished tables through a [`Sink`]
//!
//! ## Block Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Entries                                │
//! │ ┌────────┬────────┬─────┬───────────┐  │
//! │ │KeyLen  │ValLen  │ Key │   Value   │  │
//! │ │(varint)│(varint)│     │           │  │
//! │ └────────┴────────┴─────┴───────────┘  │
//! │ ... (repeated for each entry)          │
//! ├────────────────────────────────────────┤
//! │ Zero padding to an 8-byte boundary     │
//! ├────────────────────────────────────────┤
//! │ Offset Array (u32 LE per entry)        │
//! ├────────────────────────────────────────┤
//! │ Trailer                                │
//! │ ┌──────────┬──────────┬─────────────┐  │
//! │ │DataSize 4│NumKeys 4 │ Restart 4   │  │
//! │ └──────────┴──────────┴─────────────┘  │
//! └────────────────────────────────────────┘
//! ```

pub mod block;
pub mod sink;
pub mod table;

pub use block::{Block, BlockBuilder, BlockHandle, BlockIterator};
pub use sink::{FileSink, Sink};
pub use table::{Table, TableBuilder, TableInfo, TableIterator};
