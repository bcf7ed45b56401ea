//! Error types for sdbkv
//!
//! Provides a unified error type for all fallible operations. Broken
//! contracts (oversized arena requests, stale arena handles, reading an
//! invalid iterator) are not represented here: they panic.

use thiserror::Error;

/// Result type alias using SdbError
pub type Result<T> = std::result::Result<T, SdbError>;

/// Unified error type for sdbkv operations
#[derive(Debug, Error)]
pub enum SdbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    /// The destination (or source) buffer is too small. Recoverable: retry
    /// with a larger buffer or start a new block.
    #[error("Buffer bound: need {needed} bytes, {available} available")]
    BufferBound { needed: usize, available: usize },

    /// A decoded block, table or varint is internally inconsistent
    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // MemTable Errors
    // -------------------------------------------------------------------------
    #[error("Arena exhausted: all {blocks} blocks in use")]
    ArenaExhausted { blocks: usize },

    // -------------------------------------------------------------------------
    // Table Errors
    // -------------------------------------------------------------------------
    #[error("Keys must be added in strictly ascending order")]
    OutOfOrder,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SdbError {
    /// Whether the caller may retry with more room (larger buffer, new block)
    pub fn is_buffer_bound(&self) -> bool {
        matches!(self, SdbError::BufferBound { .. })
    }

    /// Restate any error as `Corruption`, prefixed with where it was met.
    ///
    /// An inner `Corruption` contributes only its message.
    pub(crate) fn into_corruption(self, context: &str) -> SdbError {
        match self {
            SdbError::Corruption(msg) => SdbError::Corruption(format!("{}: {}", context, msg)),
            other => SdbError::Corruption(format!("{}: {}", context, other)),
        }
    }
}
