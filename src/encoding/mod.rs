//! Encoding Module
//!
//! Byte-level codecs shared by blocks and tables.
//!
//! ## VarInt Wire Format
//! ```text
//! ┌──────────────────────┬─────────────────────────────────────┐
//! │ value range          │ encoded form                        │
//! ├──────────────────────┼─────────────────────────────────────┤
//! │ 0 ..= 127            │ [value]                             │
//! │ 128 ..= 65535        │ [0xFE][u16 big-endian]              │
//! │ 65536 ..= u32::MAX   │ [0xFC][u32 big-endian]              │
//! │ above                │ [0xF8][u64 big-endian]              │
//! └──────────────────────┴─────────────────────────────────────┘
//! ```
//! The flag byte read as `i8` is `-2`, `-4` or `-8`: the number of bytes
//! that follow.
//!
//! ## Differential Keys
//! ```text
//! full key:     [0x00][key bytes]
//! differential: [shared prefix len (1..=127)][suffix bytes]
//! ```
//! A full key is a differential key sharing nothing with its predecessor,
//! so one decoder handles both.

pub mod prefix;
pub mod varint;

pub use prefix::{
    decode_differential_key, encode_differential_key, encode_full_key, is_full_key,
    FULL_KEY_MARKER, MAX_SHARED_PREFIX,
};
pub use varint::{append_varint, parse_varint, varint_len, MAX_VARINT_LEN};

/// Read a little-endian u32 at `off`, if the buffer holds it
pub(crate) fn read_u32_le(buf: &[u8], off: usize) -> Option<u32> {
    let bytes = buf.get(off..off.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Write a little-endian u32 at `off`. The caller has checked the bounds.
pub(crate) fn write_u32_le(buf: &mut [u8], off: usize, value: u32) {
    buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
}
