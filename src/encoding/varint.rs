//! Variable-length unsigned integers
//!
//! Self-terminating encoding: small values take one byte, larger values a
//! flag byte followed by a fixed-width big-endian integer.

use crate::error::{Result, SdbError};

/// Longest encoding: flag byte + 8 value bytes
pub const MAX_VARINT_LEN: usize = 9;

const FLAG_U16: i8 = -2;
const FLAG_U32: i8 = -4;
const FLAG_U64: i8 = -8;

/// Number of bytes `value` occupies once encoded
pub fn varint_len(value: u64) -> usize {
    match value {
        0..=0x7f => 1,
        0x80..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Encode `value` into `buf` starting at `off`.
///
/// Returns the number of bytes written. Fails with `BufferBound` (leaving
/// `buf` untouched) if the encoding does not fit.
pub fn append_varint(buf: &mut [u8], off: usize, value: u64) -> Result<usize> {
    let size = varint_len(value);
    let available = buf.len().saturating_sub(off);
    if size > available {
        return Err(SdbError::BufferBound {
            needed: size,
            available,
        });
    }

    let dst = &mut buf[off..off + size];
    match size {
        1 => dst[0] = value as u8,
        3 => {
            dst[0] = FLAG_U16 as u8;
            dst[1..].copy_from_slice(&(value as u16).to_be_bytes());
        }
        5 => {
            dst[0] = FLAG_U32 as u8;
            dst[1..].copy_from_slice(&(value as u32).to_be_bytes());
        }
        _ => {
            dst[0] = FLAG_U64 as u8;
            dst[1..].copy_from_slice(&value.to_be_bytes());
        }
    }

    Ok(size)
}

/// Decode a value from `buf` starting at `off`.
///
/// Returns `(value, bytes consumed)`. Fails with `BufferBound` if the
/// encoding runs past the end of `buf`, and with `Corruption` on a flag byte
/// that no encoder produces.
pub fn parse_varint(buf: &[u8], off: usize) -> Result<(u64, usize)> {
    let flag = match buf.get(off) {
        Some(&b) => b as i8,
        None => {
            return Err(SdbError::BufferBound {
                needed: 1,
                available: 0,
            })
        }
    };

    if flag >= 0 {
        return Ok((flag as u64, 1));
    }

    let extra = match flag {
        FLAG_U16 => 2,
        FLAG_U32 => 4,
        FLAG_U64 => 8,
        other => {
            return Err(SdbError::Corruption(format!(
                "invalid varint flag 0x{:02x} at offset {}",
                other as u8, off
            )))
        }
    };

    let available = buf.len() - off;
    if extra + 1 > available {
        return Err(SdbError::BufferBound {
            needed: extra + 1,
            available,
        });
    }

    let value = buf[off + 1..off + 1 + extra]
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64);

    Ok((value, extra + 1))
}
