//! Differential (shared-prefix) key encoding
//!
//! Leaf blocks store each key relative to the key before it. Every few
//! entries a full key is written as a checkpoint so any key can be rebuilt
//! from a bounded backward scan.

use crate::error::{Result, SdbError};

/// Marker byte of a full-key checkpoint
pub const FULL_KEY_MARKER: u8 = 0;

/// The shared prefix length is stored in one byte and capped here
pub const MAX_SHARED_PREFIX: usize = 127;

/// Length of the common prefix of two keys
pub(crate) fn shared_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Whether an encoded key is a full-key checkpoint
pub fn is_full_key(encoded: &[u8]) -> bool {
    encoded.first() == Some(&FULL_KEY_MARKER)
}

/// Encode `key` as a checkpoint: `[0][key]`
pub fn encode_full_key(key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len() + 1);
    encode_full_key_into(key, &mut out);
    out
}

/// Encode `current` relative to `prev`: `[shared len][suffix]`
pub fn encode_differential_key(prev: &[u8], current: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    encode_differential_key_into(prev, current, &mut out);
    out
}

pub(crate) fn encode_full_key_into(key: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.push(FULL_KEY_MARKER);
    out.extend_from_slice(key);
}

pub(crate) fn encode_differential_key_into(prev: &[u8], current: &[u8], out: &mut Vec<u8>) {
    let shared = shared_prefix_len(prev, current).min(MAX_SHARED_PREFIX);
    out.clear();
    out.reserve(current.len() - shared + 1);
    out.push(shared as u8);
    out.extend_from_slice(&current[shared..]);
}

/// Rebuild the full key from the previous full key and an encoded key.
///
/// `prev` is ignored for checkpoints.
pub fn decode_differential_key(prev: &[u8], encoded: &[u8]) -> Result<Vec<u8>> {
    let (&shared, suffix) = encoded
        .split_first()
        .ok_or_else(|| SdbError::Corruption("empty differential key".to_string()))?;

    let shared = shared as usize;
    if shared > MAX_SHARED_PREFIX || shared > prev.len() {
        return Err(SdbError::Corruption(format!(
            "shared prefix {} exceeds previous key length {}",
            shared,
            prev.len()
        )));
    }

    let mut key = Vec::with_capacity(shared + suffix.len());
    key.extend_from_slice(&prev[..shared]);
    key.extend_from_slice(suffix);
    Ok(key)
}
