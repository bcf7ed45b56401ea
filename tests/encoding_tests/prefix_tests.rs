//! Tests for differential key encoding

use sdbkv::encoding::{
    decode_differential_key, encode_differential_key, encode_full_key, is_full_key,
    MAX_SHARED_PREFIX,
};
use sdbkv::SdbError;

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_full_key() {
    let encoded = encode_full_key(b"apple");
    assert_eq!(encoded, b"\0apple");
    assert!(is_full_key(&encoded));
    assert_eq!(decode_differential_key(b"ignored", &encoded).unwrap(), b"apple");
}

#[test]
fn test_shared_prefix() {
    let encoded = encode_differential_key(b"apple", b"apply");
    assert_eq!(encoded, b"\x04y");
    assert!(!is_full_key(&encoded));
    assert_eq!(decode_differential_key(b"apple", &encoded).unwrap(), b"apply");
}

#[test]
fn test_nothing_shared_looks_like_full_key() {
    let encoded = encode_differential_key(b"apple", b"banana");
    assert_eq!(encoded, b"\0banana");
    assert_eq!(decode_differential_key(b"apple", &encoded).unwrap(), b"banana");
}

#[test]
fn test_shared_prefix_capped() {
    let prev = vec![b'x'; 300];
    let mut cur = prev.clone();
    cur.push(b'y');

    let encoded = encode_differential_key(&prev, &cur);
    assert_eq!(encoded[0] as usize, MAX_SHARED_PREFIX);
    assert_eq!(encoded.len(), 1 + cur.len() - MAX_SHARED_PREFIX);
    assert_eq!(decode_differential_key(&prev, &encoded).unwrap(), cur);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_decode_errors() {
    assert!(matches!(
        decode_differential_key(b"abc", b""),
        Err(SdbError::Corruption(_))
    ));
    // Shares more than the previous key has
    assert!(matches!(
        decode_differential_key(b"ab", b"\x05z"),
        Err(SdbError::Corruption(_))
    ));
}
