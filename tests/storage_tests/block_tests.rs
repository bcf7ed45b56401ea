//! Tests for blocks
//!
//! These tests verify:
//! - Building, finishing and decoding blocks
//! - Several blocks sharing one buffer
//! - Iterator positioning (first, last, seek, next, prev)
//! - BufferBound without partial writes
//! - Corruption detection on decode

use std::sync::Arc;

use bytes::Bytes;
use sdbkv::storage::block::{Block, BlockBuilder, RESTART_ALIGNMENT, TRAILER_SIZE};
use sdbkv::{BytewiseComparator, KvIterator, SdbError};

// =============================================================================
// Helper Functions
// =============================================================================

/// Block with keys "100".."104" and values "v100".."v104"
fn sample_block() -> Block {
    let mut builder = BlockBuilder::with_capacity(4096);
    for i in 100..105 {
        builder
            .add(i.to_string().as_bytes(), format!("v{}", i).as_bytes())
            .unwrap();
    }
    builder.build().unwrap()
}

fn keys_forward(block: &Block) -> Vec<String> {
    let mut iter = block.iter(Arc::new(BytewiseComparator));
    let mut keys = Vec::new();
    iter.seek_to_first();
    while iter.valid() {
        keys.push(String::from_utf8(iter.key().to_vec()).unwrap());
        iter.next();
    }
    keys
}

// =============================================================================
// Builder Tests
// =============================================================================

#[test]
fn test_build_layout() {
    let block = sample_block();
    let handle = block.handle();

    assert_eq!(handle.num_keys, 5);
    assert_eq!(handle.first_offset, 0);
    // Each entry: 1 + 1 + 3 + 4 bytes
    assert_eq!(handle.data_size, 45);
    assert_eq!(handle.restart_offset, 48);
    assert_eq!(handle.restart_offset as usize % RESTART_ALIGNMENT, 0);
    assert_eq!(handle.last_offset as usize, 48 + 5 * 4 + TRAILER_SIZE);

    let (key, value) = block.entry(2).unwrap();
    assert_eq!(&key[..], b"102");
    assert_eq!(&value[..], b"v102");
}

#[test]
fn test_padding_is_zero() {
    let block = sample_block();
    let bytes = block.as_bytes();
    assert!(bytes[45..48].iter().all(|&b| b == 0));
}

#[test]
fn test_add_buffer_bound_leaves_builder_untouched() {
    let mut builder = BlockBuilder::with_capacity(16);
    let err = builder.add(b"0123456789", b"0123456789").unwrap_err();
    assert!(matches!(err, SdbError::BufferBound { needed: 22, available: 16 }));
    assert_eq!(builder.num_keys(), 0);
    assert_eq!(builder.offset(), 0);
}

#[test]
fn test_finish_buffer_bound() {
    // Room for one 4-byte entry but not for padding + offset + trailer
    let mut builder = BlockBuilder::with_capacity(20);
    builder.add(b"k", b"v").unwrap();
    assert!(!builder.fits(1, 1));

    let err = builder.finish().unwrap_err();
    assert!(err.is_buffer_bound());
    assert_eq!(builder.num_keys(), 1);
}

#[test]
fn test_fits() {
    let mut builder = BlockBuilder::with_capacity(24);
    assert!(builder.fits(1, 1));
    builder.add(b"k", b"v").unwrap();
    assert!(!builder.fits(1, 1));
    assert!(builder.finish().is_ok());
}

#[test]
fn test_empty_block() {
    let block = BlockBuilder::with_capacity(64).build().unwrap();
    assert!(block.is_empty());
    assert_eq!(block.handle().last_offset as usize, TRAILER_SIZE);

    let mut iter = block.iter(Arc::new(BytewiseComparator));
    iter.seek_to_first();
    assert!(!iter.valid());
    iter.seek_to_last();
    iter.prev();
    assert!(!iter.valid());
}

// =============================================================================
// Decode Tests
// =============================================================================

#[test]
fn test_decode_matches_builder() {
    let mut builder = BlockBuilder::with_capacity(4096);
    builder.add(b"alpha", b"1").unwrap();
    builder.add(b"beta", b"22").unwrap();
    let handle = builder.finish().unwrap();

    let data = Bytes::from(builder.into_buffer());
    let block = Block::decode(data, handle.last_offset as usize).unwrap();
    assert_eq!(block.handle(), handle);
    assert_eq!(&block.key_at(1)[..], b"beta");
    assert_eq!(&block.value_at(1)[..], b"22");
}

#[test]
fn test_blocks_back_to_back() {
    let mut builder = BlockBuilder::with_capacity(4096);
    builder.add(b"a", b"1").unwrap();
    builder.add(b"b", b"2").unwrap();
    let first = builder.finish().unwrap();

    builder.add(b"c", b"3").unwrap();
    let second = builder.finish().unwrap();
    assert_eq!(second.first_offset, first.last_offset);

    let data = Bytes::from(builder.into_buffer());
    let a = Block::decode(data.clone(), first.last_offset as usize).unwrap();
    let b = Block::decode(data, second.last_offset as usize).unwrap();

    assert_eq!(keys_forward(&a), vec!["a", "b"]);
    assert_eq!(keys_forward(&b), vec!["c"]);
    assert_eq!(b.handle(), second);
}

#[test]
fn test_empty_block_after_another_decodes_to_same_handle() {
    let mut builder = BlockBuilder::with_capacity(4096);
    builder.add(b"a", b"1").unwrap();
    builder.add(b"b", b"2").unwrap();
    let first = builder.finish().unwrap();
    assert_eq!(first.last_offset, 28);

    let empty = builder.finish().unwrap();
    assert_eq!(empty.num_keys, 0);
    assert_eq!(empty.first_offset, 32);
    assert_eq!(empty.restart_offset, 32);
    assert_eq!(empty.last_offset, 32 + TRAILER_SIZE as u32);

    let data = Bytes::from(builder.into_buffer());
    let block = Block::decode(data, empty.last_offset as usize).unwrap();
    assert!(block.is_empty());
    assert_eq!(block.handle(), empty);
}

#[test]
fn test_corruption_message_names_kind_once() {
    let block = sample_block();
    let end = block.handle().last_offset as usize;
    let mut bad = block.as_bytes().to_vec();

    // A varint flag byte no encoder writes
    bad[0] = 0xFF;
    let err = Block::decode(Bytes::from(bad), end).unwrap_err();
    assert!(matches!(err, SdbError::Corruption(_)));

    let msg = err.to_string();
    assert_eq!(msg.matches("Corruption detected").count(), 1);
    assert!(msg.contains("entry at 0"));
    assert!(msg.contains("invalid varint flag"));
}

#[test]
fn test_decode_corruption() {
    let block = sample_block();
    let end = block.handle().last_offset as usize;
    let good = block.as_bytes().to_vec();

    // End offset past the buffer
    assert!(matches!(
        Block::decode(Bytes::from(good.clone()), end + 1),
        Err(SdbError::Corruption(_))
    ));

    // Misaligned restart offset
    let mut bad = good.clone();
    bad[end - 4] += 1;
    assert!(matches!(
        Block::decode(Bytes::from(bad), end),
        Err(SdbError::Corruption(_))
    ));

    // Key count that does not match the offset array
    let mut bad = good.clone();
    bad[end - 8] += 1;
    assert!(matches!(
        Block::decode(Bytes::from(bad), end),
        Err(SdbError::Corruption(_))
    ));

    // Key length running past the data region
    let mut bad = good.clone();
    bad[0] = 100;
    assert!(matches!(
        Block::decode(Bytes::from(bad), end),
        Err(SdbError::Corruption(_))
    ));

    // Too short for a trailer
    assert!(Block::decode(Bytes::from_static(b"short"), 5).is_err());
}

// =============================================================================
// Iterator Tests
// =============================================================================

#[test]
fn test_iterate_forward() {
    assert_eq!(
        keys_forward(&sample_block()),
        vec!["100", "101", "102", "103", "104"]
    );
}

#[test]
fn test_iterate_backward() {
    let block = sample_block();
    let mut iter = block.iter(Arc::new(BytewiseComparator));

    iter.seek_to_last();
    assert!(!iter.valid());
    assert_eq!(iter.position(), 5);
    iter.prev();

    let mut keys = Vec::new();
    while iter.valid() {
        keys.push(iter.key());
        iter.prev();
    }
    assert_eq!(keys, vec!["104", "103", "102", "101", "100"]);
    assert_eq!(iter.position(), -1);
}

#[test]
fn test_seek() {
    let block = sample_block();
    let mut iter = block.iter(Arc::new(BytewiseComparator));

    iter.seek(b"103");
    assert!(iter.valid());
    assert_eq!(&iter.key()[..], b"103");
    assert_eq!(&iter.value()[..], b"v103");

    // Between keys lands on the next one
    iter.seek(b"1025");
    assert_eq!(&iter.key()[..], b"103");

    iter.seek(b"0");
    assert_eq!(&iter.key()[..], b"100");

    // Past the end, then back onto the last key
    iter.seek(b"2");
    assert!(!iter.valid());
    iter.prev();
    assert_eq!(&iter.key()[..], b"104");
}

#[test]
fn test_next_then_prev() {
    let block = sample_block();
    let mut iter = block.iter(Arc::new(BytewiseComparator));
    iter.seek_to_first();
    iter.next();
    iter.next();
    assert_eq!(&iter.key()[..], b"102");
    iter.prev();
    assert_eq!(&iter.key()[..], b"101");
}

#[test]
#[should_panic(expected = "invalid position")]
fn test_key_at_invalid_position_panics() {
    let block = sample_block();
    let mut iter = block.iter(Arc::new(BytewiseComparator));
    iter.seek_to_last();
    let _ = iter.key();
}
