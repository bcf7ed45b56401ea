//! Tests for the skiplist memtable
//!
//! These tests verify:
//! - Put/get round trips and misses
//! - Insert-if-absent semantics on duplicate keys
//! - Sorted iteration regardless of insert order
//! - Custom comparators
//! - Clear and arena exhaustion

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sdbkv::{Comparator, Config, SdbError, Skiplist};

// =============================================================================
// Helper Functions
// =============================================================================

fn small_config() -> Config {
    Config::builder()
        .arena_block_size(64 * 1024)
        .arena_max_blocks(1024)
        .level_seed(17)
        .build()
}

fn new_list() -> Skiplist {
    Skiplist::with_config(&small_config()).unwrap()
}

/// Orders keys from largest to smallest
struct ReverseComparator;

impl Comparator for ReverseComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        b.cmp(a)
    }

    fn name(&self) -> &'static str {
        "test.Reverse"
    }
}

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_empty() {
    let list = new_list();
    assert!(list.is_empty());
    assert_eq!(list.get(b"anything"), None);
    assert_eq!(list.iter().count(), 0);
}

#[test]
fn test_put_and_get() {
    let mut list = new_list();
    assert_eq!(list.put(b"banana", b"yellow").unwrap(), None);
    assert_eq!(list.put(b"apple", b"red").unwrap(), None);
    assert_eq!(list.put(b"cherry", b"dark red").unwrap(), None);

    assert_eq!(list.len(), 3);
    assert_eq!(list.get(b"apple"), Some(&b"red"[..]));
    assert_eq!(list.get(b"banana"), Some(&b"yellow"[..]));
    assert_eq!(list.get(b"cherry"), Some(&b"dark red"[..]));
    assert_eq!(list.get(b"apricot"), None);
    assert!(list.contains_key(b"apple"));
    assert!(!list.contains_key(b"zzz"));
}

#[test]
fn test_empty_key_and_value() {
    let mut list = new_list();
    list.put(b"", b"empty key").unwrap();
    list.put(b"k", b"").unwrap();

    assert_eq!(list.get(b""), Some(&b"empty key"[..]));
    assert_eq!(list.get(b"k"), Some(&b""[..]));
}

#[test]
fn test_duplicate_put_keeps_first_value() {
    let mut list = new_list();
    assert_eq!(list.put(b"key", b"v1").unwrap(), None);
    assert_eq!(list.put(b"key", b"v2").unwrap(), Some(&b"v1"[..]));

    assert_eq!(list.len(), 1);
    assert_eq!(list.get(b"key"), Some(&b"v1"[..]));
}

#[test]
fn test_random_keys_match_btreemap() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut list = new_list();
    let mut model = BTreeMap::new();

    for _ in 0..5_000 {
        let key = format!("k{}", rng.gen_range(0..20_000u32)).into_bytes();
        let value = format!("v{}", rng.gen::<u32>()).into_bytes();
        let expected = model.get(&key).cloned();
        let previous = list.put(&key, &value).unwrap().map(|v| v.to_vec());
        assert_eq!(previous, expected);
        model.entry(key).or_insert(value);
    }

    assert_eq!(list.len(), model.len());
    for (key, value) in &model {
        assert_eq!(list.get(key), Some(value.as_slice()));
    }
    assert_eq!(list.get(b"k20000"), None);
    assert!(list.height() >= 2);
    list.check_invariants().unwrap();
}

#[test]
fn test_levels_stay_nested_while_growing() {
    let mut list = new_list();
    for i in (0..2_000).rev() {
        list.put(format!("{:05}", i * 7 % 2_000).as_bytes(), b"v").unwrap();
        if i % 250 == 0 {
            list.check_invariants().unwrap();
        }
    }
    assert_eq!(list.len(), 2_000);
    list.check_invariants().unwrap();
}

// =============================================================================
// Iteration Tests
// =============================================================================

#[test]
fn test_iter_sorted() {
    let mut list = new_list();
    for i in [5, 3, 9, 1, 7, 2, 8, 0, 6, 4] {
        list.put(format!("key{}", i).as_bytes(), format!("val{}", i).as_bytes())
            .unwrap();
    }

    let keys: Vec<Vec<u8>> = list.iter().map(|(k, _)| k.to_vec()).collect();
    let expected: Vec<Vec<u8>> = (0..10).map(|i| format!("key{}", i).into_bytes()).collect();
    assert_eq!(keys, expected);

    for (k, v) in list.iter() {
        assert_eq!(&k[3..], &v[3..]);
    }
}

#[test]
fn test_custom_comparator() {
    let config = Config::builder()
        .arena_block_size(4096)
        .level_seed(1)
        .comparator(Arc::new(ReverseComparator))
        .build();
    let mut list = Skiplist::with_config(&config).unwrap();
    for key in [b"b", b"d", b"a", b"c"] {
        list.put(key, b"x").unwrap();
    }

    let keys: Vec<&[u8]> = list.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![&b"d"[..], b"c", b"b", b"a"]);
    list.check_invariants().unwrap();
    assert_eq!(list.get(b"c"), Some(&b"x"[..]));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_clear() {
    let mut list = new_list();
    for i in 0..100 {
        list.put(format!("{:03}", i).as_bytes(), b"v").unwrap();
    }
    assert!(list.memory_usage() > 0);

    list.clear();
    assert!(list.is_empty());
    assert_eq!(list.height(), 0);
    assert_eq!(list.get(b"050"), None);
    assert_eq!(list.iter().count(), 0);

    // Usable again after clear
    list.put(b"050", b"again").unwrap();
    assert_eq!(list.get(b"050"), Some(&b"again"[..]));
}

#[test]
fn test_arena_exhaustion_surfaces() {
    let config = Config::builder()
        .arena_block_size(64)
        .arena_max_blocks(1)
        .build();
    let mut list = Skiplist::with_config(&config).unwrap();

    let mut result = Ok(None);
    for i in 0..100 {
        result = list
            .put(format!("key{:04}", i).as_bytes(), b"value")
            .map(|old| old.map(|v| v.to_vec()));
        if result.is_err() {
            break;
        }
    }
    assert!(matches!(result, Err(SdbError::ArenaExhausted { .. })));
}

#[test]
fn test_invalid_config() {
    let config = Config::builder().max_height(0).build();
    assert!(matches!(
        Skiplist::with_config(&config),
        Err(SdbError::Config(_))
    ));
}
