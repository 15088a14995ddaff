//! Unit tests for HashTableMap.

use arenamap::{HashTableMap, MapError};
use rstest::rstest;
use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasherDefault, Hash, Hasher};

/// Proxies a `u64` key for itself, so a key's bucket is exactly the key
/// modulo the bucket count. Only used where tests pin bucket placement.
#[derive(Default)]
struct KeyHasher(u64);

impl Hasher for KeyHasher {
    fn write(&mut self, bytes: &[u8]) {
        assert_eq!(8, bytes.len()); // only accept u64 keys
        for byte in bytes.iter().rev() {
            self.0 = (self.0 << 8) | u64::from(*byte);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

type KeyHashed<V> = HashTableMap<u64, V, BuildHasherDefault<KeyHasher>>;

// =============================================================================
// Basic Construction Tests
// =============================================================================

#[rstest]
fn test_new_creates_empty_map() {
    let map: HashTableMap<i32, String> = HashTableMap::new();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
}

#[rstest]
fn test_default_creates_empty_map() {
    let map: HashTableMap<i32, String> = HashTableMap::default();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
}

#[rstest]
fn test_from_pair_list_last_write_wins() {
    let map = HashTableMap::from([("a", 1), ("a", 2), ("b", 3)]);
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&"a"), Some(&2));
    assert_eq!(map.get(&"b"), Some(&3));
}

// =============================================================================
// Insert and Get Tests
// =============================================================================

#[rstest]
fn test_insert_and_get() {
    let mut map = HashTableMap::new();
    assert_eq!(map.insert(1, "one"), None);
    assert_eq!(map.insert(2, "two"), None);

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&1), Some(&"one"));
    assert_eq!(map.get(&2), Some(&"two"));
    assert_eq!(map.get(&3), None);
}

#[rstest]
fn test_insert_overwrites_in_place() {
    let mut map = HashTableMap::new();
    assert_eq!(map.insert(1, "one"), None);
    assert_eq!(map.insert(1, "ONE"), Some("one"));

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&1), Some(&"ONE"));
}

#[rstest]
fn test_get_mut_updates_value() {
    let mut map = HashTableMap::new();
    map.insert(1, 10);

    if let Some(value) = map.get_mut(&1) {
        *value += 5;
    }
    assert_eq!(map.get(&1), Some(&15));
}

#[rstest]
fn test_contains_key() {
    let mut map = HashTableMap::new();
    map.insert("present", ());
    assert!(map.contains_key(&"present"));
    assert!(!map.contains_key(&"absent"));
}

#[rstest]
fn test_borrowed_key_lookup() {
    let mut map = HashTableMap::new();
    map.insert("hello".to_string(), 42);
    assert_eq!(map.get("hello"), Some(&42));
    assert_eq!(map.get("world"), None);
}

// =============================================================================
// Subscript (Insert-or-Get) Tests
// =============================================================================

#[rstest]
fn test_get_or_insert_default_materializes_entry() {
    let mut map: HashTableMap<&str, u32> = HashTableMap::new();
    *map.get_or_insert_default("count") += 1;
    *map.get_or_insert_default("count") += 1;

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&"count"), Some(&2));
}

#[rstest]
fn test_get_or_insert_with_preserves_existing_value() {
    let mut map = HashTableMap::new();
    map.insert(1, 100);

    let value = map.get_or_insert_with(1, || 0);
    assert_eq!(*value, 100);
    assert_eq!(map.len(), 1);
}

// =============================================================================
// Failing Lookup Tests
// =============================================================================

#[rstest]
fn test_value_of_present_key() {
    let mut map = HashTableMap::new();
    map.insert(1, "one");
    assert_eq!(map.value_of(&1), Ok(&"one"));
}

#[rstest]
fn test_value_of_absent_key_fails() {
    let map: HashTableMap<i32, &str> = HashTableMap::new();
    assert_eq!(map.value_of(&1), Err(MapError::NotFound));
}

#[rstest]
fn test_value_of_mut_updates_value() {
    let mut map = HashTableMap::new();
    map.insert(1, 10);
    *map.value_of_mut(&1).unwrap() += 1;
    assert_eq!(map.get(&1), Some(&11));
    assert_eq!(map.value_of_mut(&2), Err(MapError::NotFound));
}

// =============================================================================
// Removal Tests
// =============================================================================

#[rstest]
fn test_remove_returns_entry() {
    let mut map = HashTableMap::new();
    map.insert(1, "one");
    map.insert(2, "two");

    assert_eq!(map.remove(&1), Ok((1, "one")));
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&1), None);
    assert_eq!(map.get(&2), Some(&"two"));
}

#[rstest]
fn test_remove_absent_key_fails() {
    let mut map: HashTableMap<i32, &str> = HashTableMap::new();
    assert_eq!(map.remove(&1), Err(MapError::NotFound));
}

#[rstest]
fn test_remove_all_leaves_empty_map() {
    let mut map = HashTableMap::new();
    for key in 0..20 {
        map.insert(key, key * 2);
    }
    for key in 0..20 {
        assert!(map.remove(&key).is_ok());
    }
    assert!(map.is_empty());
    assert_eq!(map, HashTableMap::new());
}

#[rstest]
fn test_slot_reuse_after_removal() {
    let mut map = HashTableMap::new();
    map.insert(1, "one");
    map.remove(&1).unwrap();
    map.insert(2, "two");

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&2), Some(&"two"));
}

// =============================================================================
// Bucket Placement Tests (identity-style hasher)
// =============================================================================

#[rstest]
fn test_colliding_keys_share_a_bucket_in_insertion_order() {
    let mut map: KeyHashed<&str> = KeyHashed::default();
    map.insert(1, "one");
    map.insert(11, "eleven");

    assert_eq!(map.bucket_of(&1), 1);
    assert_eq!(map.bucket_of(&11), 1);
    assert_eq!(map.bucket_len(1), Some(2));

    let keys: Vec<u64> = map.keys().copied().collect();
    assert_eq!(keys, vec![1, 11]);
}

#[rstest]
fn test_removing_one_colliding_key_keeps_the_other() {
    let mut map: KeyHashed<&str> = KeyHashed::default();
    map.insert(1, "one");
    map.insert(11, "eleven");

    assert_eq!(map.remove(&1), Ok((1, "one")));
    assert_eq!(map.bucket_len(1), Some(1));
    assert_eq!(map.get(&11), Some(&"eleven"));
}

#[rstest]
fn test_traversal_visits_buckets_in_index_order() {
    let mut map: KeyHashed<u64> = KeyHashed::default();
    // Bucket 1 chain in insertion order, then bucket 5.
    map.insert(21, 0);
    map.insert(5, 0);
    map.insert(11, 0);
    map.insert(1, 0);

    let keys: Vec<u64> = map.keys().copied().collect();
    assert_eq!(keys, vec![21, 11, 1, 5]);
}

#[rstest]
fn test_overwrite_keeps_chain_position() {
    let mut map: KeyHashed<&str> = KeyHashed::default();
    map.insert(1, "one");
    map.insert(11, "eleven");
    map.insert(1, "ONE");

    let keys: Vec<u64> = map.keys().copied().collect();
    assert_eq!(keys, vec![1, 11]);
    assert_eq!(map.get(&1), Some(&"ONE"));
}

#[rstest]
fn test_bucket_len_out_of_range() {
    let map: HashTableMap<i32, i32> = HashTableMap::new();
    assert_eq!(map.bucket_len(HashTableMap::<i32, i32>::BUCKET_COUNT), None);
}

// =============================================================================
// Equality and Hashing Tests
// =============================================================================

#[rstest]
fn test_equal_contents_regardless_of_insertion_order() {
    let mut first = HashTableMap::new();
    first.insert(1, "one");
    first.insert(2, "two");
    first.insert(3, "three");

    let mut second = HashTableMap::new();
    second.insert(3, "three");
    second.insert(1, "one");
    second.insert(2, "two");

    assert_eq!(first, second);
}

#[rstest]
fn test_equal_contents_with_colliding_keys_in_either_chain_order() {
    // 4 and 14 share bucket 4; each insertion order yields a different
    // chain order but the same contents.
    let mut first: KeyHashed<i32> = KeyHashed::default();
    first.insert(4, 0);
    first.insert(14, 0);

    let mut second: KeyHashed<i32> = KeyHashed::default();
    second.insert(14, 0);
    second.insert(4, 0);

    assert_eq!(first.bucket_of(&4), first.bucket_of(&14));
    assert_ne!(
        first.keys().copied().collect::<Vec<u64>>(),
        second.keys().copied().collect::<Vec<u64>>()
    );
    assert_eq!(first, second);
}

#[rstest]
fn test_colliding_keys_hash_equally_in_either_chain_order() {
    let mut first: KeyHashed<i32> = KeyHashed::default();
    first.insert(4, 0);
    first.insert(14, 0);

    let mut second: KeyHashed<i32> = KeyHashed::default();
    second.insert(14, 0);
    second.insert(4, 0);

    let mut first_state = DefaultHasher::new();
    first.hash(&mut first_state);
    let mut second_state = DefaultHasher::new();
    second.hash(&mut second_state);

    assert_eq!(first, second);
    assert_eq!(first_state.finish(), second_state.finish());
}

#[rstest]
fn test_unequal_on_different_values() {
    let first = HashTableMap::from([(1, "one")]);
    let second = HashTableMap::from([(1, "ONE")]);
    assert_ne!(first, second);
}

#[rstest]
fn test_unequal_on_different_sizes() {
    let first = HashTableMap::from([(1, "one")]);
    let second = HashTableMap::from([(1, "one"), (2, "two")]);
    assert_ne!(first, second);
}

#[rstest]
fn test_equal_maps_hash_equally() {
    let first = HashTableMap::from([(1, "one"), (2, "two")]);
    let mut second = HashTableMap::new();
    second.insert(2, "two");
    second.insert(1, "one");

    let mut first_state = DefaultHasher::new();
    first.hash(&mut first_state);
    let mut second_state = DefaultHasher::new();
    second.hash(&mut second_state);

    assert_eq!(first, second);
    assert_eq!(first_state.finish(), second_state.finish());
}

// =============================================================================
// Clone and Clear Tests
// =============================================================================

#[rstest]
fn test_clone_is_equal_and_independent() {
    let mut original = HashTableMap::new();
    original.insert(1, "one");
    original.insert(2, "two");

    let mut copy = original.clone();
    assert_eq!(original, copy);

    copy.insert(3, "three");
    assert_eq!(original.len(), 2);
    assert_eq!(copy.len(), 3);
    assert_ne!(original, copy);
}

#[rstest]
fn test_clear_empties_the_map() {
    let mut map = HashTableMap::from([(1, "one"), (2, "two")]);
    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.get(&1), None);
}

// =============================================================================
// Cursor Tests
// =============================================================================

#[rstest]
fn test_cursor_front_equals_end_on_empty_map() {
    let map: HashTableMap<i32, i32> = HashTableMap::new();
    assert_eq!(map.cursor_front(), map.cursor_end());
    assert!(map.cursor_front().is_end());
}

#[rstest]
fn test_end_cursor_dereference_fails() {
    let map: HashTableMap<i32, i32> = HashTableMap::new();
    let cursor = map.cursor_end();
    assert_eq!(cursor.entry(), Err(MapError::NotFound));
    assert_eq!(cursor.key(), Err(MapError::NotFound));
    assert_eq!(cursor.value(), Err(MapError::NotFound));
}

#[rstest]
fn test_cursor_walks_every_entry() {
    let mut map: KeyHashed<u64> = KeyHashed::default();
    map.insert(1, 10);
    map.insert(11, 110);
    map.insert(5, 50);

    let mut seen = Vec::new();
    let mut cursor = map.cursor_front();
    while !cursor.is_end() {
        let (key, value) = cursor.entry().unwrap();
        seen.push((*key, *value));
        cursor.move_next().unwrap();
    }
    assert_eq!(seen, vec![(1, 10), (11, 110), (5, 50)]);
}

#[rstest]
fn test_move_next_past_end_fails() {
    let mut map = HashTableMap::new();
    map.insert(1, "one");

    let mut cursor = map.cursor_front();
    cursor.move_next().unwrap();
    assert!(cursor.is_end());
    assert_eq!(cursor.move_next(), Err(MapError::InvalidPosition));
}

#[rstest]
fn test_move_prev_before_begin_fails() {
    let mut map = HashTableMap::new();
    map.insert(1, "one");

    let mut cursor = map.cursor_front();
    assert_eq!(cursor.move_prev(), Err(MapError::InvalidPosition));
}

#[rstest]
fn test_move_prev_from_end_lands_on_last_entry() {
    let mut map: KeyHashed<&str> = KeyHashed::default();
    map.insert(3, "three");
    map.insert(7, "seven");

    let mut cursor = map.cursor_end();
    cursor.move_prev().unwrap();
    assert_eq!(cursor.key(), Ok(&7));
}

#[rstest]
fn test_move_prev_from_end_of_empty_map_fails() {
    let map: HashTableMap<i32, i32> = HashTableMap::new();
    let mut cursor = map.cursor_end();
    assert_eq!(cursor.move_prev(), Err(MapError::InvalidPosition));
}

#[rstest]
fn test_cursor_step_round_trip() {
    let mut map: KeyHashed<u64> = KeyHashed::default();
    map.insert(2, 20);
    map.insert(12, 120);
    map.insert(7, 70);

    // Start strictly between begin and end.
    let mut cursor = map.cursor_front();
    cursor.move_next().unwrap();
    let middle = cursor;

    cursor.move_next().unwrap();
    cursor.move_prev().unwrap();
    assert_eq!(cursor, middle);

    cursor.move_prev().unwrap();
    cursor.move_next().unwrap();
    assert_eq!(cursor, middle);
}

#[rstest]
fn test_cursors_from_different_maps_are_unequal() {
    let first = HashTableMap::from([(1, "one")]);
    let second = HashTableMap::from([(1, "one")]);
    assert_eq!(first, second);
    assert_ne!(first.cursor_front(), second.cursor_front());
}

#[rstest]
fn test_cursor_debug_shows_position() {
    let mut map = HashTableMap::new();
    map.insert(1, "one");

    let rendered = format!("{:?}", map.cursor_front());
    assert!(rendered.starts_with("HashTableMapCursor"));
    assert!(rendered.contains("bucket_index"));

    let end = format!("{:?}", map.cursor_end());
    assert!(end.contains("node_index: None"));
}

#[rstest]
fn test_find_returns_cursor_or_end() {
    let mut map = HashTableMap::new();
    map.insert(1, "one");

    assert_eq!(map.find(&1).entry(), Ok((&1, &"one")));
    assert!(map.find(&2).is_end());
}

// =============================================================================
// Mutable Cursor Tests
// =============================================================================

#[rstest]
fn test_cursor_mut_updates_values_in_place() {
    let mut map = HashTableMap::new();
    map.insert(1, 10);
    map.insert(2, 20);

    let mut cursor = map.cursor_front_mut();
    while !cursor.is_end() {
        *cursor.value_mut().unwrap() += 1;
        cursor.move_next().unwrap();
    }

    assert_eq!(map.get(&1), Some(&11));
    assert_eq!(map.get(&2), Some(&21));
}

#[rstest]
fn test_remove_current_advances_to_following_entry() {
    let mut map: KeyHashed<&str> = KeyHashed::default();
    map.insert(1, "one");
    map.insert(11, "eleven");

    let mut cursor = map.cursor_front_mut();
    assert_eq!(cursor.remove_current(), Ok((1, "one")));
    assert_eq!(cursor.entry(), Ok((&11, &"eleven")));

    assert_eq!(cursor.remove_current(), Ok((11, "eleven")));
    assert!(cursor.is_end());
    assert_eq!(cursor.remove_current(), Err(MapError::InvalidPosition));
}

#[rstest]
fn test_find_mut_then_remove() {
    let mut map = HashTableMap::new();
    map.insert(1, "one");
    map.insert(2, "two");

    let mut cursor = map.find_mut(&1);
    assert_eq!(cursor.remove_current(), Ok((1, "one")));

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&2), Some(&"two"));
}

#[rstest]
fn test_find_mut_absent_key_is_end() {
    let mut map: HashTableMap<i32, i32> = HashTableMap::new();
    let mut cursor = map.find_mut(&1);
    assert!(cursor.is_end());
    assert_eq!(cursor.remove_current(), Err(MapError::InvalidPosition));
}

#[rstest]
fn test_cursor_mut_reborrows_as_read_only() {
    let mut map = HashTableMap::new();
    map.insert(1, "one");

    let cursor = map.cursor_front_mut();
    let read_only = cursor.as_cursor();
    assert_eq!(read_only.entry(), Ok((&1, &"one")));
}

// =============================================================================
// Iterator Tests
// =============================================================================

#[rstest]
fn test_iter_is_exact_size() {
    let map = HashTableMap::from([(1, "one"), (2, "two"), (3, "three")]);
    let iterator = map.iter();
    assert_eq!(iterator.len(), 3);
    assert_eq!(iterator.count(), 3);
}

#[rstest]
fn test_iter_rev_matches_reversed_forward_order() {
    let mut map: KeyHashed<u64> = KeyHashed::default();
    for key in [4, 14, 9, 2] {
        map.insert(key, key);
    }

    let forward: Vec<u64> = map.keys().copied().collect();
    let mut backward: Vec<u64> = map.iter().rev().map(|(key, _)| *key).collect();
    backward.reverse();
    assert_eq!(forward, backward);
}

#[rstest]
fn test_iter_from_both_ends_meets_in_the_middle() {
    let mut map: KeyHashed<u64> = KeyHashed::default();
    map.insert(1, 1);
    map.insert(2, 2);
    map.insert(3, 3);

    let mut iterator = map.iter();
    assert_eq!(iterator.next().map(|(key, _)| *key), Some(1));
    assert_eq!(iterator.next_back().map(|(key, _)| *key), Some(3));
    assert_eq!(iterator.next().map(|(key, _)| *key), Some(2));
    assert_eq!(iterator.next(), None);
    assert_eq!(iterator.next_back(), None);
}

#[rstest]
fn test_into_iter_yields_owned_entries_in_traversal_order() {
    let mut map: KeyHashed<String> = KeyHashed::default();
    map.insert(1, "one".to_string());
    map.insert(11, "eleven".to_string());

    let entries: Vec<(u64, String)> = map.into_iter().collect();
    assert_eq!(
        entries,
        vec![(1, "one".to_string()), (11, "eleven".to_string())]
    );
}

#[rstest]
fn test_values_iterator() {
    let map = HashTableMap::from([(1, 10), (2, 20)]);
    let total: i32 = map.values().sum();
    assert_eq!(total, 30);
}

// =============================================================================
// Formatting Tests
// =============================================================================

#[rstest]
fn test_display_single_entry() {
    let map = HashTableMap::from([(1, "one")]);
    assert_eq!(format!("{map}"), "{1: one}");
}

#[rstest]
fn test_display_empty_map() {
    let map: HashTableMap<i32, i32> = HashTableMap::new();
    assert_eq!(format!("{map}"), "{}");
}

#[rstest]
fn test_debug_single_entry() {
    let map = HashTableMap::from([(1, 10)]);
    assert_eq!(format!("{map:?}"), "{1: 10}");
}
