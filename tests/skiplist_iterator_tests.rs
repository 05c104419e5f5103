// Skip List Iterator tests
// Iterating the snapshot container in internal-key order.

use bytes::Bytes;
use prefix_hash_get::iterator::MemTableIterator;
use prefix_hash_get::memtable::skiplist::SkipList;
use prefix_hash_get::types::{InternalKey, LookupKey, ValueType};

fn ik(user_key: &str, seq: u64) -> InternalKey {
    InternalKey::new(user_key.as_bytes(), seq, ValueType::Value)
}

fn val(v: &str) -> Bytes {
    Bytes::copy_from_slice(v.as_bytes())
}

// =============================================================================
// Test 1: Empty iterator
// =============================================================================
#[test]
fn iterator_empty_skiplist_is_invalid() {
    let sl = SkipList::new();
    let mut iter = sl.iter();
    assert!(!iter.is_valid());
    iter.seek_to_last();
    assert!(!iter.is_valid());
}

// =============================================================================
// Test 2: Entries come out sorted: user key ascending, sequence descending
// =============================================================================
#[test]
fn iterator_returns_internal_key_order() {
    let mut sl = SkipList::new();
    sl.insert(ik("charlie", 3), val("3"));
    sl.insert(ik("alpha", 1), val("1"));
    sl.insert(ik("alpha", 9), val("9"));
    sl.insert(ik("bravo", 2), val("2"));

    let mut iter = sl.iter();
    let mut seen = Vec::new();
    while iter.is_valid() {
        seen.push((iter.key().user_key.clone(), iter.key().sequence, iter.value().clone()));
        iter.next();
    }

    assert_eq!(
        seen,
        vec![
            (b"alpha".to_vec(), 9, val("9")),
            (b"alpha".to_vec(), 1, val("1")),
            (b"bravo".to_vec(), 2, val("2")),
            (b"charlie".to_vec(), 3, val("3")),
        ]
    );
}

// =============================================================================
// Test 3: Seek with a lookup key lands on the newest visible version
// =============================================================================
#[test]
fn iterator_seek_lookup_key() {
    let mut sl = SkipList::new();
    sl.insert(ik("a", 1), val("a1"));
    sl.insert(ik("c", 3), val("c3"));
    sl.insert(ik("c", 6), val("c6"));
    sl.insert(ik("e", 5), val("e5"));

    let mut iter = sl.iter();

    iter.seek(&LookupKey::new(b"c".to_vec(), 10).internal_key());
    assert!(iter.is_valid());
    assert_eq!(iter.value(), &val("c6"));

    iter.seek(&LookupKey::new(b"c".to_vec(), 4).internal_key());
    assert_eq!(iter.value(), &val("c3"));

    // "b" doesn't exist, lands on the next user key
    iter.seek(&LookupKey::new(b"b".to_vec(), 100).internal_key());
    assert_eq!(iter.key().user_key, b"c".to_vec());

    iter.seek(&LookupKey::new(b"z".to_vec(), 100).internal_key());
    assert!(!iter.is_valid());
}

// =============================================================================
// Test 4: Backward iteration
// =============================================================================
#[test]
fn iterator_prev_and_seek_to_last() {
    let mut sl = SkipList::new();
    for i in 0..20u64 {
        sl.insert(ik(&format!("key_{i:02}"), 1), val(&i.to_string()));
    }

    let mut iter = sl.iter();
    iter.seek_to_last();
    let mut count = 0;
    let mut expected = 19i64;
    while iter.is_valid() {
        assert_eq!(iter.key().user_key, format!("key_{expected:02}").into_bytes());
        iter.prev();
        expected -= 1;
        count += 1;
    }
    assert_eq!(count, 20);

    iter.seek_to_first();
    assert_eq!(iter.key().user_key, b"key_00".to_vec());
    iter.prev();
    assert!(!iter.is_valid());
}
