// Varint coding, internal key ordering, value type codes.

use prefix_hash_get::coding::{
    get_length_prefixed_slice, get_varint32, get_varint64, put_length_prefix,
    put_length_prefixed_slice, put_varint32, put_varint64, varint_length,
};
use prefix_hash_get::error::Error;
use prefix_hash_get::types::{
    InternalKey, LookupKey, MAX_SEQUENCE_NUMBER, ValueType, pack_sequence_and_type,
};

// =============================================================================
// Test 1: Varint boundaries
// =============================================================================
#[test]
fn varint_boundaries() {
    for (v, len) in [(0u64, 1), (127, 1), (128, 2), (16_383, 2), (16_384, 3), (u64::MAX, 10)] {
        let mut buf = Vec::new();
        put_varint64(&mut buf, v);
        assert_eq!(buf.len(), len, "encoded length of {v}");
        assert_eq!(varint_length(v), len);
        assert_eq!(get_varint64(&buf).unwrap(), (v, len));
    }

    let mut buf = Vec::new();
    put_varint32(&mut buf, 300);
    assert_eq!(buf, vec![0xAC, 0x02]);
}

// =============================================================================
// Test 2: Malformed varints
// =============================================================================
#[test]
fn varint_truncated_and_overflow() {
    assert_eq!(get_varint64(&[]), Err(Error::Eof));
    assert_eq!(get_varint64(&[0x80, 0x80]), Err(Error::Eof));
    assert!(matches!(get_varint64(&[0xFF; 11]), Err(Error::Corruption(_))));

    let mut buf = Vec::new();
    put_varint64(&mut buf, u64::from(u32::MAX) + 1);
    assert!(matches!(get_varint32(&buf), Err(Error::Corruption(_))));
}

// =============================================================================
// Test 3: Length-prefixed slices
// =============================================================================
#[test]
fn length_prefixed_slices() {
    let mut buf = Vec::new();
    put_length_prefixed_slice(&mut buf, b"hello").unwrap();
    put_length_prefixed_slice(&mut buf, b"").unwrap();

    let (range, used) = get_length_prefixed_slice(&buf).unwrap();
    assert_eq!(&buf[range], b"hello");
    assert_eq!(used, 6);
    let (range, used) = get_length_prefixed_slice(&buf[6..]).unwrap();
    assert!(range.is_empty());
    assert_eq!(used, 1);

    // length says 5, only 2 bytes follow
    assert_eq!(get_length_prefixed_slice(&[5, b'h', b'e']), Err(Error::Eof));
}

// =============================================================================
// Test 4: Internal key order
// =============================================================================
#[test]
fn internal_key_order() {
    let a9 = InternalKey::new(b"a".to_vec(), 9, ValueType::Value);
    let a1 = InternalKey::new(b"a".to_vec(), 1, ValueType::Value);
    let b5 = InternalKey::new(b"b".to_vec(), 5, ValueType::Value);
    assert!(a9 < a1);
    assert!(a1 < b5);

    // same sequence: larger type code first
    let merge = InternalKey::new(b"a".to_vec(), 4, ValueType::Merge);
    let value = InternalKey::new(b"a".to_vec(), 4, ValueType::Value);
    assert!(merge < value);

    // a lookup target sorts before every version it can see
    let target = LookupKey::new(b"a".to_vec(), 4).internal_key();
    assert!(target <= merge);
    assert!(target > InternalKey::new(b"a".to_vec(), 5, ValueType::Deletion));
}

// =============================================================================
// Test 5: Type codes and packing
// =============================================================================
#[test]
fn value_type_codes() {
    for (code, t) in [
        (0x00, ValueType::Deletion),
        (0x01, ValueType::Value),
        (0x02, ValueType::Merge),
        (0x07, ValueType::SingleDeletion),
        (0x0F, ValueType::RangeDeletion),
        (0x14, ValueType::ValueIndex),
        (0x15, ValueType::MergeIndex),
    ] {
        assert_eq!(ValueType::try_from(code), Ok(t));
        assert_eq!(t as u8, code);
    }
    assert!(matches!(ValueType::try_from(0x03), Err(Error::Corruption(_))));

    assert!(ValueType::ValueIndex.is_value_or_merge());
    assert!(!ValueType::RangeDeletion.is_value_or_merge());
    assert!(ValueType::SingleDeletion.is_deletion());
    assert!(ValueType::MergeIndex.is_indexed());

    assert_eq!(pack_sequence_and_type(1, ValueType::Merge), 0x102);
    assert_eq!(
        pack_sequence_and_type(MAX_SEQUENCE_NUMBER, ValueType::Value) >> 8,
        MAX_SEQUENCE_NUMBER
    );
}

// =============================================================================
// Test 6: Values that cannot be represented are rejected, not truncated
// =============================================================================
#[test]
fn varint64_tenth_byte_overflow() {
    let mut max = vec![0xFF; 9];
    max.push(0x01);
    assert_eq!(get_varint64(&max), Ok((u64::MAX, 10)));

    let mut overflow = vec![0xFF; 9];
    overflow.push(0x02);
    assert!(matches!(get_varint64(&overflow), Err(Error::Corruption(_))));
}

#[cfg(target_pointer_width = "64")]
#[test]
fn length_prefix_over_u32_is_rejected() {
    let mut buf = Vec::new();
    let too_long = u32::MAX as usize + 1;
    assert!(matches!(put_length_prefix(&mut buf, too_long), Err(Error::InvalidArgument(_))));
    assert!(buf.is_empty());

    put_length_prefix(&mut buf, u32::MAX as usize).unwrap();
    assert_eq!(buf.len(), 5);
}
