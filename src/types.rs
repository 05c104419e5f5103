use std::cmp::Ordering;

use bytes::Bytes;

use crate::error::{Error, Result};

/// Raw user key bytes.
pub type Key = Vec<u8>;

/// Value bytes. Cheap to clone; slices share the underlying buffer.
pub type Value = Bytes;

/// Monotonically increasing write counter.
pub type SequenceNumber = u64;

/// Sequence numbers occupy the upper 56 bits of the packed field.
pub const MAX_SEQUENCE_NUMBER: SequenceNumber = (1 << 56) - 1;

/// Kind of a single version of a key.
///
/// `ValueIndex` and `MergeIndex` point at a value stored out of line and must
/// be resolved to `Value`/`Merge` before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    Deletion = 0x00,
    Value = 0x01,
    Merge = 0x02,
    SingleDeletion = 0x07,
    RangeDeletion = 0x0F,
    ValueIndex = 0x14,
    MergeIndex = 0x15,
}

/// The largest type code. A seek target built with it sorts before every
/// version that shares its user key and sequence.
pub const VALUE_TYPE_FOR_SEEK: ValueType = ValueType::MergeIndex;

impl ValueType {
    /// Types that carry a value which a covering tombstone can shadow.
    pub fn is_value_or_merge(self) -> bool {
        matches!(
            self,
            ValueType::Value | ValueType::Merge | ValueType::ValueIndex | ValueType::MergeIndex
        )
    }

    pub fn is_deletion(self) -> bool {
        matches!(
            self,
            ValueType::Deletion | ValueType::SingleDeletion | ValueType::RangeDeletion
        )
    }

    /// Whether the value is stored out of line.
    pub fn is_indexed(self) -> bool {
        matches!(self, ValueType::ValueIndex | ValueType::MergeIndex)
    }
}

impl TryFrom<u8> for ValueType {
    type Error = Error;

    fn try_from(b: u8) -> Result<Self> {
        match b {
            0x00 => Ok(ValueType::Deletion),
            0x01 => Ok(ValueType::Value),
            0x02 => Ok(ValueType::Merge),
            0x07 => Ok(ValueType::SingleDeletion),
            0x0F => Ok(ValueType::RangeDeletion),
            0x14 => Ok(ValueType::ValueIndex),
            0x15 => Ok(ValueType::MergeIndex),
            other => Err(Error::Corruption(format!("unknown value type {other:#x}"))),
        }
    }
}

/// Pack a sequence number and type into the 64-bit trailer of an internal key.
pub fn pack_sequence_and_type(sequence: SequenceNumber, value_type: ValueType) -> u64 {
    debug_assert!(sequence <= MAX_SEQUENCE_NUMBER);
    (sequence << 8) | value_type as u64
}

/// Internal key format: user key + sequence number + value type.
///
/// Ordering: (user_key ASC, sequence DESC, type DESC).
/// The newest version of a key always comes first, so a seek to
/// `(user_key, snapshot)` lands on the newest version visible at `snapshot`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InternalKey {
    pub user_key: Key,
    pub sequence: SequenceNumber,
    pub value_type: ValueType,
}

impl InternalKey {
    pub fn new(user_key: impl Into<Key>, sequence: SequenceNumber, value_type: ValueType) -> Self {
        InternalKey {
            user_key: user_key.into(),
            sequence,
            value_type,
        }
    }

    pub fn seq_type(&self) -> u64 {
        pack_sequence_and_type(self.sequence, self.value_type)
    }

    /// Borrowed view handed to the resolution path.
    pub fn as_parsed(&self) -> ParsedInternalKey<'_> {
        ParsedInternalKey {
            user_key: &self.user_key,
            sequence: self.sequence,
            value_type: self.value_type,
        }
    }

    /// Bytes accounted for this key in memory usage estimates.
    pub fn encoded_len(&self) -> usize {
        self.user_key.len() + 8
    }
}

impl Ord for InternalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.user_key
            .cmp(&other.user_key)
            .then_with(|| other.seq_type().cmp(&self.seq_type()))
    }
}

impl PartialOrd for InternalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A decoded internal key borrowing its user key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInternalKey<'a> {
    pub user_key: &'a [u8],
    pub sequence: SequenceNumber,
    pub value_type: ValueType,
}

impl<'a> ParsedInternalKey<'a> {
    pub fn new(user_key: &'a [u8], sequence: SequenceNumber, value_type: ValueType) -> Self {
        ParsedInternalKey {
            user_key,
            sequence,
            value_type,
        }
    }

    pub fn seq_type(&self) -> u64 {
        pack_sequence_and_type(self.sequence, self.value_type)
    }
}

/// A point-lookup target: a user key read as of `sequence`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    user_key: Key,
    sequence: SequenceNumber,
}

impl LookupKey {
    pub fn new(user_key: impl Into<Key>, sequence: SequenceNumber) -> Self {
        LookupKey {
            user_key: user_key.into(),
            sequence,
        }
    }

    pub fn user_key(&self) -> &[u8] {
        &self.user_key
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    /// Seek target: the first entry >= this key is the newest version of
    /// `user_key` with sequence <= `self.sequence`.
    pub fn internal_key(&self) -> InternalKey {
        InternalKey::new(self.user_key.clone(), self.sequence, VALUE_TYPE_FOR_SEEK)
    }
}
