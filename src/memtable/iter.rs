use std::ops::Bound;

use crossbeam_skiplist::map::Entry;

use crate::iterator::MemTableIterator;
use crate::memtable::hash_skiplist::{Bucket, PrefixHashBuffer};
use crate::memtable::skiplist::SkipList;
use crate::types::{InternalKey, Value};

/// The iterators a [`PrefixHashBuffer`] hands out.
pub enum BufferIter<'a> {
    /// Total order over a private snapshot of every bucket.
    Full(FullOrderIter),
    /// Follows the single bucket chosen by the last seek.
    Prefix(DynamicPrefixIter<'a>),
    /// Nothing to iterate; always invalid.
    Empty,
}

/// Owns a snapshot skip list and a cursor into it.
pub struct FullOrderIter {
    list: SkipList,
    node: Option<usize>,
}

impl FullOrderIter {
    pub(crate) fn new(list: SkipList) -> Self {
        // Unpositioned until the first seek, like every other cursor.
        FullOrderIter { list, node: None }
    }

    /// Entries in the snapshot.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl MemTableIterator for FullOrderIter {
    fn is_valid(&self) -> bool {
        self.node.is_some()
    }

    fn key(&self) -> &InternalKey {
        self.list.key_at(self.node.expect("iterator is not valid"))
    }

    fn value(&self) -> &Value {
        self.list.value_at(self.node.expect("iterator is not valid"))
    }

    fn next(&mut self) {
        debug_assert!(self.is_valid());
        self.node = self.node.and_then(|n| self.list.successor(n));
    }

    fn prev(&mut self) {
        debug_assert!(self.is_valid());
        self.node = self.node.and_then(|n| self.list.predecessor(n));
    }

    fn seek(&mut self, target: &InternalKey) {
        self.node = self.list.find_greater_or_equal(target);
    }

    fn seek_to_first(&mut self) {
        self.node = self.list.first();
    }

    fn seek_to_last(&mut self) {
        self.node = self.list.last();
    }
}

/// Prefix-bounded cursor. Holds no bucket until the first `seek`; each seek
/// re-resolves the bucket from the target's prefix and only yields entries
/// with that prefix, even when other prefixes share the bucket.
///
/// There is no order across buckets, so `seek_to_first`/`seek_to_last` drop
/// the bucket and leave the iterator invalid.
pub struct DynamicPrefixIter<'a> {
    buffer: &'a PrefixHashBuffer,
    bucket: Option<&'a Bucket>,
    prefix: Vec<u8>,
    cursor: Option<Entry<'a, InternalKey, Value>>,
}

impl<'a> DynamicPrefixIter<'a> {
    pub(crate) fn new(buffer: &'a PrefixHashBuffer) -> Self {
        DynamicPrefixIter {
            buffer,
            bucket: None,
            prefix: Vec::new(),
            cursor: None,
        }
    }

    fn reset(&mut self, bucket: Option<&'a Bucket>) {
        self.bucket = bucket;
        self.prefix.clear();
        self.cursor = None;
    }

    /// Keep `entry` only if it carries the current prefix.
    fn in_prefix(
        &self,
        entry: Option<Entry<'a, InternalKey, Value>>,
    ) -> Option<Entry<'a, InternalKey, Value>> {
        entry.filter(|e| self.buffer.prefix_of(&e.key().user_key) == self.prefix.as_slice())
    }
}

impl MemTableIterator for DynamicPrefixIter<'_> {
    fn is_valid(&self) -> bool {
        self.cursor.is_some()
    }

    fn key(&self) -> &InternalKey {
        self.cursor.as_ref().expect("iterator is not valid").key()
    }

    fn value(&self) -> &Value {
        self.cursor.as_ref().expect("iterator is not valid").value()
    }

    fn next(&mut self) {
        debug_assert!(self.is_valid());
        let next = self.cursor.take().and_then(|e| e.next());
        self.cursor = self.in_prefix(next);
    }

    fn prev(&mut self) {
        debug_assert!(self.is_valid());
        let prev = self.cursor.take().and_then(|e| e.prev());
        self.cursor = self.in_prefix(prev);
    }

    fn seek(&mut self, target: &InternalKey) {
        let buffer = self.buffer;
        self.reset(buffer.bucket_for_key(&target.user_key));
        self.prefix.extend_from_slice(buffer.prefix_of(&target.user_key));
        let found = self
            .bucket
            .and_then(|b| b.lower_bound(Bound::Included(target)));
        self.cursor = self.in_prefix(found);
    }

    fn seek_to_first(&mut self) {
        self.reset(None);
    }

    fn seek_to_last(&mut self) {
        self.reset(None);
    }
}

impl MemTableIterator for BufferIter<'_> {
    fn is_valid(&self) -> bool {
        match self {
            BufferIter::Full(it) => it.is_valid(),
            BufferIter::Prefix(it) => it.is_valid(),
            BufferIter::Empty => false,
        }
    }

    fn key(&self) -> &InternalKey {
        match self {
            BufferIter::Full(it) => it.key(),
            BufferIter::Prefix(it) => it.key(),
            BufferIter::Empty => panic!("key() on an empty iterator"),
        }
    }

    fn value(&self) -> &Value {
        match self {
            BufferIter::Full(it) => it.value(),
            BufferIter::Prefix(it) => it.value(),
            BufferIter::Empty => panic!("value() on an empty iterator"),
        }
    }

    fn next(&mut self) {
        match self {
            BufferIter::Full(it) => it.next(),
            BufferIter::Prefix(it) => it.next(),
            BufferIter::Empty => {}
        }
    }

    fn prev(&mut self) {
        match self {
            BufferIter::Full(it) => it.prev(),
            BufferIter::Prefix(it) => it.prev(),
            BufferIter::Empty => {}
        }
    }

    fn seek(&mut self, target: &InternalKey) {
        match self {
            BufferIter::Full(it) => it.seek(target),
            BufferIter::Prefix(it) => it.seek(target),
            BufferIter::Empty => {}
        }
    }

    fn seek_to_first(&mut self) {
        match self {
            BufferIter::Full(it) => it.seek_to_first(),
            BufferIter::Prefix(it) => it.seek_to_first(),
            BufferIter::Empty => {}
        }
    }

    fn seek_to_last(&mut self) {
        match self {
            BufferIter::Full(it) => it.seek_to_last(),
            BufferIter::Prefix(it) => it.seek_to_last(),
            BufferIter::Empty => {}
        }
    }
}
