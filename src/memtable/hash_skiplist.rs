use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam_skiplist::SkipMap;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::Result;
use crate::memtable::iter::{BufferIter, DynamicPrefixIter, FullOrderIter};
use crate::memtable::skiplist::SkipList;
use crate::options::HashSkipListOptions;
use crate::transform::SliceTransform;
use crate::types::{InternalKey, LookupKey, Value};

/// One partition: every entry whose prefix hashes to the same slot.
///
/// Single writer, many concurrent readers: a reader walking a bucket while
/// the writer inserts sees a growing list, never a half-linked node.
pub(crate) type Bucket = SkipMap<InternalKey, Value>;

/// Fixed per-bucket overhead charged to memory usage.
const BUCKET_OVERHEAD: usize = size_of::<Bucket>();

/// Write buffer partitioned by a hash of each key's prefix.
///
/// ```text
///  user key ──transform──► prefix ──xxh3 % bucket_count──► slot
///
///  slots: [ ∅ | bucket | ∅ | ∅ | bucket | ... ]
///                │                 │
///                ▼                 ▼
///            skip list         skip list
/// ```
///
/// Buckets are created lazily on the first insert into their slot and are
/// never replaced or dropped before the buffer itself. Each slot is a
/// write-once cell: a reader that observes a bucket observes it fully
/// constructed.
///
/// Writers must be serialized by the caller (one active writer, as under the
/// engine's write lock). Readers need no locking.
///
/// Buckets have no order relative to each other. Point lookups and
/// prefix-bounded scans touch one bucket; a total-order scan materializes a
/// merged snapshot.
pub struct PrefixHashBuffer {
    buckets: Box<[OnceLock<Box<Bucket>>]>,
    transform: Arc<dyn SliceTransform>,
    options: HashSkipListOptions,
    memory_usage: AtomicUsize,
}

impl PrefixHashBuffer {
    /// Create an empty buffer with `options.bucket_count` slots.
    pub fn new(options: HashSkipListOptions, transform: Arc<dyn SliceTransform>) -> Result<Self> {
        options.validate()?;
        let buckets = (0..options.bucket_count).map(|_| OnceLock::new()).collect();
        Ok(PrefixHashBuffer {
            buckets,
            transform,
            memory_usage: AtomicUsize::new(options.bucket_count * size_of::<OnceLock<Box<Bucket>>>()),
            options,
        })
    }

    /// Insert an entry. The key must not already be present; inserting a
    /// duplicate is a caller bug and is only checked in debug builds.
    pub fn insert(&self, key: InternalKey, value: Value) {
        debug_assert!(!self.contains(&key), "duplicate insert of {key:?}");
        let charge = key.encoded_len() + value.len();
        let slot = self.slot_for(&key.user_key);
        let bucket = self.initialized_bucket(slot);
        bucket.insert(key, value);
        self.memory_usage.fetch_add(charge, Ordering::Relaxed);
    }

    /// Whether this exact internal key is present. Never creates a bucket.
    pub fn contains(&self, key: &InternalKey) -> bool {
        match self.bucket(self.slot_for(&key.user_key)) {
            Some(bucket) => bucket.contains_key(key),
            None => false,
        }
    }

    /// Visit entries of the lookup key's bucket in ascending order, starting
    /// at the first entry >= the lookup target, until the bucket is exhausted
    /// or `visitor` returns false.
    ///
    /// The bucket may hold other prefixes that share its slot; the visitor is
    /// expected to stop once it sees a different user key.
    pub fn get<F>(&self, lookup: &LookupKey, mut visitor: F)
    where
        F: FnMut(&InternalKey, &Value) -> bool,
    {
        let Some(bucket) = self.bucket(self.slot_for(lookup.user_key())) else {
            return;
        };
        let target = lookup.internal_key();
        let mut cursor = bucket.lower_bound(Bound::Included(&target));
        while let Some(entry) = cursor {
            if !visitor(entry.key(), entry.value()) {
                break;
            }
            cursor = entry.next();
        }
    }

    /// Best-effort estimate of memory held by the buffer.
    pub fn approximate_memory_usage(&self) -> usize {
        self.memory_usage.load(Ordering::Relaxed)
    }

    /// Iterator over every entry in comparator order.
    ///
    /// Copies all buckets into a private skip list first: O(total entries).
    /// Entries inserted after this call are not visible to the iterator.
    pub fn get_iterator(&self) -> BufferIter<'_> {
        if self.initialized_buckets() == 0 {
            return BufferIter::Empty;
        }
        // Full height: the snapshot holds every entry, not one bucket's worth.
        let mut list = SkipList::new();
        for bucket in self.buckets.iter().filter_map(OnceLock::get) {
            for entry in bucket.iter() {
                list.insert(entry.key().clone(), entry.value().clone());
            }
        }
        log::trace!("materialized full-order snapshot of {} entries", list.len());
        BufferIter::Full(FullOrderIter::new(list))
    }

    /// Iterator confined to the bucket of the most recent seek target.
    /// `seek_to_first`/`seek_to_last` leave it invalid.
    pub fn get_dynamic_prefix_iterator(&self) -> BufferIter<'_> {
        BufferIter::Prefix(DynamicPrefixIter::new(self))
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of slots whose bucket has been created.
    pub fn initialized_buckets(&self) -> usize {
        self.buckets.iter().filter(|b| b.get().is_some()).count()
    }

    pub fn options(&self) -> &HashSkipListOptions {
        &self.options
    }

    pub(crate) fn bucket_for_key(&self, user_key: &[u8]) -> Option<&Bucket> {
        self.bucket(self.slot_for(user_key))
    }

    pub(crate) fn prefix_of<'k>(&self, user_key: &'k [u8]) -> &'k [u8] {
        self.transform.transform(user_key)
    }

    /// Slot a user key hashes to.
    pub fn bucket_index(&self, user_key: &[u8]) -> usize {
        self.slot_for(user_key)
    }

    fn slot_for(&self, user_key: &[u8]) -> usize {
        let prefix = self.transform.transform(user_key);
        (xxh3_64(prefix) % self.buckets.len() as u64) as usize
    }

    fn bucket(&self, slot: usize) -> Option<&Bucket> {
        self.buckets[slot].get().map(|b| &**b)
    }

    fn initialized_bucket(&self, slot: usize) -> &Bucket {
        self.buckets[slot].get_or_init(|| {
            log::trace!("creating bucket for slot {slot}");
            self.memory_usage.fetch_add(BUCKET_OVERHEAD, Ordering::Relaxed);
            Box::new(SkipMap::new())
        })
    }
}
