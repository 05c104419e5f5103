use bytes::Bytes;
use hashlink::LruCache;
use parking_lot::Mutex;

/// Storage behind the row cache.
///
/// A looked-up payload is shared, not copied: the returned `Bytes` (and any
/// slice of it) keeps the payload alive after the entry is evicted, and
/// releases it when the last holder is dropped.
pub trait RowCache: Send + Sync {
    fn lookup(&self, key: &[u8]) -> Option<Bytes>;

    /// Insert or replace `key`, accounting `charge` bytes against capacity.
    fn insert(&self, key: &[u8], payload: Bytes, charge: usize);
}

struct Entry {
    payload: Bytes,
    charge: usize,
}

struct Inner {
    map: LruCache<Vec<u8>, Entry>,
    usage: usize,
}

/// Charge-bounded LRU cache.
///
/// Inserting past capacity evicts least recently used entries; an entry
/// larger than the whole capacity is kept until the next insert.
pub struct LruRowCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl LruRowCache {
    pub fn new(capacity: usize) -> Self {
        LruRowCache {
            capacity,
            inner: Mutex::new(Inner {
                map: LruCache::new_unbounded(),
                usage: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sum of the charges of all resident entries.
    pub fn usage(&self) -> usize {
        self.inner.lock().usage
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn erase(&self, key: &[u8]) {
        let mut inner = self.inner.lock();
        if let Some(old) = inner.map.remove(key) {
            inner.usage -= old.charge;
        }
    }
}

impl RowCache for LruRowCache {
    fn lookup(&self, key: &[u8]) -> Option<Bytes> {
        self.inner.lock().map.get(key).map(|e| e.payload.clone())
    }

    fn insert(&self, key: &[u8], payload: Bytes, charge: usize) {
        let mut inner = self.inner.lock();
        if let Some(old) = inner.map.insert(key.to_vec(), Entry { payload, charge }) {
            inner.usage -= old.charge;
        }
        inner.usage += charge;
        while inner.usage > self.capacity && inner.map.len() > 1 {
            match inner.map.remove_lru() {
                Some((_, evicted)) => inner.usage -= evicted.charge,
                None => break,
            }
        }
    }
}
