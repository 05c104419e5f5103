//! In-memory write buffer.
//!
//! Every write lands here first. The buffer is partitioned by a hash of each
//! key's prefix ([`PrefixHashBuffer`]), which makes point lookups and
//! prefix-bounded scans touch a single small skip list instead of one large
//! one. Total-order scans pay for it by materializing a snapshot.

pub mod hash_skiplist;
pub mod iter;
pub mod skiplist;

pub use hash_skiplist::PrefixHashBuffer;
pub use iter::{BufferIter, DynamicPrefixIter, FullOrderIter};
pub use skiplist::{SkipList, SkipListIterator};
