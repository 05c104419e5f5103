//! # Point-lookup path of an LSM-tree
//!
//! Two pieces of the read path:
//!
//! - [`memtable::PrefixHashBuffer`]: an in-memory write buffer split into
//!   lazily created skip lists, one per hash slot of a key prefix. Readers
//!   run without locks next to a single writer.
//! - [`get_context::GetContext`]: the state machine that turns the versions
//!   of a key, presented newest to oldest from every source, into one answer:
//!   a value, a deletion, or a corruption error.
//!
//! The [`row_cache`] sits in front of table files and replays recorded
//! resolutions instead of reading the file again.
//!
//! ## Reading a key
//! ```text
//!   GetContext ◄── write buffer (PrefixHashBuffer::get)
//!        ▲    ◄── immutable buffers
//!        └─────── table files ◄── row cache replay
//! ```
//! Each source stops feeding as soon as `consider_version` returns false.

pub mod coding;
pub mod error;
pub mod get_context;
pub mod iterator;
pub mod memtable;
pub mod options;
pub mod row_cache;
pub mod stats;
pub mod transform;
pub mod types;

// Public re-exports for the top-level API
pub use error::{Error, Result};
pub use get_context::{GetContext, GetState, LazyValue, MergeOperator};
pub use iterator::MemTableIterator;
pub use memtable::PrefixHashBuffer;
pub use options::HashSkipListOptions;
pub use row_cache::{LruRowCache, RowCache, RowCacheContext, RowCacheKey};
pub use stats::{Statistics, Ticker};
pub use transform::{FixedPrefixTransform, SliceTransform};
pub use types::{InternalKey, LookupKey, ParsedInternalKey, SequenceNumber, ValueType};
