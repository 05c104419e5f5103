use crate::types::{InternalKey, Value};

/// Cursor over a write-buffer container.
///
/// Every in-memory source (snapshot skip list, single bucket, empty buffer)
/// implements this trait, so a range scan can treat them uniformly.
///
/// `key()`, `value()`, `next()` and `prev()` require `is_valid()`.
pub trait MemTableIterator {
    /// Returns true if the iterator is positioned at a valid entry.
    fn is_valid(&self) -> bool;

    /// Returns the current internal key.
    fn key(&self) -> &InternalKey;

    /// Returns the current value.
    fn value(&self) -> &Value;

    /// Advances to the next entry.
    fn next(&mut self);

    /// Moves back to the previous entry.
    fn prev(&mut self);

    /// Positions the iterator at the first entry with key >= target.
    fn seek(&mut self, target: &InternalKey);

    /// Positions at the first entry. Valid iff the collection is non-empty.
    fn seek_to_first(&mut self);

    /// Positions at the last entry. Valid iff the collection is non-empty.
    fn seek_to_last(&mut self);
}
