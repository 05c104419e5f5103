//! Multi-version point-lookup resolution.
//!
//! A lookup walks its sources newest to oldest (write buffer, immutable
//! buffers, table files) and presents every candidate version of the key to
//! one [`GetContext`]. The context folds tombstones, merge operands, masked
//! and shadowed versions and snapshot visibility into a single answer, and
//! tells the caller when to stop:
//!
//! ```text
//!             ┌──── Merge ◄──┐ merge operand
//!             │      │       │
//!  NotFound ──┼──────┴───────┴──► Found     value / merge completed
//!             ├─────────────────► Deleted   tombstone, nothing pending
//!             └─────────────────► Corrupt   merge or decode failure
//! ```

mod lazy;
mod merge;

pub use lazy::{Decoder, LazyValue};
pub use merge::{MergeContext, MergeOperator, StringAppendOperator};

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::stats::{Statistics, Ticker};
use crate::types::{MAX_SEQUENCE_NUMBER, ParsedInternalKey, SequenceNumber, ValueType};

/// Resolution state of one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetState {
    NotFound,
    Found,
    Deleted,
    Corrupt,
    /// Merge operands collected; still looking for a base value.
    Merge,
}

impl GetState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GetState::NotFound | GetState::Merge)
    }
}

/// Resolves values stored out of line (`ValueIndex`, `MergeIndex`).
pub trait SeparateHelper {
    /// Replace the index record in `value` with the value it points to.
    fn resolve_indexed(&self, user_key: &[u8], seq_type: u64, value: &mut LazyValue) -> Result<()>;
}

/// Snapshot visibility: versions it rejects are skipped.
pub trait ReadCallback {
    fn is_visible(&self, sequence: SequenceNumber) -> bool;
}

impl<F> ReadCallback for F
where
    F: Fn(SequenceNumber) -> bool,
{
    fn is_visible(&self, sequence: SequenceNumber) -> bool {
        self(sequence)
    }
}

/// Receives every version that took part in a resolution, in order, so the
/// resolution can be replayed later.
pub trait ReplayLog {
    fn add_replay_log(&mut self, value_type: ValueType, value: &mut LazyValue);
}

/// Block-cache activity of one lookup, flushed to [`Statistics`] in one batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GetContextStats {
    pub num_cache_hit: u64,
    pub num_cache_index_hit: u64,
    pub num_cache_data_hit: u64,
    pub num_cache_filter_hit: u64,
    pub num_cache_index_miss: u64,
    pub num_cache_filter_miss: u64,
    pub num_cache_data_miss: u64,
    pub num_cache_bytes_read: u64,
    pub num_cache_miss: u64,
    pub num_cache_add: u64,
    pub num_cache_bytes_write: u64,
    pub num_cache_index_add: u64,
    pub num_cache_index_bytes_insert: u64,
    pub num_cache_data_add: u64,
    pub num_cache_data_bytes_insert: u64,
    pub num_cache_filter_add: u64,
    pub num_cache_filter_bytes_insert: u64,
}

impl GetContextStats {
    fn counters(&self) -> [(Ticker, u64); 17] {
        [
            (Ticker::BlockCacheHit, self.num_cache_hit),
            (Ticker::BlockCacheIndexHit, self.num_cache_index_hit),
            (Ticker::BlockCacheDataHit, self.num_cache_data_hit),
            (Ticker::BlockCacheFilterHit, self.num_cache_filter_hit),
            (Ticker::BlockCacheIndexMiss, self.num_cache_index_miss),
            (Ticker::BlockCacheFilterMiss, self.num_cache_filter_miss),
            (Ticker::BlockCacheDataMiss, self.num_cache_data_miss),
            (Ticker::BlockCacheBytesRead, self.num_cache_bytes_read),
            (Ticker::BlockCacheMiss, self.num_cache_miss),
            (Ticker::BlockCacheAdd, self.num_cache_add),
            (Ticker::BlockCacheBytesWrite, self.num_cache_bytes_write),
            (Ticker::BlockCacheIndexAdd, self.num_cache_index_add),
            (Ticker::BlockCacheIndexBytesInsert, self.num_cache_index_bytes_insert),
            (Ticker::BlockCacheDataAdd, self.num_cache_data_add),
            (Ticker::BlockCacheDataBytesInsert, self.num_cache_data_bytes_insert),
            (Ticker::BlockCacheFilterAdd, self.num_cache_filter_add),
            (Ticker::BlockCacheFilterBytesInsert, self.num_cache_filter_bytes_insert),
        ]
    }
}

/// Per-lookup resolution state machine.
///
/// Built for one user key, fed versions newest to oldest through
/// [`consider_version`](Self::consider_version) until it returns false, then
/// consumed with [`resolve`](Self::resolve). Not shared between threads.
pub struct GetContext<'a> {
    user_key: &'a [u8],
    state: GetState,
    merge_operator: Option<&'a dyn MergeOperator>,
    separate_helper: Option<&'a dyn SeparateHelper>,
    callback: Option<&'a dyn ReadCallback>,
    statistics: Option<&'a Statistics>,
    replay_log: Option<&'a mut dyn ReplayLog>,
    merge_context: MergeContext,
    want_value: bool,
    value: Option<LazyValue>,
    value_found: Option<bool>,
    seq: Option<SequenceNumber>,
    max_covering_tombstone_seq: Option<SequenceNumber>,
    min_seq_type: u64,
    trivial: bool,
    matched: bool,
    error: Option<Error>,
    stats: GetContextStats,
}

impl<'a> GetContext<'a> {
    pub fn new(user_key: &'a [u8]) -> Self {
        GetContext {
            user_key,
            state: GetState::NotFound,
            merge_operator: None,
            separate_helper: None,
            callback: None,
            statistics: None,
            replay_log: None,
            merge_context: MergeContext::new(),
            want_value: true,
            value: None,
            value_found: None,
            seq: None,
            max_covering_tombstone_seq: None,
            min_seq_type: 0,
            trivial: false,
            matched: false,
            error: None,
            stats: GetContextStats::default(),
        }
    }

    pub fn with_merge_operator(mut self, op: &'a dyn MergeOperator) -> Self {
        self.merge_operator = Some(op);
        self
    }

    pub fn with_separate_helper(mut self, helper: &'a dyn SeparateHelper) -> Self {
        self.separate_helper = Some(helper);
        self
    }

    pub fn with_read_callback(mut self, callback: &'a dyn ReadCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn with_statistics(mut self, statistics: &'a Statistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn with_replay_log(mut self, log: &'a mut dyn ReplayLog) -> Self {
        self.replay_log = Some(log);
        self
    }

    /// Versions older than this sequence are shadowed by a range tombstone.
    pub fn with_max_covering_tombstone_seq(mut self, seq: SequenceNumber) -> Self {
        self.max_covering_tombstone_seq = Some(seq);
        self
    }

    /// Versions whose packed sequence/type is below `min_seq_type` are masked.
    pub fn with_min_seq_type(mut self, min_seq_type: u64) -> Self {
        self.min_seq_type = min_seq_type;
        self
    }

    pub fn with_initial_state(mut self, state: GetState) -> Self {
        self.state = state;
        self
    }

    /// Record the sequence of the first visible version.
    pub fn track_sequence(mut self) -> Self {
        self.seq = Some(MAX_SEQUENCE_NUMBER);
        self
    }

    /// Report whether a found value was actually materialized.
    pub fn track_value_found(mut self) -> Self {
        self.value_found = Some(true);
        self
    }

    /// Existence check only: do not keep or merge values.
    pub fn without_value(mut self) -> Self {
        self.want_value = false;
        self
    }

    /// The caller guarantees at most one version exists: take the first
    /// value or operand verbatim.
    pub fn trivial(mut self) -> Self {
        self.trivial = true;
        self
    }

    /// Present one candidate version. Returns true if the caller should
    /// present the next older version, false once resolution is finished
    /// (or the version belongs to another key).
    pub fn consider_version(&mut self, key: ParsedInternalKey<'_>, mut value: LazyValue) -> bool {
        if key.user_key != self.user_key {
            return false;
        }
        let seq_type = key.seq_type();
        if seq_type < self.min_seq_type {
            return false;
        }
        self.matched = true;

        if let Some(cb) = self.callback {
            if !cb.is_visible(key.sequence) {
                return true;
            }
        }

        if let Some(seq) = self.seq.as_mut() {
            if *seq == MAX_SEQUENCE_NUMBER {
                *seq = key.sequence;
            }
        }

        let mut value_type = key.value_type;
        if value_type.is_value_or_merge()
            && self.max_covering_tombstone_seq.is_some_and(|s| s > key.sequence)
        {
            value_type = ValueType::RangeDeletion;
            value.reset();
        }

        debug_assert!(
            !self.state.is_terminal(),
            "version presented after resolution finished in state {:?}",
            self.state
        );
        if self.state.is_terminal() {
            return false;
        }

        if let Some(log) = self.replay_log.as_deref_mut() {
            log.add_replay_log(value_type, &mut value);
        }

        match value_type {
            ValueType::Value | ValueType::ValueIndex => {
                if value_type.is_indexed() && !self.resolve_indexed(seq_type, &mut value) {
                    return false;
                }
                if self.trivial || self.state == GetState::NotFound {
                    self.state = GetState::Found;
                    self.store(value);
                } else {
                    self.full_merge(Some(value));
                }
                false
            }
            ValueType::Deletion | ValueType::SingleDeletion | ValueType::RangeDeletion => {
                if self.state == GetState::NotFound {
                    self.state = GetState::Deleted;
                } else {
                    self.full_merge(None);
                }
                false
            }
            ValueType::Merge | ValueType::MergeIndex => {
                if value_type.is_indexed() && !self.resolve_indexed(seq_type, &mut value) {
                    return false;
                }
                if self.trivial {
                    self.state = GetState::Found;
                    self.store(value);
                    return false;
                }
                let operand = match value.decode() {
                    Ok(operand) => operand,
                    Err(e) => {
                        self.corrupt(e);
                        return false;
                    }
                };
                self.merge_context.push_operand(operand);
                self.state = GetState::Merge;
                if let Some(op) = self.merge_operator {
                    if op.should_merge(self.merge_context.operands_newest_first()) {
                        self.full_merge(None);
                        return false;
                    }
                }
                true
            }
        }
    }

    /// A source could not be read without I/O the caller may not perform:
    /// the key may exist, but its value is not available.
    pub fn mark_key_may_exist(&mut self) {
        self.state = GetState::Found;
        if let Some(found) = self.value_found.as_mut() {
            *found = false;
        }
    }

    /// Install or detach the replay-log sink.
    ///
    /// Detaching while unresolved under a covering tombstone appends a final
    /// `RangeDeletion` record to the old sink, so a replay ends the same way.
    pub fn set_replay_log(&mut self, log: Option<&'a mut dyn ReplayLog>) {
        if log.is_none()
            && !self.state.is_terminal()
            && self.max_covering_tombstone_seq.is_some_and(|s| s != 0)
        {
            if let Some(old) = self.replay_log.as_deref_mut() {
                old.add_replay_log(ValueType::RangeDeletion, &mut LazyValue::Empty);
            }
        }
        self.replay_log = log;
    }

    /// Raise the covering-tombstone bound as range tombstones are discovered.
    pub fn update_max_covering_tombstone_seq(&mut self, seq: SequenceNumber) {
        let cur = self.max_covering_tombstone_seq.unwrap_or(0);
        self.max_covering_tombstone_seq = Some(cur.max(seq));
    }

    pub fn set_min_seq_type(&mut self, min_seq_type: u64) {
        self.min_seq_type = min_seq_type;
    }

    /// All sources exhausted: operands without a base are merged alone.
    pub fn finish(&mut self) {
        if self.state == GetState::Merge {
            self.full_merge(None);
        }
    }

    /// Consume the context. Found yields the value (`None` if values were not
    /// kept), Deleted/NotFound yield `None`, Corrupt yields the error.
    pub fn resolve(mut self) -> Result<Option<Bytes>> {
        self.finish();
        match self.state {
            GetState::Found => self.value.take().map(LazyValue::into_bytes).transpose(),
            GetState::Corrupt => Err(self
                .error
                .take()
                .unwrap_or_else(|| Error::Corruption("lookup resolved to corrupt state".into()))),
            GetState::NotFound | GetState::Deleted | GetState::Merge => Ok(None),
        }
    }

    /// Flush per-lookup cache counters; zero counters are skipped.
    pub fn report_counters(&self) {
        let Some(statistics) = self.statistics else {
            return;
        };
        for (ticker, count) in self.stats.counters() {
            if count > 0 {
                statistics.record_tick(ticker, count);
            }
        }
    }

    pub fn state(&self) -> GetState {
        self.state
    }

    pub fn user_key(&self) -> &[u8] {
        self.user_key
    }

    pub fn value(&self) -> Option<&LazyValue> {
        self.value.as_ref()
    }

    /// Sequence of the first visible version, `MAX_SEQUENCE_NUMBER` if none,
    /// `None` if not tracked.
    pub fn seq(&self) -> Option<SequenceNumber> {
        self.seq
    }

    pub fn value_found(&self) -> Option<bool> {
        self.value_found
    }

    /// Whether any unmasked version of the key was presented.
    pub fn matched(&self) -> bool {
        self.matched
    }

    pub fn merge_context(&self) -> &MergeContext {
        &self.merge_context
    }

    /// The row cache drops sequence numbers, so it cannot serve a lookup
    /// that needs one.
    pub fn need_to_read_sequence(&self) -> bool {
        self.seq.is_some()
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn stats(&self) -> &GetContextStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut GetContextStats {
        &mut self.stats
    }

    /// Keep a found value, decoded: a value that cannot be decoded makes the
    /// lookup corrupt.
    fn store(&mut self, mut value: LazyValue) {
        if !self.want_value {
            return;
        }
        match value.decode() {
            Ok(_) => self.value = Some(value),
            Err(e) => self.corrupt(e),
        }
    }

    fn resolve_indexed(&mut self, seq_type: u64, value: &mut LazyValue) -> bool {
        let Some(helper) = self.separate_helper else {
            self.corrupt(Error::Corruption("indexed value without a separate helper".into()));
            return false;
        };
        if let Err(e) = helper.resolve_indexed(self.user_key, seq_type, value) {
            log::warn!("failed to resolve indexed value: {e}");
            self.corrupt(e);
            return false;
        }
        true
    }

    fn full_merge(&mut self, base: Option<LazyValue>) {
        self.state = GetState::Found;
        if !self.want_value {
            return;
        }
        let Some(op) = self.merge_operator else {
            self.corrupt(Error::Corruption("merge operands found without a merge operator".into()));
            return;
        };
        let base = match base.map(LazyValue::into_bytes).transpose() {
            Ok(base) => base,
            Err(e) => return self.corrupt(e),
        };
        let operands = self.merge_context.operands_oldest_first();
        match op.full_merge(self.user_key, base.as_deref(), &operands) {
            Ok(merged) => self.value = Some(LazyValue::Plain(merged)),
            Err(e) => {
                log::warn!("merge operator {} failed: {e}", op.name());
                self.corrupt(Error::Corruption(format!("merge operator {} failed: {e}", op.name())));
            }
        }
    }

    fn corrupt(&mut self, err: Error) {
        self.state = GetState::Corrupt;
        self.value = None;
        self.error = Some(err);
    }
}
