//! Row cache: replayable lookup results for table files.
//!
//! A lookup that misses the cache records every version its resolution
//! consumed from a file (the replay log). Once the lookup finishes, the log is
//! stored under the file's key; a later lookup of the same key at the same
//! capped sequence replays the log into its own [`GetContext`] instead of
//! reading the file.
//!
//! ```text
//! key:     [namespace][varint64 file_number][varint64 capped_seq][user_key]
//! payload: { [type u8][varint32 len][value] }* [crc32 of records, 4B LE]
//! ```

mod lru;

pub use lru::{LruRowCache, RowCache};

use bytes::Bytes;

use crate::coding::{get_length_prefixed_slice, put_length_prefixed_slice, put_varint64, varint_length};
use crate::error::{Error, Result};
use crate::get_context::{GetContext, LazyValue, ReplayLog};
use crate::stats::{Statistics, Ticker, record_tick};
use crate::types::{MAX_SEQUENCE_NUMBER, ParsedInternalKey, SequenceNumber, ValueType};

const CHECKSUM_LEN: usize = 4;

/// Sequence a row-cache entry is keyed under.
///
/// Without a snapshot every lookup sees the whole file, so the file's largest
/// sequence is used and all such lookups share one entry. A snapshot read
/// older than the file's newest data gets its own entry.
pub fn capped_sequence(largest_seqno: SequenceNumber, snapshot: Option<SequenceNumber>) -> SequenceNumber {
    match snapshot {
        Some(snapshot) => largest_seqno.min(snapshot),
        None => largest_seqno,
    }
}

/// Encoded row-cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowCacheKey {
    buf: Vec<u8>,
    user_key_offset: usize,
}

impl RowCacheKey {
    pub fn new(namespace: &[u8], file_number: u64, capped_seq: SequenceNumber, user_key: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(
            namespace.len() + varint_length(file_number) + varint_length(capped_seq) + user_key.len(),
        );
        buf.extend_from_slice(namespace);
        put_varint64(&mut buf, file_number);
        put_varint64(&mut buf, capped_seq);
        let user_key_offset = buf.len();
        buf.extend_from_slice(user_key);
        RowCacheKey { buf, user_key_offset }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn user_key(&self) -> &[u8] {
        &self.buf[self.user_key_offset..]
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Builds the replay log of one cache-missing lookup.
///
/// Installed as the [`GetContext`]'s replay-log sink while a file is read. If
/// a value cannot be decoded the log is abandoned: recording stops and
/// [`commit`](Self::commit) stores nothing. The lookup itself is unaffected.
#[derive(Debug)]
pub struct RowCacheContext {
    buffer: Option<Vec<u8>>,
    status: Result<()>,
}

impl Default for RowCacheContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RowCacheContext {
    pub fn new() -> Self {
        RowCacheContext {
            buffer: None,
            status: Ok(()),
        }
    }

    /// Append one version to the log, decoding `value` in place.
    pub fn record_version(&mut self, value_type: ValueType, value: &mut LazyValue) {
        if self.status.is_err() {
            return;
        }
        if let Err(e) = self.append(value_type, value) {
            log::warn!("row cache: abandoning replay log: {e}");
            self.status = Err(e);
        }
    }

    fn append(&mut self, value_type: ValueType, value: &mut LazyValue) -> Result<()> {
        let bytes = value.decode()?;
        // Most logs hold a single record: size the buffer for exactly one.
        let buf = self.buffer.get_or_insert_with(|| {
            Vec::with_capacity(1 + varint_length(bytes.len() as u64) + bytes.len() + CHECKSUM_LEN)
        });
        buf.push(value_type as u8);
        put_length_prefixed_slice(buf, &bytes)
    }

    /// Whether no record has been appended.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_none()
    }

    /// Local status of log construction.
    pub fn status(&self) -> Result<()> {
        self.status.clone()
    }

    /// Store the finished log under `key`. Does nothing if the log is empty or
    /// was abandoned; returns the construction status either way.
    pub fn commit(&mut self, key: &RowCacheKey, cache: &dyn RowCache) -> Result<()> {
        if self.status.is_ok() {
            if let Some(mut buf) = self.buffer.take() {
                debug_assert!(!key.is_empty());
                let crc = crc32fast::hash(&buf);
                buf.extend_from_slice(&crc.to_le_bytes());
                let charge = key.len() + buf.len() + size_of::<Bytes>();
                log::debug!("row cache: storing {} byte replay log", buf.len());
                cache.insert(key.as_bytes(), Bytes::from(buf), charge);
            }
        }
        self.status.clone()
    }

    /// Replay a cached log for `key` into `ctx`. Returns whether an entry was
    /// found; the outcome of the lookup is left in `ctx`.
    ///
    /// Cached records carry no sequence numbers and are presented as
    /// `MAX_SEQUENCE_NUMBER`, so `ctx` must not track sequences and its read
    /// callback, if any, must accept that sequence.
    pub fn try_get_from_cache(
        key: &RowCacheKey,
        cache: &dyn RowCache,
        ctx: &mut GetContext<'_>,
        statistics: Option<&Statistics>,
    ) -> bool {
        debug_assert!(!ctx.need_to_read_sequence());
        let Some(payload) = cache.lookup(key.as_bytes()) else {
            record_tick(statistics, Ticker::RowCacheMiss, 1);
            return false;
        };
        let records = match decode_replay_log(&payload) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("row cache: ignoring unreadable entry: {e}");
                record_tick(statistics, Ticker::RowCacheMiss, 1);
                return false;
            }
        };
        for (value_type, value) in records {
            let parsed = ParsedInternalKey::new(key.user_key(), MAX_SEQUENCE_NUMBER, value_type);
            if !ctx.consider_version(parsed, LazyValue::Plain(value)) {
                break;
            }
        }
        record_tick(statistics, Ticker::RowCacheHit, 1);
        true
    }
}

impl ReplayLog for RowCacheContext {
    fn add_replay_log(&mut self, value_type: ValueType, value: &mut LazyValue) {
        self.record_version(value_type, value);
    }
}

/// Validate a payload and split it into records. Values are slices of
/// `payload` and keep it pinned.
fn decode_replay_log(payload: &Bytes) -> Result<Vec<(ValueType, Bytes)>> {
    if payload.len() < CHECKSUM_LEN {
        return Err(Error::Corruption("row cache payload too short".into()));
    }
    let body_len = payload.len() - CHECKSUM_LEN;
    let (body, trailer) = payload.split_at(body_len);
    let stored = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let actual = crc32fast::hash(body);
    if stored != actual {
        return Err(Error::Corruption(format!(
            "row cache checksum mismatch: expected {stored:#x}, got {actual:#x}"
        )));
    }

    let mut records = Vec::new();
    let mut pos = 0;
    while pos < body_len {
        let value_type = ValueType::try_from(body[pos])?;
        pos += 1;
        let (range, consumed) = get_length_prefixed_slice(&body[pos..])?;
        records.push((value_type, payload.slice(pos + range.start..pos + range.end)));
        pos += consumed;
    }
    Ok(records)
}
