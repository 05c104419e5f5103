use std::sync::atomic::{AtomicU64, Ordering};

/// Counters recorded by the lookup path. Best-effort instrumentation:
/// updates use relaxed ordering and are not part of any correctness contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ticker {
    BlockCacheHit,
    BlockCacheMiss,
    BlockCacheAdd,
    BlockCacheBytesRead,
    BlockCacheBytesWrite,
    BlockCacheIndexHit,
    BlockCacheIndexMiss,
    BlockCacheIndexAdd,
    BlockCacheIndexBytesInsert,
    BlockCacheFilterHit,
    BlockCacheFilterMiss,
    BlockCacheFilterAdd,
    BlockCacheFilterBytesInsert,
    BlockCacheDataHit,
    BlockCacheDataMiss,
    BlockCacheDataAdd,
    BlockCacheDataBytesInsert,
    RowCacheHit,
    RowCacheMiss,
}

impl Ticker {
    pub const COUNT: usize = Ticker::RowCacheMiss as usize + 1;
}

/// Shared sink for [`Ticker`] counts.
#[derive(Debug)]
pub struct Statistics {
    tickers: [AtomicU64; Ticker::COUNT],
}

impl Default for Statistics {
    fn default() -> Self {
        Statistics {
            tickers: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self, ticker: Ticker, count: u64) {
        self.tickers[ticker as usize].fetch_add(count, Ordering::Relaxed);
    }

    pub fn ticker_count(&self, ticker: Ticker) -> u64 {
        self.tickers[ticker as usize].load(Ordering::Relaxed)
    }
}

/// Record into an optional sink.
pub(crate) fn record_tick(stats: Option<&Statistics>, ticker: Ticker, count: u64) {
    if let Some(s) = stats {
        s.record_tick(ticker, count);
    }
}
