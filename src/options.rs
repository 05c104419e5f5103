use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::memtable::skiplist::MAX_HEIGHT;

/// Configuration of a prefix-hash write buffer.
///
/// Defaults match a large write buffer: one million slots, and short
/// skip lists (height 4, branching 4) since each bucket is expected to hold
/// only the keys of a handful of prefixes.
///
/// Buckets are `crossbeam_skiplist::SkipMap`s, whose shape is fixed, so the
/// two skip list settings are validated and carried for configuration
/// compatibility but do not change bucket layout. Full-order snapshots always
/// use the full-height skip list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashSkipListOptions {
    /// Number of bucket slots. Fixed for the buffer's lifetime.
    pub bucket_count: usize,
    /// Maximum node height of a bucket skip list (1..=MAX_HEIGHT).
    pub skiplist_height: usize,
    /// A node grows one more level with probability 1/branching_factor.
    pub skiplist_branching_factor: u32,
}

impl Default for HashSkipListOptions {
    fn default() -> Self {
        HashSkipListOptions {
            bucket_count: 1_000_000,
            skiplist_height: 4,
            skiplist_branching_factor: 4,
        }
    }
}

impl HashSkipListOptions {
    /// Name under which this buffer kind is configured.
    pub const NAME: &'static str = "prefix_hash";

    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    /// Build options from string key/value pairs, e.g. parsed from an
    /// options file. Unknown keys are ignored; missing keys keep defaults.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let mut opts = HashSkipListOptions::default();
        if let Some(v) = map.get("bucket_count") {
            opts.bucket_count = parse("bucket_count", v)?;
        }
        if let Some(v) = map.get("skiplist_height") {
            opts.skiplist_height = parse("skiplist_height", v)?;
        }
        if let Some(v) = map.get("skiplist_branching_factor") {
            opts.skiplist_branching_factor = parse("skiplist_branching_factor", v)?;
        }
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_count == 0 {
            return Err(Error::InvalidArgument("bucket_count must be > 0".into()));
        }
        if self.skiplist_height == 0 || self.skiplist_height > MAX_HEIGHT {
            return Err(Error::InvalidArgument(format!(
                "skiplist_height must be in 1..={MAX_HEIGHT}, got {}",
                self.skiplist_height
            )));
        }
        if self.skiplist_branching_factor < 2 {
            return Err(Error::InvalidArgument(format!(
                "skiplist_branching_factor must be >= 2, got {}",
                self.skiplist_branching_factor
            )));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("{name}: cannot parse {value:?}")))
}
