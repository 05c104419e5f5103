/// Maps a user key to the byte span used for hash partitioning.
///
/// Implementations must be pure: the same key always yields the same prefix.
pub trait SliceTransform: Send + Sync {
    fn name(&self) -> &str;

    /// The prefix of `key`. Must be a sub-slice of `key`.
    fn transform<'k>(&self, key: &'k [u8]) -> &'k [u8];
}

/// The first `len` bytes of a key; shorter keys map to themselves.
#[derive(Debug, Clone, Copy)]
pub struct FixedPrefixTransform {
    len: usize,
}

impl FixedPrefixTransform {
    pub fn new(len: usize) -> Self {
        FixedPrefixTransform { len }
    }
}

impl SliceTransform for FixedPrefixTransform {
    fn name(&self) -> &str {
        "fixed_prefix"
    }

    fn transform<'k>(&self, key: &'k [u8]) -> &'k [u8] {
        &key[..key.len().min(self.len)]
    }
}

/// Uses the whole key as its prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransform;

impl SliceTransform for NoopTransform {
    fn name(&self) -> &str {
        "noop"
    }

    fn transform<'k>(&self, key: &'k [u8]) -> &'k [u8] {
        key
    }
}
