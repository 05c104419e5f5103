use std::fmt;

use bytes::Bytes;

use crate::error::Result;

/// Produces the bytes of a value that is not yet usable as-is.
pub type Decoder = Box<dyn FnOnce() -> Result<Bytes> + Send>;

/// A version's value as handed to the resolution path.
///
/// `Plain` bytes may be a slice of a shared buffer (a data block, a row-cache
/// payload): the buffer stays pinned until the last slice is dropped.
/// `Deferred` values need an in-place decode before use; a failed decode is a
/// corruption.
#[derive(Default)]
pub enum LazyValue {
    /// No value (tombstones, shadowed versions).
    #[default]
    Empty,
    Plain(Bytes),
    Deferred(Decoder),
}

impl LazyValue {
    pub fn deferred<F>(decode: F) -> Self
    where
        F: FnOnce() -> Result<Bytes> + Send + 'static,
    {
        LazyValue::Deferred(Box::new(decode))
    }

    /// Decode in place and return the bytes. `Empty` decodes to empty bytes.
    /// A failed decode is sticky: decoding again reports the same error.
    pub fn decode(&mut self) -> Result<Bytes> {
        let bytes = match std::mem::take(self) {
            LazyValue::Empty => Bytes::new(),
            LazyValue::Plain(b) => b,
            LazyValue::Deferred(decode) => match decode() {
                Ok(b) => b,
                Err(e) => {
                    let again = e.clone();
                    *self = LazyValue::deferred(move || Err(again));
                    return Err(e);
                }
            },
        };
        *self = LazyValue::Plain(bytes.clone());
        Ok(bytes)
    }

    /// The bytes, if already decoded.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            LazyValue::Plain(b) => Some(b),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        *self = LazyValue::Empty;
    }

    pub fn into_bytes(mut self) -> Result<Bytes> {
        self.decode()
    }
}

impl From<Bytes> for LazyValue {
    fn from(b: Bytes) -> Self {
        LazyValue::Plain(b)
    }
}

impl From<Vec<u8>> for LazyValue {
    fn from(v: Vec<u8>) -> Self {
        LazyValue::Plain(Bytes::from(v))
    }
}

impl From<&'static [u8]> for LazyValue {
    fn from(v: &'static [u8]) -> Self {
        LazyValue::Plain(Bytes::from_static(v))
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyValue::Empty => write!(f, "Empty"),
            LazyValue::Plain(b) => f.debug_tuple("Plain").field(b).finish(),
            LazyValue::Deferred(_) => write!(f, "Deferred(..)"),
        }
    }
}
