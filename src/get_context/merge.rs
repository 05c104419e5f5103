use bytes::{Bytes, BytesMut};

use crate::error::Result;

/// Folds merge operands into a value.
pub trait MergeOperator: Send + Sync {
    fn name(&self) -> &str;

    /// Combine an optional base value with `operands`, given oldest first
    /// (the order in which they are applied).
    fn full_merge(&self, key: &[u8], existing: Option<&[u8]>, operands: &[Bytes]) -> Result<Bytes>;

    /// Whether the operands collected so far, newest first, are enough to
    /// stop looking for older versions.
    fn should_merge(&self, _operands: &[Bytes]) -> bool {
        false
    }
}

/// Pending merge operands of one lookup, in encounter order (newest first).
#[derive(Debug, Default, Clone)]
pub struct MergeContext {
    operands: Vec<Bytes>,
}

impl MergeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_operand(&mut self, operand: Bytes) {
        self.operands.push(operand);
    }

    pub fn operands_newest_first(&self) -> &[Bytes] {
        &self.operands
    }

    /// Operands in application order.
    pub fn operands_oldest_first(&self) -> Vec<Bytes> {
        self.operands.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.operands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }
}

/// Appends operands to the base value, oldest first, joined by an optional
/// delimiter.
#[derive(Debug, Clone, Default)]
pub struct StringAppendOperator {
    delimiter: Option<u8>,
}

impl StringAppendOperator {
    pub fn new(delimiter: Option<u8>) -> Self {
        StringAppendOperator { delimiter }
    }
}

impl MergeOperator for StringAppendOperator {
    fn name(&self) -> &str {
        "StringAppendOperator"
    }

    fn full_merge(&self, _key: &[u8], existing: Option<&[u8]>, operands: &[Bytes]) -> Result<Bytes> {
        let cap = existing.map_or(0, <[u8]>::len) + operands.iter().map(|o| o.len() + 1).sum::<usize>();
        let mut out = BytesMut::with_capacity(cap);
        let parts = existing.into_iter().chain(operands.iter().map(|o| &o[..]));
        for (i, part) in parts.enumerate() {
            if i > 0 {
                if let Some(d) = self.delimiter {
                    out.extend_from_slice(&[d]);
                }
            }
            out.extend_from_slice(part);
        }
        Ok(out.freeze())
    }
}
