//! Variable-length integer and length-prefixed slice encoding.
//!
//! ```text
//! varint:   7 data bits per byte, low bits first, MSB set on all but the last byte
//! prefixed: [varint32 len][len bytes]
//! ```

use crate::error::{Error, Result};

/// Maximum encoded size of a 64-bit varint.
pub const MAX_VARINT64_LEN: usize = 10;

/// Append `v` as a varint.
pub fn put_varint64(buf: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        buf.push((v as u8) | 0x80);
        v >>= 7;
    }
    buf.push(v as u8);
}

pub fn put_varint32(buf: &mut Vec<u8>, v: u32) {
    put_varint64(buf, v as u64);
}

/// Number of bytes `v` occupies as a varint.
pub fn varint_length(mut v: u64) -> usize {
    let mut len = 1;
    while v >= 0x80 {
        v >>= 7;
        len += 1;
    }
    len
}

/// Decode a varint from the front of `data`, returning (value, bytes_consumed).
pub fn get_varint64(data: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    for (i, &byte) in data.iter().enumerate().take(MAX_VARINT64_LEN) {
        // the tenth byte holds only the top bit of a u64
        if i == MAX_VARINT64_LEN - 1 && byte > 1 {
            return Err(Error::Corruption("varint64 overflow".into()));
        }
        result |= ((byte & 0x7F) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }
    if data.len() >= MAX_VARINT64_LEN {
        Err(Error::Corruption("varint64 too long".into()))
    } else {
        Err(Error::Eof)
    }
}

pub fn get_varint32(data: &[u8]) -> Result<(u32, usize)> {
    let (v, n) = get_varint64(data)?;
    let v = u32::try_from(v).map_err(|_| Error::Corruption("varint32 overflow".into()))?;
    Ok((v, n))
}

/// Append `value` prefixed with its varint32 length.
/// Fails without writing if `value` is too long for a varint32 prefix.
pub fn put_length_prefixed_slice(buf: &mut Vec<u8>, value: &[u8]) -> Result<()> {
    put_length_prefix(buf, value.len())?;
    buf.extend_from_slice(value);
    Ok(())
}

/// Append `len` as a varint32 length prefix.
pub fn put_length_prefix(buf: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| Error::InvalidArgument(format!("length {len} does not fit a varint32 prefix")))?;
    put_varint32(buf, len);
    Ok(())
}

/// Decode a length-prefixed slice from the front of `data`.
/// Returns the byte range of the slice within `data` and the bytes consumed.
pub fn get_length_prefixed_slice(data: &[u8]) -> Result<(std::ops::Range<usize>, usize)> {
    let (len, n) = get_varint32(data)?;
    let end = n + len as usize;
    if data.len() < end {
        return Err(Error::Eof);
    }
    Ok((n..end, end))
}
