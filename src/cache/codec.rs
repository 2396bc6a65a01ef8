//! Binary serialization of cache entries.
//!
//! # Wire layout
//!
//! All length prefixes are `u32` little-endian. Fields in order:
//!
//! ```text
//! body length      + body bytes
//! header count
//!   per header:    name length + name bytes
//!                  value count
//!     per value:   value length + value bytes
//! timestamp length (16)
//!                  i64 seconds since Unix epoch
//!                  u32 subsecond nanoseconds
//!                  i32 UTC offset seconds (always 0)
//! ```
//!
//! Header iteration order is not canonical; decode treats headers as a
//! mapping, not a sequence. The flat buffer is wrapped in standard base64 so
//! text-only stores can hold it; `decode` reverses both layers.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::{BufMut, Bytes, BytesMut};

use super::entry::CacheEntry;

const TIMESTAMP_LEN: u32 = 16;

/// Error type for malformed stored bytes. Callers treat any variant as a
/// cache miss, never a fatal error.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid base64 wrapping: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("length prefix claims {claimed} bytes but only {remaining} remain")]
    Truncated { claimed: usize, remaining: usize },

    #[error("timestamp block has length {0}, expected {TIMESTAMP_LEN}")]
    TimestampLength(u32),

    #[error("timestamp is out of range")]
    TimestampRange,

    #[error("invalid header name: {0}")]
    HeaderName(#[from] axum::http::header::InvalidHeaderName),

    #[error("invalid header value: {0}")]
    HeaderValue(#[from] axum::http::header::InvalidHeaderValue),
}

/// Serialize an entry to its base64-wrapped binary form.
pub fn encode(entry: &CacheEntry) -> String {
    let mut buf = BytesMut::with_capacity(entry.body.len() + 64);

    buf.put_u32_le(entry.body.len() as u32);
    buf.put_slice(&entry.body);

    buf.put_u32_le(entry.headers.keys_len() as u32);
    for name in entry.headers.keys() {
        let name_bytes = name.as_str().as_bytes();
        buf.put_u32_le(name_bytes.len() as u32);
        buf.put_slice(name_bytes);

        let values = entry.headers.get_all(name);
        buf.put_u32_le(values.iter().count() as u32);
        for value in values {
            buf.put_u32_le(value.as_bytes().len() as u32);
            buf.put_slice(value.as_bytes());
        }
    }

    // Instants before the epoch clamp to it; TTLs are always in the future.
    let since_epoch = entry
        .expires_at
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    buf.put_u32_le(TIMESTAMP_LEN);
    buf.put_i64_le(since_epoch.as_secs() as i64);
    buf.put_u32_le(since_epoch.subsec_nanos());
    buf.put_i32_le(0);

    BASE64.encode(&buf)
}

/// Deserialize an entry from its base64-wrapped binary form.
pub fn decode(data: &[u8]) -> Result<CacheEntry, DecodeError> {
    let raw = BASE64.decode(data)?;
    let mut reader = Reader::new(&raw);

    let body_len = reader.read_u32()?;
    let body = Bytes::copy_from_slice(reader.read_bytes(body_len as usize)?);

    let header_count = reader.read_u32()?;
    let mut headers = HeaderMap::new();
    for _ in 0..header_count {
        let name_len = reader.read_u32()?;
        let name = HeaderName::from_bytes(reader.read_bytes(name_len as usize)?)?;

        let value_count = reader.read_u32()?;
        for _ in 0..value_count {
            let value_len = reader.read_u32()?;
            let value = HeaderValue::from_bytes(reader.read_bytes(value_len as usize)?)?;
            headers.append(name.clone(), value);
        }
    }

    let timestamp_len = reader.read_u32()?;
    if timestamp_len != TIMESTAMP_LEN {
        return Err(DecodeError::TimestampLength(timestamp_len));
    }
    let secs = reader.read_i64()?;
    let nanos = reader.read_u32()?;
    let _utc_offset = reader.read_i32()?;

    let secs = u64::try_from(secs).map_err(|_| DecodeError::TimestampRange)?;
    if nanos >= 1_000_000_000 {
        return Err(DecodeError::TimestampRange);
    }
    let expires_at = UNIX_EPOCH + Duration::new(secs, nanos);

    Ok(CacheEntry::new(body, headers, expires_at))
}

/// Bounds-checked cursor over the decoded buffer.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.buf.len() - self.pos;
        if len > remaining {
            return Err(DecodeError::Truncated {
                claimed: len,
                remaining,
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let b = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        let b = self.read_bytes(8)?;
        Ok(i64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}
