//! Text/binary conversions at interface boundaries
//!
//! Binary records crossing a text seam are base64-encoded; text records
//! crossing a binary seam become their UTF-8 bytes. The sequence adapters are
//! lazy - nothing is converted until the consumer pulls the element - so a
//! batching caller can encode one slice at a time. Callers that hand a
//! sequence to an asynchronous consumer must collect it first.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use crate::error::CodecError;

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;

/// Base64-encode a single binary record
#[inline]
pub fn encode(record: &[u8]) -> String {
    STANDARD.encode(record)
}

/// Decode a single base64 text record back to binary
#[inline]
pub fn decode(record: &str) -> Result<Bytes, CodecError> {
    Ok(Bytes::from(STANDARD.decode(record)?))
}

/// Convert a text record to its binary form (UTF-8 bytes)
#[inline]
pub fn text_to_binary(record: String) -> Bytes {
    Bytes::from(record.into_bytes())
}

/// Lazily base64-encode a sequence of binary records
pub fn encode_iter<'a, I>(records: I) -> impl Iterator<Item = String> + 'a
where
    I: IntoIterator<Item = &'a Bytes>,
    I::IntoIter: 'a,
{
    records.into_iter().map(|b| STANDARD.encode(b))
}

/// Lazily decode a sequence of base64 text records
pub fn decode_iter<I>(records: I) -> impl Iterator<Item = Result<Bytes, CodecError>>
where
    I: IntoIterator<Item = String>,
{
    records.into_iter().map(|s| decode(&s))
}

/// Decode a whole sequence, failing on the first invalid record
pub fn decode_all<I>(records: I) -> Result<Vec<Bytes>, CodecError>
where
    I: IntoIterator<Item = String>,
{
    decode_iter(records).collect()
}
