//! Chunk record codec for binary diffs.
//!
//! A binary diff is a sequence of records, one per differing chunk pair:
//!
//! ```text
//! offset u32 BE | old_len u32 BE | new_len u32 BE | old_bytes | new_bytes
//! ```
//!
//! The encoded sequence is zstd-compressed before it is stored in a
//! [`DiffEntry::BinaryModified`](super::DiffEntry::BinaryModified).

use std::io::Read;

const HEADER_LEN: usize = 12;
const ZSTD_LEVEL: i32 = 3;

/// One differing chunk pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Byte offset of the chunk in both files
    pub offset: u32,
    pub old_bytes: Vec<u8>,
    pub new_bytes: Vec<u8>,
}

/// Failure decoding a record stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RecordDecodeError {
    #[error("record stream truncated at byte {at}: needed {needed} more bytes, {available} available")]
    Truncated {
        at: usize,
        needed: usize,
        available: usize,
    },
}

/// Serialise records back to back.
#[must_use]
pub fn encode_chunk_records(records: &[ChunkRecord]) -> Vec<u8> {
    let total: usize = records
        .iter()
        .map(|r| HEADER_LEN + r.old_bytes.len() + r.new_bytes.len())
        .sum();
    let mut out = Vec::with_capacity(total);
    for record in records {
        out.extend_from_slice(&record.offset.to_be_bytes());
        out.extend_from_slice(&len_u32(record.old_bytes.len()).to_be_bytes());
        out.extend_from_slice(&len_u32(record.new_bytes.len()).to_be_bytes());
        out.extend_from_slice(&record.old_bytes);
        out.extend_from_slice(&record.new_bytes);
    }
    out
}

// Chunk sizes are validated to fit in u32 at configuration time.
fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Parse a record stream produced by [`encode_chunk_records`].
pub fn decode_chunk_records(bytes: &[u8]) -> Result<Vec<ChunkRecord>, RecordDecodeError> {
    let mut records = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let header = take(bytes, pos, HEADER_LEN)?;
        let offset = read_u32(&header[0..4]);
        let old_len = read_u32(&header[4..8]) as usize;
        let new_len = read_u32(&header[8..12]) as usize;
        pos += HEADER_LEN;

        let old_bytes = take(bytes, pos, old_len)?.to_vec();
        pos += old_len;
        let new_bytes = take(bytes, pos, new_len)?.to_vec();
        pos += new_len;

        records.push(ChunkRecord {
            offset,
            old_bytes,
            new_bytes,
        });
    }
    Ok(records)
}

fn take(bytes: &[u8], at: usize, needed: usize) -> Result<&[u8], RecordDecodeError> {
    let available = bytes.len().saturating_sub(at);
    if needed > available {
        return Err(RecordDecodeError::Truncated {
            at,
            needed,
            available,
        });
    }
    Ok(&bytes[at..at + needed])
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

/// zstd-compress an encoded record stream.
pub fn compress_records(encoded: &[u8]) -> std::io::Result<Vec<u8>> {
    zstd::encode_all(encoded, ZSTD_LEVEL)
}

/// Reverse of [`compress_records`].
pub fn decompress_records(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    zstd::decode_all(compressed)
}

/// Decompress and decode a stored binary diff payload.
pub fn unpack_records(compressed: &[u8]) -> Result<Vec<ChunkRecord>, String> {
    let encoded = decompress_records(compressed).map_err(|e| e.to_string())?;
    decode_chunk_records(&encoded).map_err(|e| e.to_string())
}

/// Fill `buf` from `reader` until it is full or the reader is exhausted.
pub(crate) fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
