//! Content hashing utilities.

use sha2::{Digest, Sha256};
use std::io::Read;

/// Buffer size used when streaming file content into the hasher.
const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Compute a lowercase hex SHA-256 digest for arbitrary bytes
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Stream a reader through SHA-256 and return the lowercase hex digest.
pub fn sha256_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_reader_matches_slice() {
        let data = vec![7u8; HASH_BUFFER_SIZE * 2 + 13];
        let streamed = sha256_reader(data.as_slice()).unwrap();
        assert_eq!(streamed, sha256_hex(&data));
        assert_eq!(streamed.len(), 64);
    }
}
