//! Content digests for duplicate detection.

use crate::error::{SortError, SortResult};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 8 * 1024;

/// Hex-encoded BLAKE3 digest of a file's full content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the digest of the file at `path`, reading it in fixed-size chunks.
///
/// Permission and I/O errors come back as [`SortError::DigestFailed`] so the
/// caller can fall through to plain classification.
pub fn digest(path: &Path) -> SortResult<ContentDigest> {
    let failed = |source| SortError::DigestFailed {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(failed)?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0_u8; CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(failed)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(ContentDigest(hasher.finalize().to_hex().to_string()))
}
