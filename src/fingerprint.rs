//! Content fingerprints for change detection.
//!
//! A [`Fingerprint`] is the SHA-256 digest of a byte sequence. It gates
//! every write in the build: generated pages and mirrored assets are only
//! written when the fingerprint of the new content differs from the
//! fingerprint of what is already on disk.
//!
//! Fingerprints are content-based rather than mtime-based so that they
//! survive `git checkout` and other operations that reset timestamps. They
//! are not a security boundary; collisions are not a concern here.
//!
//! Files are always hashed by streaming through a fixed buffer, never by
//! reading them into memory whole.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// SHA-256 digest of exact byte content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    fn from_hasher(hasher: Sha256) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Incremental hasher for content that arrives in chunks, e.g. while it
/// is being copied somewhere else.
#[derive(Default)]
pub struct Fingerprinter(Sha256);

impl Fingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.0.update(chunk);
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint::from_hasher(self.0)
    }
}

/// Fingerprint of an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Fingerprint::from_hasher(hasher)
}

/// Fingerprint of everything `reader` yields.
pub fn hash_reader(mut reader: impl Read) -> io::Result<Fingerprint> {
    let mut hasher = Fingerprinter::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}

/// Fingerprint of an existing file.
///
/// Returns `Ok(None)` when the file does not exist: a missing destination
/// simply means there is no previous output. Every other error is returned.
pub fn hash_file(path: &Path) -> io::Result<Option<Fingerprint>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    hash_reader(file).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn hash_bytes_deterministic() {
        assert_eq!(hash_bytes(b"hello world"), hash_bytes(b"hello world"));
    }

    #[test]
    fn hash_bytes_changes_with_content() {
        assert_ne!(hash_bytes(b"version 1"), hash_bytes(b"version 2"));
    }

    #[test]
    fn display_is_lowercase_hex() {
        let hex = hash_bytes(b"").to_string();
        assert_eq!(hex.len(), 64); // SHA-256 hex is 64 chars
        assert_eq!(
            hex,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn reader_matches_bytes() {
        let data = vec![7u8; 200_000]; // spans several buffer fills
        assert_eq!(hash_reader(&data[..]).unwrap(), hash_bytes(&data));
    }

    #[test]
    fn chunked_matches_whole() {
        let mut h = Fingerprinter::new();
        h.update(b"hello ");
        h.update(b"world");
        assert_eq!(h.finish(), hash_bytes(b"hello world"));
    }

    #[test]
    fn hash_file_matches_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.bin");
        fs::write(&path, b"hello world").unwrap();

        assert_eq!(hash_file(&path).unwrap(), Some(hash_bytes(b"hello world")));
    }

    #[test]
    fn hash_file_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(hash_file(&tmp.path().join("nope")).unwrap(), None);
    }

    #[test]
    fn hash_file_on_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        // Opening succeeds on unix but reading a directory fails
        assert!(hash_file(tmp.path()).is_err());
    }
}
