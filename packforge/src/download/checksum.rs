//! SHA-256 checksums for downloaded artifacts.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Buffer size for streaming reads (64 KiB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Compute the SHA-256 checksum of a file as lowercase hex.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Whether the file at `path` exists and hashes to `expected`.
///
/// Comparison is case-insensitive; manifests and HTTP headers disagree
/// about hex casing.
pub fn file_matches(path: &Path, expected: &str) -> bool {
    match file_sha256(path) {
        Ok(actual) => actual.eq_ignore_ascii_case(expected),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_file_sha256_known_value() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"hello world").unwrap();

        // SHA-256 of "hello world"
        assert_eq!(
            file_sha256(&path).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_file_matches_case_insensitive() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.txt");
        std::fs::write(&path, b"hello world").unwrap();

        assert!(file_matches(
            &path,
            "B94D27B9934D3E08A52E52D7DA7DABFAC484EFE37A5380EE9088F7ACE2EFCDE9"
        ));
        assert!(!file_matches(&path, "0000"));
    }

    #[test]
    fn test_file_matches_missing_file() {
        assert!(!file_matches(Path::new("/does/not/exist"), "abc"));
    }
}
