// src/checksum.rs

//! MD5 and SHA-256 helpers
//!
//! Feeds advertise both digests per package; conffile tracking is
//! MD5-based. Hashing streams the input, so large package archives never
//! land in memory whole.

use crate::error::Result;
use md5::Md5;
use sha2::{Digest, Sha256};
use std::fmt::Write;
use std::fs::File;
use std::io::Read;
use std::path::Path;

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

fn digest_reader<D: Digest, R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = D::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(to_hex(hasher.finalize().as_slice()))
}

/// Hex MD5 digest of a reader
pub fn md5_hex<R: Read>(reader: R) -> Result<String> {
    digest_reader::<Md5, R>(reader)
}

/// Hex SHA-256 digest of a reader
pub fn sha256_hex<R: Read>(reader: R) -> Result<String> {
    digest_reader::<Sha256, R>(reader)
}

/// Hex MD5 digest of a file's contents
pub fn file_md5sum(path: &Path) -> Result<String> {
    md5_hex(File::open(path)?)
}

/// Hex SHA-256 digest of a file's contents
pub fn file_sha256sum(path: &Path) -> Result<String> {
    sha256_hex(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_known_vector() {
        assert_eq!(
            md5_hex("".as_bytes()).unwrap(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            md5_hex("abc".as_bytes()).unwrap(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex("abc".as_bytes()).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_file_digests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            file_md5sum(&path).unwrap(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert_eq!(
            file_sha256sum(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
