//! MD5 checksum of the emitted manifest.
//!
//! The digest is computed from the bytes read back from disk, never from the
//! in-memory string, because clients verify exactly the file they download.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use serde::Serialize;
use tracing::info;

use crate::error::{RepoError, Result};

/// A written checksum file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumFile {
    pub path: PathBuf,
    pub digest: String,
}

/// Lowercase hex MD5 of `bytes`.
pub fn md5_hex(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Lowercase hex MD5 of the file at `path`.
pub fn digest_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| RepoError::Checksum {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(md5_hex(&bytes))
}

/// Sibling path with `.md5` appended (`addons.xml` -> `addons.xml.md5`).
pub fn sibling_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".md5");
    path.with_file_name(name)
}

/// Hash `path` and write the digest, with no trailing newline, next to it.
pub fn write_checksum(path: &Path) -> Result<ChecksumFile> {
    let digest = digest_file(path)?;
    let checksum_path = sibling_path(path);
    fs::write(&checksum_path, &digest).map_err(|source| RepoError::Checksum {
        path: checksum_path.clone(),
        source,
    })?;
    info!(path = %checksum_path.display(), %digest, "Wrote checksum");
    Ok(ChecksumFile {
        path: checksum_path,
        digest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn known_digests() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            md5_hex(b"The quick brown fox jumps over the lazy dog"),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
    }

    #[test]
    fn sibling_appends_extension() {
        assert_eq!(
            sibling_path(Path::new("/out/addons.xml")),
            PathBuf::from("/out/addons.xml.md5")
        );
    }

    #[test]
    fn writes_digest_of_bytes_on_disk() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("addons.xml");
        let bytes = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<addons>\n</addons>\n";
        std::fs::write(&manifest, bytes).unwrap();

        let written = write_checksum(&manifest).unwrap();

        let content = std::fs::read_to_string(&written.path).unwrap();
        assert_eq!(content, md5_hex(bytes.as_bytes()));
        assert_eq!(content.len(), 32);
        assert!(content.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        // Hashing the emitted file again reproduces the same digest.
        assert_eq!(digest_file(&manifest).unwrap(), content);
    }

    #[test]
    fn missing_manifest_is_a_checksum_error() {
        let temp = TempDir::new().unwrap();
        let err = write_checksum(&temp.path().join("addons.xml")).unwrap_err();
        assert!(matches!(err, RepoError::Checksum { .. }));
        assert!(!temp.path().join("addons.xml.md5").exists());
    }
}
