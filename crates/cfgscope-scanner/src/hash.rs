//! Content hashing shared by the scanner and the profile engine

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Hex-encoded SHA256 of a byte slice
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA256 of a single file's contents
pub fn hash_file(path: &Path) -> io::Result<String> {
    let content = fs::read(path)?;
    Ok(sha256_hex(&content))
}

/// SHA256 over a directory tree
///
/// Files are visited in sorted relative-path order and each contributes its
/// relative path followed by its content, so renames change the hash.
/// Symlinks are not followed.
pub fn hash_dir(dir: &Path) -> io::Result<String> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let mut hasher = Sha256::new();
    for file in files {
        let relative = file.strip_prefix(dir).unwrap_or(&file);
        hasher.update(relative.to_string_lossy().replace('\\', "/").as_bytes());
        hasher.update([0u8]);
        hasher.update(fs::read(&file)?);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hash a file or directory, whichever `path` is
pub fn hash_path(path: &Path) -> io::Result<String> {
    if path.is_dir() {
        hash_dir(path)
    } else {
        hash_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_dir_hash_tracks_content_and_names() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("SKILL.md"), "one").unwrap();
        let first = hash_dir(dir.path()).unwrap();
        assert_eq!(first, hash_dir(dir.path()).unwrap());

        fs::write(dir.path().join("SKILL.md"), "two").unwrap();
        let second = hash_dir(dir.path()).unwrap();
        assert_ne!(first, second);

        fs::rename(dir.path().join("SKILL.md"), dir.path().join("OTHER.md")).unwrap();
        assert_ne!(second, hash_dir(dir.path()).unwrap());
    }
}
