//! Two-representation body storage.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by payload readers and writers.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The body has no declared length (e.g. chunked request bodies).
    #[error("body length was not declared")]
    UnsupportedLength,

    /// The backing file could not be opened, read or written.
    #[error("payload file error: {0}")]
    Io(#[from] std::io::Error),
}

/// A request or response body.
///
/// Exactly one representation is active for the lifetime of the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Body held in memory.
    Inline(Vec<u8>),
    /// Body held in a file on disk, opened lazily by readers and writers.
    File(PathBuf),
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Inline(Vec::new())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Inline(bytes)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Inline(text.as_bytes().to_vec())
    }
}

impl Payload {
    /// A disk-backed payload under `dir` with a freshly generated file name.
    ///
    /// The file is not created until a reader opens it.
    pub fn spill_to(dir: impl AsRef<Path>) -> Self {
        let name = format!("spillway-{}.body", uuid::Uuid::new_v4().simple());
        Payload::File(dir.as_ref().join(name))
    }

    /// A disk-backed payload in the platform temp directory.
    pub fn spill_to_temp() -> Self {
        Self::spill_to(std::env::temp_dir())
    }

    /// Size in bytes.
    ///
    /// For file payloads this is the OS-reported size, or 0 when the file
    /// cannot be stat'ed.
    pub fn size(&self) -> u64 {
        match self {
            Payload::Inline(bytes) => bytes.len() as u64,
            Payload::File(path) => std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Payload::Inline(_))
    }

    /// Backing file path, if disk-backed.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Payload::Inline(_) => None,
            Payload::File(path) => Some(path),
        }
    }

    /// In-memory bytes, if inline.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Inline(bytes) => Some(bytes),
            Payload::File(_) => None,
        }
    }

    /// Delete the backing file of a disk-backed payload.
    ///
    /// Inline payloads and already-missing files are a no-op.
    pub async fn remove_file(&self) -> std::io::Result<()> {
        match self {
            Payload::Inline(_) => Ok(()),
            Payload::File(path) => match tokio::fs::remove_file(path).await {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty_inline() {
        let payload = Payload::default();
        assert!(payload.is_inline());
        assert_eq!(payload.size(), 0);
        assert_eq!(payload.as_bytes(), Some(&[][..]));
    }

    #[test]
    fn inline_size_is_byte_count() {
        let payload = Payload::from("hello world");
        assert_eq!(payload.size(), 11);
    }

    #[test]
    fn spill_names_are_unique() {
        let a = Payload::spill_to("/tmp");
        let b = Payload::spill_to("/tmp");
        assert_ne!(a, b);
        assert!(a.path().unwrap().starts_with("/tmp"));
        assert!(!a.is_inline());
    }

    #[test]
    fn missing_file_has_zero_size() {
        let dir = tempfile::tempdir().unwrap();
        let payload = Payload::spill_to(dir.path());
        assert_eq!(payload.size(), 0);
    }

    #[test]
    fn file_size_tracks_disk() {
        let dir = tempfile::tempdir().unwrap();
        let payload = Payload::spill_to(dir.path());
        std::fs::write(payload.path().unwrap(), vec![7u8; 1234]).unwrap();
        assert_eq!(payload.size(), 1234);

        std::fs::write(payload.path().unwrap(), b"abc").unwrap();
        assert_eq!(payload.size(), 3);
    }

    #[tokio::test]
    async fn remove_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let payload = Payload::spill_to(dir.path());
        std::fs::write(payload.path().unwrap(), b"x").unwrap();

        payload.remove_file().await.unwrap();
        assert!(!payload.path().unwrap().exists());
        payload.remove_file().await.unwrap();

        Payload::from("inline").remove_file().await.unwrap();
    }
}
