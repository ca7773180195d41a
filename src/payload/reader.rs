//! Inbound adapter: streams a length-delimited body into a [`Payload`].

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::storage::{Payload, PayloadError};

/// Upper bound on up-front buffer reservation, whatever the peer declares.
const MAX_RESERVE: u64 = 64 * 1024;

/// Writes body chunks into a payload.
///
/// Call order is `init` → `put`* → `finish`.
#[derive(Debug)]
pub struct PayloadReader<'a> {
    payload: &'a mut Payload,
    file: Option<File>,
}

impl<'a> PayloadReader<'a> {
    pub fn new(payload: &'a mut Payload) -> Self {
        Self { payload, file: None }
    }

    /// Prepare for a body of `declared_length` bytes.
    ///
    /// Fails with [`PayloadError::UnsupportedLength`] when no length was
    /// declared, in either storage mode.
    pub async fn init(&mut self, declared_length: Option<u64>) -> Result<(), PayloadError> {
        let length = declared_length.ok_or(PayloadError::UnsupportedLength)?;

        match self.payload {
            Payload::Inline(bytes) => {
                bytes.reserve(length.min(MAX_RESERVE) as usize);
            }
            Payload::File(path) => {
                self.file = Some(File::create(&*path).await?);
            }
        }
        Ok(())
    }

    /// Append a chunk, returning the number of bytes consumed.
    pub async fn put(&mut self, chunk: &[u8]) -> Result<usize, PayloadError> {
        match self.payload {
            Payload::Inline(bytes) => {
                bytes.extend_from_slice(chunk);
                Ok(chunk.len())
            }
            Payload::File(_) => {
                let file = self.file.as_mut().ok_or_else(file_not_open)?;
                file.write_all(chunk).await?;
                Ok(chunk.len())
            }
        }
    }

    /// Complete the body. Never fails; a flush error is only logged.
    pub async fn finish(mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush().await {
                tracing::warn!(path = ?self.payload.path(), error = %e, "Failed to flush payload file");
            }
        }
    }
}

fn file_not_open() -> PayloadError {
    PayloadError::Io(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "payload file is not open",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn undeclared_length_is_unsupported() {
        let mut inline = Payload::default();
        let err = PayloadReader::new(&mut inline).init(None).await.unwrap_err();
        assert!(matches!(err, PayloadError::UnsupportedLength));

        let dir = tempfile::tempdir().unwrap();
        let mut file = Payload::spill_to(dir.path());
        let err = PayloadReader::new(&mut file).init(None).await.unwrap_err();
        assert!(matches!(err, PayloadError::UnsupportedLength));
        // Nothing was created on disk.
        assert!(!file.path().unwrap().exists());
    }

    #[tokio::test]
    async fn inline_appends_chunks() {
        let mut payload = Payload::default();
        let mut reader = PayloadReader::new(&mut payload);
        reader.init(Some(11)).await.unwrap();
        assert_eq!(reader.put(b"hello ").await.unwrap(), 6);
        assert_eq!(reader.put(b"world").await.unwrap(), 5);
        reader.finish().await;

        assert_eq!(payload.as_bytes(), Some(&b"hello world"[..]));
        assert_eq!(payload.size(), 11);
    }

    #[tokio::test]
    async fn file_receives_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let mut payload = Payload::spill_to(dir.path());
        let mut reader = PayloadReader::new(&mut payload);
        reader.init(Some(5000)).await.unwrap();
        for _ in 0..5 {
            reader.put(&[b'z'; 1000]).await.unwrap();
        }
        reader.finish().await;

        assert_eq!(payload.size(), 5000);
    }

    #[tokio::test]
    async fn file_open_failure_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut payload = Payload::spill_to(dir.path().join("missing-subdir"));
        let mut reader = PayloadReader::new(&mut payload);

        let err = reader.init(Some(10)).await.unwrap_err();
        assert!(matches!(err, PayloadError::Io(_)));

        let err = reader.put(b"data").await.unwrap_err();
        assert!(matches!(err, PayloadError::Io(_)));
    }
}
