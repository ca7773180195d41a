//! Outbound adapter: yields a [`Payload`] as a sequence of byte chunks.

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::storage::{Payload, PayloadError};

/// Size of one file read when streaming a disk-backed body.
pub const TRANSFER_BLOCK_SIZE: usize = 4096;

/// Reads a payload out in chunks.
///
/// Read errors on file payloads are recorded rather than returned, so the
/// data read before the failure is still handed out. Check [`error`] once
/// `get` reports no more data.
///
/// [`error`]: PayloadWriter::error
#[derive(Debug)]
pub struct PayloadWriter<'a> {
    payload: &'a Payload,
    file: Option<File>,
    block: Vec<u8>,
    done: bool,
    error: Option<std::io::Error>,
}

impl<'a> PayloadWriter<'a> {
    pub fn new(payload: &'a Payload) -> Self {
        Self {
            payload,
            file: None,
            block: Vec::new(),
            done: false,
            error: None,
        }
    }

    /// Open the backing file and allocate the transfer block.
    pub async fn init(&mut self) -> Result<(), PayloadError> {
        if let Payload::File(path) = self.payload {
            self.file = Some(File::open(path).await?);
            self.block = vec![0; TRANSFER_BLOCK_SIZE];
        }
        Ok(())
    }

    /// Next chunk of body data and whether more follows.
    ///
    /// Returns `None` once the body has been fully handed out.
    pub async fn get(&mut self) -> Option<(&[u8], bool)> {
        if self.done {
            return None;
        }

        let payload = self.payload;
        match payload {
            Payload::Inline(bytes) => {
                self.done = true;
                Some((bytes.as_slice(), false))
            }
            Payload::File(_) => {
                if self.file.is_none() {
                    self.error = Some(std::io::Error::new(
                        std::io::ErrorKind::NotConnected,
                        "payload file is not open",
                    ));
                    self.done = true;
                    return None;
                }
                let file = self.file.as_mut()?;

                let mut filled = 0;
                while filled < self.block.len() {
                    match file.read(&mut self.block[filled..]).await {
                        Ok(0) => break,
                        Ok(n) => filled += n,
                        Err(e) => {
                            self.error = Some(e);
                            break;
                        }
                    }
                }

                let more = self.error.is_none() && filled == self.block.len();
                if !more {
                    self.done = true;
                }
                Some((&self.block[..filled], more))
            }
        }
    }

    /// The read error that ended the stream early, if any.
    pub fn error(&self) -> Option<&std::io::Error> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<std::io::Error> {
        self.error.take()
    }
}
