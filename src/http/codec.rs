//! HTTP/1 wire codec.
//!
//! # Responsibilities
//! - Read and parse the header section into the session's read buffer
//! - Stream a length-delimited body through a [`PayloadReader`]
//! - Write a complete response, a bare head, or one chunk frame
//!
//! # Design Decisions
//! - Bytes past the header section stay buffered for the body read
//! - Head and first body chunk are coalesced into one buffer
//! - Empty data chunks are never framed (they would end the stream)

use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::error::SessionError;
use crate::http::request::RequestHead;
use crate::http::response::Response;
use crate::payload::{Payload, PayloadReader, PayloadWriter};

/// Maximum number of header fields accepted in one request.
pub const MAX_HEADERS: usize = 64;

/// Terminating zero-length chunk.
pub const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Read one request head.
///
/// Returns `Ok(None)` when the peer closes cleanly before sending any byte of
/// a new request.
pub async fn read_head<R>(
    io: &mut R,
    buf: &mut BytesMut,
    max_header_bytes: usize,
) -> Result<Option<RequestHead>, SessionError>
where
    R: AsyncRead + Unpin,
{
    loop {
        if !buf.is_empty() {
            let mut fields = [httparse::EMPTY_HEADER; MAX_HEADERS];
            let mut req = httparse::Request::new(&mut fields);
            match req.parse(&buf[..])? {
                httparse::Status::Complete(len) => {
                    if len > max_header_bytes {
                        return Err(header_too_large(max_header_bytes));
                    }
                    let head = RequestHead::from_parsed(&req)?;
                    buf.advance(len);
                    return Ok(Some(head));
                }
                httparse::Status::Partial => {
                    if buf.len() >= max_header_bytes {
                        return Err(header_too_large(max_header_bytes));
                    }
                }
            }
        }

        if buf.capacity() - buf.len() < 1024 {
            buf.reserve(4096);
        }
        let n = io.read_buf(buf).await.map_err(SessionError::Transport)?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(SessionError::unexpected_eof());
        }
    }
}

fn header_too_large(limit: usize) -> SessionError {
    SessionError::Protocol(format!("header section exceeds {limit} bytes"))
}

/// Read a body of `declared_length` bytes into `payload`.
///
/// Returns the number of body bytes stored.
pub async fn read_body<R>(
    io: &mut R,
    buf: &mut BytesMut,
    declared_length: Option<u64>,
    payload: &mut Payload,
    read_capacity: usize,
) -> Result<u64, SessionError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = PayloadReader::new(payload);
    reader.init(declared_length).await?;

    let total = declared_length.unwrap_or(0);
    let mut remaining = total;
    while remaining > 0 {
        if buf.is_empty() {
            buf.reserve(read_capacity);
            let n = io.read_buf(buf).await.map_err(SessionError::Transport)?;
            if n == 0 {
                return Err(SessionError::unexpected_eof());
            }
        }

        let take = remaining.min(buf.len() as u64) as usize;
        let chunk = buf.split_to(take);
        reader.put(&chunk).await?;
        remaining -= take as u64;
    }

    reader.finish().await;
    Ok(total)
}

/// Write only the head section of `response`.
pub async fn write_head<W>(io: &mut W, response: &Response) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut out = BytesMut::with_capacity(256);
    response.encode_head(&mut out);
    io.write_all(&out).await.map_err(SessionError::Transport)?;
    io.flush().await.map_err(SessionError::Transport)
}

/// Write head and body of `response` as one operation.
///
/// A file read error part-way through leaves the response truncated and is
/// returned after the data read so far has been sent.
pub async fn write_message<W>(io: &mut W, response: &Response) -> Result<u64, SessionError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut head = BytesMut::with_capacity(256);
    response.encode_head(&mut head);

    let mut writer = PayloadWriter::new(response.body());
    writer.init().await?;

    let mut pending = Some(head);
    let mut body_bytes = 0u64;
    while let Some((chunk, _more)) = writer.get().await {
        body_bytes += chunk.len() as u64;
        if let Some(mut out) = pending.take() {
            out.extend_from_slice(chunk);
            io.write_all(&out).await.map_err(SessionError::Transport)?;
        } else if !chunk.is_empty() {
            io.write_all(chunk).await.map_err(SessionError::Transport)?;
        }
    }
    if let Some(out) = pending.take() {
        io.write_all(&out).await.map_err(SessionError::Transport)?;
    }
    io.flush().await.map_err(SessionError::Transport)?;

    match writer.take_error() {
        Some(e) => Err(SessionError::Payload(e.into())),
        None => Ok(body_bytes),
    }
}

/// Frame `data` as one chunk into `dst`.
pub fn encode_chunk(data: &[u8], dst: &mut BytesMut) {
    dst.reserve(data.len() + 20);
    dst.put_slice(format!("{:x}\r\n", data.len()).as_bytes());
    dst.put_slice(data);
    dst.put_slice(b"\r\n");
}

/// Write one data chunk. Empty data writes nothing.
pub async fn write_chunk<W>(io: &mut W, data: &[u8]) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if data.is_empty() {
        return Ok(());
    }
    let mut out = BytesMut::new();
    encode_chunk(data, &mut out);
    io.write_all(&out).await.map_err(SessionError::Transport)?;
    io.flush().await.map_err(SessionError::Transport)
}

/// Write the terminating chunk.
pub async fn write_last_chunk<W>(io: &mut W) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    io.write_all(LAST_CHUNK).await.map_err(SessionError::Transport)?;
    io.flush().await.map_err(SessionError::Transport)
}
