//! Content-Length framing for DAP messages
//!
//! ```text
//! Content-Length: <N>\r\n
//! \r\n
//! <N bytes of UTF-8 JSON>
//! ```
//!
//! Other headers are tolerated and ignored. Header names match
//! case-insensitively.

use crate::constants::framing::{CONTENT_LENGTH, MAX_CONTENT_LENGTH, MAX_HEADER_LINE_LENGTH};
use crate::{Error, ProtocolMessage, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Frame a message: header block followed by the JSON body
pub fn encode_message(message: &ProtocolMessage) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(message)?;
    let mut framed = format!("{}: {}\r\n\r\n", CONTENT_LENGTH, json.len()).into_bytes();
    framed.extend_from_slice(&json);
    Ok(framed)
}

/// Write one framed message and flush
pub async fn write_message<W>(writer: &mut W, message: &ProtocolMessage) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let framed = encode_message(message)?;
    writer.write_all(&framed).await?;
    writer.flush().await?;
    trace!(seq = message.seq(), bytes = framed.len(), "Sent message");
    Ok(())
}

/// Read one framed message.
///
/// Returns `Ok(None)` on a clean end of stream before any header byte.
/// A stream that ends inside a header block or body is a protocol error.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<ProtocolMessage>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut content_length: Option<usize> = None;
    let mut started = false;
    let mut raw = Vec::new();

    loop {
        raw.clear();
        let bytes_read = (&mut *reader)
            .take(MAX_HEADER_LINE_LENGTH as u64)
            .read_until(b'\n', &mut raw)
            .await?;

        if bytes_read == MAX_HEADER_LINE_LENGTH && raw.last() != Some(&b'\n') {
            return Err(Error::Protocol(format!(
                "Header line exceeds {} bytes",
                MAX_HEADER_LINE_LENGTH
            )));
        }

        if bytes_read == 0 {
            if started {
                return Err(Error::Protocol(
                    "Stream ended inside a header block".to_string(),
                ));
            }
            return Ok(None);
        }
        started = true;

        let line = String::from_utf8(std::mem::take(&mut raw))?;
        let line = line.trim_end_matches(['\r', '\n']);

        if line.is_empty() {
            break;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::Protocol(format!("Malformed header line: {:?}", line)))?;

        if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            let value = value.trim();
            let length: usize = value
                .parse()
                .map_err(|_| Error::Protocol(format!("Invalid Content-Length: {}", value)))?;
            content_length = Some(length);
        }
    }

    let length =
        content_length.ok_or_else(|| Error::Protocol("Missing Content-Length header".to_string()))?;

    if length > MAX_CONTENT_LENGTH {
        return Err(Error::Protocol(format!(
            "Content-Length {} exceeds limit of {} bytes",
            length, MAX_CONTENT_LENGTH
        )));
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Protocol(format!("Stream ended inside a {}-byte body", length))
        } else {
            Error::from(e)
        }
    })?;

    trace!(bytes = length, "Received message");

    let message: ProtocolMessage = serde_json::from_slice(&body)?;
    Ok(Some(message))
}
