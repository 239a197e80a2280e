// Content-Length framing: envelope encoding for sends, incremental decoding
// for the raw receive stream.
use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::DecodeError;

/// Separator between the header block and the payload.
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Upper bound on the header block; a stream that runs this long without a
/// terminator has lost framing.
const MAX_HEADER_LEN: usize = 4 * 1024;

/// Default maximum accepted payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Encode `payload` into a complete wire message (header then payload).
///
/// The header length field is computed from `payload` at call time.
pub fn encode_message(payload: &[u8]) -> Vec<u8> {
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    let mut message = Vec::with_capacity(header.len() + payload.len());
    message.extend_from_slice(header.as_bytes());
    message.extend_from_slice(payload);
    message
}

/// Write a single framed message to an async writer.
///
/// Header and payload are written in full, then flushed. An error may leave a
/// partial message on the stream; the caller should treat the channel as dead.
pub async fn write_message_to<W>(writer: &mut W, payload: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Incremental decoder for a `Content-Length` framed byte stream.
///
/// The raw receive primitive returns unframed bytes; push them in with
/// [`extend`](Self::extend) and drain complete payloads with
/// [`next_frame`](Self::next_frame). Decode errors are terminal: framing
/// cannot be recovered once the stream is malformed.
pub struct FrameDecoder {
    buf: BytesMut,
    max_payload: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }

    /// Decoder with a custom payload size cap.
    pub fn with_max_payload(max_payload: usize) -> Self {
        FrameDecoder {
            buf: BytesMut::new(),
            max_payload,
        }
    }

    /// Append raw bytes received from the channel.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes buffered but not yet consumed by a decoded frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Try to decode one complete message payload.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Call repeatedly to
    /// drain several buffered frames.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, DecodeError> {
        let Some(header_end) = find_terminator(&self.buf) else {
            if self.buf.len() > MAX_HEADER_LEN {
                return Err(DecodeError::HeaderTooLong(MAX_HEADER_LEN));
            }
            return Ok(None);
        };

        let header =
            std::str::from_utf8(&self.buf[..header_end]).map_err(|_| DecodeError::MalformedHeader)?;
        let content_length = content_length_from(header)?;
        if content_length > self.max_payload {
            return Err(DecodeError::PayloadTooLarge {
                size: content_length,
                max: self.max_payload,
            });
        }

        let total = header_end + HEADER_TERMINATOR.len() + content_length;
        if self.buf.len() < total {
            return Ok(None);
        }

        self.buf.advance(header_end + HEADER_TERMINATOR.len());
        Ok(Some(self.buf.split_to(content_length).freeze()))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

/// Extract the Content-Length value from a header block. Case-insensitive;
/// other header lines (e.g. Content-Type) are skipped.
fn content_length_from(header: &str) -> Result<usize, DecodeError> {
    for line in header.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            let value = line.split(':').nth(1).unwrap_or("").trim();
            return value
                .parse::<usize>()
                .map_err(|_| DecodeError::InvalidContentLength(value.to_string()));
        }
    }
    Err(DecodeError::MissingContentLength)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    #[test]
    fn test_encode_message_exact_bytes() {
        let message = encode_message(b"ping");
        assert_eq!(message, b"Content-Length: 4\r\n\r\nping");
    }

    #[test]
    fn test_encode_empty_payload() {
        let message = encode_message(b"");
        assert_eq!(message, b"Content-Length: 0\r\n\r\n");
    }

    #[tokio::test]
    async fn test_write_message_to_duplex() {
        let (mut a, mut b) = duplex(1024);

        let json = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
        write_message_to(&mut a, json.as_bytes())
            .await
            .expect("write failed");
        drop(a);

        let mut received = Vec::new();
        b.read_to_end(&mut received).await.expect("read failed");
        assert_eq!(received, encode_message(json.as_bytes()));
    }

    #[tokio::test]
    async fn test_two_writes_are_two_envelopes_in_order() {
        let (mut a, mut b) = duplex(1024);

        write_message_to(&mut a, b"first").await.expect("write failed");
        write_message_to(&mut a, b"second!").await.expect("write failed");
        drop(a);

        let mut received = Vec::new();
        b.read_to_end(&mut received).await.expect("read failed");

        let mut expected = encode_message(b"first");
        expected.extend_from_slice(&encode_message(b"second!"));
        assert_eq!(received, expected);
    }

    #[test]
    fn test_decode_whole_message() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&encode_message(b"hello"));

        let frame = decoder.next_frame().expect("decode failed");
        assert_eq!(frame.as_deref(), Some(&b"hello"[..]));
        assert!(decoder.next_frame().expect("decode failed").is_none());
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_decode_byte_at_a_time() {
        let message = encode_message(b"chunked");
        let mut decoder = FrameDecoder::new();

        for &byte in &message[..message.len() - 1] {
            decoder.extend(&[byte]);
            assert!(decoder.next_frame().expect("decode failed").is_none());
        }

        decoder.extend(&message[message.len() - 1..]);
        let frame = decoder.next_frame().expect("decode failed");
        assert_eq!(frame.as_deref(), Some(&b"chunked"[..]));
    }

    #[test]
    fn test_decode_two_frames_in_one_buffer() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&encode_message(b"first"));
        decoder.extend(&encode_message(b"second!"));

        let first = decoder.next_frame().expect("decode failed");
        assert_eq!(first.as_deref(), Some(&b"first"[..]));
        let second = decoder.next_frame().expect("decode failed");
        assert_eq!(second.as_deref(), Some(&b"second!"[..]));
        assert!(decoder.next_frame().expect("decode failed").is_none());
    }

    #[test]
    fn test_decode_empty_payload_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(b"Content-Length: 0\r\n\r\n");

        let frame = decoder.next_frame().expect("decode failed");
        assert_eq!(frame.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn test_decode_header_case_insensitive() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(b"content-length: 2\r\n\r\nok");

        let frame = decoder.next_frame().expect("decode failed");
        assert_eq!(frame.as_deref(), Some(&b"ok"[..]));
    }

    #[test]
    fn test_decode_skips_other_header_lines() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(b"Content-Type: application/vscode-jsonrpc\r\nContent-Length: 4\r\n\r\nping");

        let frame = decoder.next_frame().expect("decode failed");
        assert_eq!(frame.as_deref(), Some(&b"ping"[..]));
    }

    #[test]
    fn test_decode_missing_content_length() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(b"Content-Type: application/vscode-jsonrpc\r\n\r\n");

        let result = decoder.next_frame();
        assert!(matches!(result, Err(DecodeError::MissingContentLength)));
    }

    #[test]
    fn test_decode_invalid_content_length() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(b"Content-Length: abc\r\n\r\n");

        let result = decoder.next_frame();
        assert!(matches!(result, Err(DecodeError::InvalidContentLength(_))));
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut decoder = FrameDecoder::with_max_payload(8);
        decoder.extend(b"Content-Length: 9\r\n\r\n123456789");

        let result = decoder.next_frame();
        assert!(matches!(result, Err(DecodeError::PayloadTooLarge { size: 9, max: 8 })));
    }

    #[test]
    fn test_decode_unterminated_header_overflow() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&vec![b'x'; MAX_HEADER_LEN + 1]);

        let result = decoder.next_frame();
        assert!(matches!(result, Err(DecodeError::HeaderTooLong(_))));
    }
}
