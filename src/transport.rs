//! Transport abstraction over the raw send/receive pair.
use async_trait::async_trait;

use crate::error::{RecvError, SendError};

/// Minimal async trait for a byte transport to a language server.
/// - `send` frames `payload` with a `Content-Length` header and writes the
///   whole envelope.
/// - `recv` performs a single read into `buf` and returns the byte count;
///   reconstructing discrete messages from the stream is the caller's job
///   (see [`FrameDecoder`](crate::FrameDecoder)).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&mut self, payload: &[u8]) -> Result<(), SendError>;
    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, RecvError>;
}
