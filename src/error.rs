use std::io;

/// Errors from spawning the server process.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// A server is already running in this session; stop it first.
    #[error("a server is already running")]
    AlreadyRunning,

    /// Pipe allocation or process creation failed. Recoverable: nothing was
    /// spawned and the session is unchanged.
    #[error("failed to spawn {path}: {source}")]
    Spawn { path: String, source: io::Error },

    /// The child was created without the requested pipe.
    #[error("failed to take child {0}")]
    Pipe(&'static str),
}

/// Errors from a framed send.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The outgoing channel is closed; nothing was written.
    #[error("outgoing channel closed")]
    Closed,

    /// A header or payload write failed partway. The stream framing state is
    /// unknown and the session should be torn down.
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

/// Errors from the raw receive primitive.
///
/// End-of-stream and transient I/O failure are distinct variants so callers
/// never have to guess which one a failed read was.
#[derive(Debug, thiserror::Error)]
pub enum RecvError {
    /// The incoming channel reached end-of-stream or was never open.
    #[error("incoming channel closed")]
    Closed,

    /// The read itself failed.
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

/// Errors from decoding the incoming byte stream into frames.
///
/// All variants are terminal for the stream: once framing is lost it cannot
/// be resynchronized, so the session should be stopped.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The header block ended without a `Content-Length` line.
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// The `Content-Length` value is not a decimal byte count.
    #[error("invalid Content-Length value: {0:?}")]
    InvalidContentLength(String),

    /// The header block is not valid UTF-8.
    #[error("malformed header")]
    MalformedHeader,

    /// No header terminator within the allowed header size.
    #[error("header exceeds {0} bytes without terminator")]
    HeaderTooLong(usize),

    /// The declared payload exceeds the configured maximum.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}
