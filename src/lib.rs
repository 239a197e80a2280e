//! Client-side stdio transport for language servers.
//!
//! [`ServerSession`] spawns a language server as a child process with its
//! standard input/output wired to the parent through pipes, frames outgoing
//! messages with the `Content-Length` envelope, and exposes a raw receive
//! primitive. Incoming bytes carry no framing; feed them through a
//! [`FrameDecoder`] to recover discrete messages.

pub mod error;
pub mod framing;
pub mod session;
pub mod transport;

pub use error::{DecodeError, RecvError, SendError, SpawnError};
pub use framing::{encode_message, write_message_to, FrameDecoder};
pub use session::{ServerSession, SessionState};
pub use transport::Transport;
