// Session lifecycle for the external language server: spawn, framed send,
// raw receive, idempotent stop.
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::error::{RecvError, SendError, SpawnError};
use crate::framing::write_message_to;
use crate::transport::Transport;

/// Lifecycle state of the managed server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    Stopped,
}

/// One language-server session: the child process plus the parent's ends of
/// its stdio pipes.
///
/// Each session manages at most one child at a time; independent sessions may
/// coexist. Methods take `&mut self`, so sends never interleave and reads
/// never race. A caller that wants a dedicated reader loop owns the session
/// inside its own task.
pub struct ServerSession {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    state: SessionState,
}

impl ServerSession {
    pub fn new() -> Self {
        ServerSession {
            child: None,
            stdin: None,
            stdout: None,
            state: SessionState::NotStarted,
        }
    }

    /// Spawn `server_path` with no arguments, wiring its stdin/stdout to this
    /// session. The child's stderr passes through to the parent's.
    ///
    /// A successful return means the process was created; the server may
    /// still exit immediately (crash on startup, for instance), which
    /// surfaces later as a closed channel on [`send`](Self::send) or
    /// [`recv`](Self::recv) rather than here.
    pub fn start(&mut self, server_path: &str) -> Result<(), SpawnError> {
        if self.state == SessionState::Running {
            return Err(SpawnError::AlreadyRunning);
        }

        let mut child = Command::new(server_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            // don't leak the server if the session is dropped without stop()
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError::Spawn {
                path: server_path.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(SpawnError::Pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(SpawnError::Pipe("stdout"))?;

        debug!(path = server_path, pid = ?child.id(), "language server spawned");

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout = Some(stdout);
        self.state = SessionState::Running;
        Ok(())
    }

    /// Frame `payload` with a `Content-Length` header and write the whole
    /// envelope to the server's stdin.
    ///
    /// Fails with [`SendError::Closed`] before writing anything when the
    /// outgoing channel is gone. A failure mid-write leaves the stream in an
    /// unknown framing state; tear the session down with
    /// [`stop`](Self::stop) instead of retrying.
    pub async fn send(&mut self, payload: &[u8]) -> Result<(), SendError> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SendError::Closed);
        };
        write_message_to(stdin, payload).await?;
        Ok(())
    }

    /// Single read attempt from the server's stdout into `buf`.
    ///
    /// Returns the number of bytes read, possibly fewer than `buf.len()`,
    /// with no framing applied; accumulate into a
    /// [`FrameDecoder`](crate::FrameDecoder) to recover whole messages.
    /// End-of-stream is [`RecvError::Closed`], distinct from transient I/O
    /// errors. An empty `buf` returns `Ok(0)` without reading.
    pub async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, RecvError> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Err(RecvError::Closed);
        };
        if buf.is_empty() {
            return Ok(0);
        }
        let n = stdout.read(buf).await?;
        if n == 0 {
            return Err(RecvError::Closed);
        }
        Ok(n)
    }

    /// Idempotent teardown: close both pipe ends and reap the child.
    ///
    /// Dropping stdin delivers EOF to the server, which well-behaved servers
    /// treat as a shutdown request; the call then waits for the child to
    /// exit. Returns the exit status when a child was reaped, `None` when
    /// nothing was running. Never fails: calling `stop` repeatedly, or
    /// without a prior [`start`](Self::start), is a no-op, and `start` may be
    /// called again afterwards for a fresh session.
    pub async fn stop(&mut self) -> Option<ExitStatus> {
        // each end is closed at most once; drop of the taken handle does it
        self.stdin.take();
        self.stdout.take();

        let mut child = self.child.take()?;
        self.state = SessionState::Stopped;
        match child.wait().await {
            Ok(status) => {
                debug!(?status, "language server exited");
                Some(status)
            }
            Err(error) => {
                warn!(%error, "failed to reap language server");
                None
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// OS pid of the server, if one is running.
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }
}

impl Default for ServerSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for ServerSession {
    async fn send(&mut self, payload: &[u8]) -> Result<(), SendError> {
        ServerSession::send(self, payload).await
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, RecvError> {
        ServerSession::recv(self, buf).await
    }
}
