use anyhow::anyhow;
use tokio::time::{timeout, Duration};
use tracing::info;

use crate::cli::Config;
use lsp_stdio::{FrameDecoder, ServerSession};

pub async fn run(config: Config) -> anyhow::Result<()> {
    let mut session = ServerSession::new();
    session.start(&config.server)?;
    info!(server = %config.server, pid = ?session.id(), "session started");

    session.send(config.payload.as_bytes()).await?;

    let response = read_first_frame(&mut session, Duration::from_secs(config.timeout_secs)).await;

    session.stop().await;

    let payload = response?;
    println!("{}", String::from_utf8_lossy(&payload));
    Ok(())
}

async fn read_first_frame(
    session: &mut ServerSession,
    deadline: Duration,
) -> anyhow::Result<Vec<u8>> {
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; 4096];

    loop {
        if let Some(frame) = decoder.next_frame()? {
            return Ok(frame.to_vec());
        }
        let n = timeout(deadline, session.recv(&mut buf))
            .await
            .map_err(|_| anyhow!("no response within {}s", deadline.as_secs()))??;
        decoder.extend(&buf[..n]);
    }
}
