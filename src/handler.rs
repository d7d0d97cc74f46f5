//! Per-connection handler
//!
//! Drives one client through `Naming → Active → Closed`: sends the
//! welcome prompt, negotiates the display name, forwards chat lines to
//! the hub, and always releases the hub slot on the way out.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tracing::{debug, info};

use crate::client::Outbound;
use crate::codec::ChatLineCodec;
use crate::config::ServerSettings;
use crate::error::AppError;
use crate::hub::HubHandle;
use crate::message::{chat_text, ServerMessage};
use crate::types::{ClientId, DisplayName};

type Lines<R> = FramedRead<tokio::io::ReadHalf<R>, ChatLineCodec>;

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    /// Peer went away before sending a name
    BeforeNaming,
    /// Blank name, the notice still has to be flushed
    InvalidName,
    /// Joined client disconnected or its writer failed
    Left,
}

/// Handle an admitted connection
///
/// `client_id` must be the id the connection was admitted under; its
/// slot is released on every exit path.
pub async fn handle_connection<S>(
    stream: S,
    client_id: ClientId,
    hub: HubHandle,
    settings: ServerSettings,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut lines = FramedRead::new(reader, ChatLineCodec::new(settings.max_line_length));

    // Server -> client queue, drained by the writer task
    let (msg_tx, msg_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut write_task = tokio::spawn(write_loop(writer, msg_rx, client_id));

    let outcome = run_session(
        &mut lines,
        client_id,
        &hub,
        msg_tx,
        settings.idle_timeout,
        &mut write_task,
    )
    .await;

    if hub.disconnect(client_id).await.is_err() {
        debug!("Hub closed before {} could be released", client_id);
    }

    match outcome {
        Ok(Closed::InvalidName) | Ok(Closed::BeforeNaming) => {
            // only the welcome and the notice are queued, let them drain
            let _ = write_task.await;
        }
        _ => write_task.abort(),
    }

    info!("Client {} disconnected", client_id);
    outcome.map(|_| ())
}

async fn run_session<R>(
    lines: &mut Lines<R>,
    client_id: ClientId,
    hub: &HubHandle,
    outbound: Outbound,
    idle_timeout: Option<Duration>,
    write_task: &mut JoinHandle<()>,
) -> Result<Closed, AppError>
where
    R: AsyncRead,
{
    let _ = outbound.send(ServerMessage::Welcome);

    // Naming
    let Some(raw) = next_line(lines, idle_timeout).await? else {
        debug!("Client {} left before naming", client_id);
        return Ok(Closed::BeforeNaming);
    };
    let Some(name) = DisplayName::parse(&raw) else {
        debug!("Client {} sent an empty name", client_id);
        let _ = outbound.send(ServerMessage::InvalidName);
        return Ok(Closed::InvalidName);
    };

    hub.join(client_id, name, outbound).await?;

    // Active
    loop {
        tokio::select! {
            line = next_line(lines, idle_timeout) => {
                let Some(raw) = line? else {
                    return Ok(Closed::Left);
                };
                if let Some(text) = chat_text(&raw) {
                    hub.chat(client_id, text.to_string()).await?;
                }
            }
            _ = &mut *write_task => {
                debug!("Writer for {} ended, closing session", client_id);
                return Ok(Closed::Left);
            }
        }
    }
}

/// Read the next line, None on EOF
async fn next_line<R>(
    lines: &mut Lines<R>,
    idle_timeout: Option<Duration>,
) -> Result<Option<String>, AppError>
where
    R: AsyncRead,
{
    let next = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, lines.next())
            .await
            .map_err(|_| AppError::IdleTimeout(limit.as_secs()))?,
        None => lines.next().await,
    };
    Ok(next.transpose()?)
}

/// Drain the outbound queue into the socket
async fn write_loop<W>(
    mut writer: W,
    mut receiver: mpsc::UnboundedReceiver<ServerMessage>,
    client_id: ClientId,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = receiver.recv().await {
        if let Err(e) = writer.write_all(msg.encode().as_bytes()).await {
            debug!("Write to {} failed: {}", client_id, e);
            break;
        }
    }
    let _ = writer.shutdown().await;
    debug!("Write task ended for {}", client_id);
}
