//! Per-connection handler: introduction, outbox writer, and the read loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `Hello` → claim the username with the orchestrator
//!   2. Spawn the outbox writer (orchestrator events → socket)
//!   3. Loop: receive events → forward to the orchestrator
//!   4. On close (or panic), a drop guard reports the disconnect

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use keysprint_protocol::{ClientEvent, Codec, PlayerName, ProtocolError, ServerEvent};
use keysprint_transport::{Connection, WebSocketConnection};

use crate::KeysprintError;
use crate::orchestrator::Command;

/// How long a fresh connection gets to introduce itself.
const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

/// Drop guard that reports the player's disconnect when the handler exits.
///
/// The command channel is unbounded, so the send is synchronous and safe
/// to do in `Drop` — cleanup happens even if the handler panics.
struct DisconnectGuard {
    username: PlayerName,
    commands: mpsc::UnboundedSender<Command>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Disconnect {
            username: self.username.clone(),
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    commands: mpsc::UnboundedSender<Command>,
    codec: C,
) -> Result<(), KeysprintError>
where
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Hello ---
    let username = await_hello(&conn, &codec).await?;

    // --- Step 2: outbox writer ---
    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let writer = {
        let conn = Arc::clone(&conn);
        let codec = codec.clone();
        tokio::spawn(async move {
            while let Some(event) = outbox_rx.recv().await {
                let bytes = match codec.encode(&event) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(error = %e, "outbound event failed to encode");
                        continue;
                    }
                };
                // JSON output is always valid UTF-8.
                let text = String::from_utf8_lossy(&bytes);
                if conn.send_text(&text).await.is_err() {
                    break;
                }
            }
        })
    };

    // --- Step 3: claim the username ---
    let (reply_tx, reply_rx) = oneshot::channel();
    let hello = Command::Hello {
        conn: conn_id,
        username: username.clone(),
        outbox: outbox_tx,
        reply: reply_tx,
    };
    if commands.send(hello).is_err() {
        // Orchestrator gone; nothing to clean up.
        return Ok(());
    }
    let Ok(reply) = reply_rx.await else {
        return Ok(());
    };
    if let Err(e) = reply {
        // The rejection was queued on the outbox and the sender dropped,
        // so the writer drains it and exits; flush, then close.
        let _ = writer.await;
        let _ = conn.close().await;
        return Err(e.into());
    }
    tracing::info!(%conn_id, player = %username, "player connected");

    let guard = DisconnectGuard {
        username: username.clone(),
        commands: commands.clone(),
    };

    // --- Step 4: read loop ---
    loop {
        match conn.recv_text().await {
            Ok(Some(text)) => match codec.decode::<ClientEvent>(text.as_bytes()) {
                Ok(event) => {
                    let cmd = Command::Event {
                        username: username.clone(),
                        event,
                    };
                    if commands.send(cmd).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(player = %username, error = %e, "undecodable event dropped");
                }
            },
            Ok(None) => {
                tracing::info!(player = %username, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(player = %username, error = %e, "recv error");
                break;
            }
        }
    }

    // Report the disconnect first: the orchestrator unregisters the
    // outbox, which closes the channel and lets the writer exit.
    drop(guard);
    let _ = writer.await;
    Ok(())
}

/// Waits for the introduction: the first event must be `Hello` and must
/// arrive within [`HELLO_TIMEOUT`].
async fn await_hello<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
) -> Result<PlayerName, KeysprintError> {
    let text = match tokio::time::timeout(HELLO_TIMEOUT, conn.recv_text()).await {
        Ok(Ok(Some(text))) => text,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidEvent("connection closed before Hello".into()).into());
        }
        Ok(Err(e)) => return Err(KeysprintError::Transport(e)),
        Err(_) => {
            return Err(ProtocolError::InvalidEvent("Hello timed out".into()).into());
        }
    };

    match codec.decode::<ClientEvent>(text.as_bytes())? {
        ClientEvent::Hello { username } => Ok(username),
        other => {
            tracing::debug!(?other, "first event was not Hello");
            Err(ProtocolError::InvalidEvent("first event must be Hello".into()).into())
        }
    }
}
