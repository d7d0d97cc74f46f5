//! Connection acceptor
//!
//! Accepts TCP connections, asks the hub for an admission slot, and
//! spawns one handler task per admitted connection. Connections over
//! the cap are closed immediately without a single byte written.

use tokio::net::TcpListener;
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::ServerSettings;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::hub::{ChatHub, HubHandle};
use crate::types::ClientId;

/// Spawn a hub sized from `settings` and accept connections forever
pub async fn serve(listener: TcpListener, settings: ServerSettings) -> Result<(), AppError> {
    let hub = ChatHub::spawn(settings.max_clients);
    accept_loop(listener, hub, settings).await
}

/// Accept connections on `listener` using an existing hub
///
/// Only returns if the hub task is gone. Accept errors are logged and
/// the loop keeps going.
pub async fn accept_loop(
    listener: TcpListener,
    hub: HubHandle,
    settings: ServerSettings,
) -> Result<(), AppError> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let client_id = ClientId::new();

                if !hub.admit(client_id).await? {
                    info!("Rejected connection from {}: server full", addr);
                    drop(stream);
                    continue;
                }

                info!("New connection from {} as {}", addr, client_id);
                let hub = hub.clone();

                // Spawn handler task for each connection, every log line
                // it emits carries the peer address
                let span = info_span!("conn", peer = %addr, client = %client_id);
                tokio::spawn(
                    async move {
                        if let Err(e) = handle_connection(stream, client_id, hub, settings).await {
                            warn!("Connection closed with error: {}", e);
                        }
                    }
                    .instrument(span),
                );
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
