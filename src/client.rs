//! Client struct definition
//!
//! Represents a joined client: its id, display name, and the outbound
//! queue drained by the connection's writer task.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::{ClientId, DisplayName};

/// Outbound queue to a single connection
///
/// Unbounded so the hub never waits on a slow peer, and history replay
/// of any length fits.
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// Registered client information
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this connection
    pub id: ClientId,
    /// Negotiated display name
    pub name: DisplayName,
    /// Server → Client message channel
    pub sender: Outbound,
}

impl Client {
    /// Create a new client with the given ID, name and sender channel
    pub fn new(id: ClientId, name: DisplayName, sender: Outbound) -> Self {
        Self { id, name, sender }
    }

    /// Queue a message for this client
    ///
    /// Returns an error if the channel is closed (writer task ended).
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.send(msg).map_err(|_| SendError::ChannelClosed)
    }
}
