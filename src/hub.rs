//! ChatHub Actor implementation
//!
//! The central actor that owns all shared state: admitted connections,
//! the registry of joined clients, and the chat history. Every state
//! transition is a command processed one at a time by `ChatHub::run`, so
//! admission, join, message and leave events are linearized and every
//! client observes them in the same order.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::client::{Client, Outbound};
use crate::error::AppError;
use crate::message::{format_chat_line, ServerMessage};
use crate::types::{ClientId, DisplayName};

/// Channel buffer size for hub commands
pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// Commands sent from the acceptor and handlers to the ChatHub actor
#[derive(Debug)]
pub enum HubCommand {
    /// Reserve a connection slot, replies false when at capacity
    Admit {
        client_id: ClientId,
        reply: oneshot::Sender<bool>,
    },
    /// Client finished naming: register, replay history, announce
    Join {
        client_id: ClientId,
        name: DisplayName,
        sender: Outbound,
    },
    /// Non-empty chat text from a joined client
    Chat {
        client_id: ClientId,
        text: String,
    },
    /// Connection closed: unregister and release the slot
    Disconnect {
        client_id: ClientId,
    },
    /// Snapshot of the hub counters
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
}

/// Counters reported by `HubHandle::stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    /// Admitted connections, named or not
    pub connections: usize,
    /// Clients that completed naming
    pub registered: usize,
    /// Chat lines stored in history
    pub history_len: usize,
}

/// The ChatHub actor
pub struct ChatHub {
    /// Connections holding an admission slot
    admitted: HashSet<ClientId>,
    /// Joined clients: ClientId -> Client
    clients: HashMap<ClientId, Client>,
    /// Every chat line broadcast so far, oldest first. Never trimmed.
    history: Vec<String>,
    /// Admission cap
    max_clients: usize,
    /// Source of chat timestamps
    clock: fn() -> DateTime<Utc>,
    /// Command receiver channel
    receiver: mpsc::Receiver<HubCommand>,
}

impl ChatHub {
    /// Create a new ChatHub with the given command receiver and admission cap
    pub fn new(receiver: mpsc::Receiver<HubCommand>, max_clients: usize) -> Self {
        Self {
            admitted: HashSet::new(),
            clients: HashMap::new(),
            history: Vec::new(),
            max_clients,
            clock: Utc::now,
            receiver,
        }
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Create the command channel, spawn the actor and return its handle
    pub fn spawn(max_clients: usize) -> HubHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        tokio::spawn(ChatHub::new(cmd_rx, max_clients).run());
        HubHandle::new(cmd_tx)
    }

    /// Run the ChatHub event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatHub started (max {} clients)", self.max_clients);

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatHub shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Admit { client_id, reply } => {
                let admitted = self.handle_admit(client_id);
                if reply.send(admitted).is_err() && admitted {
                    // acceptor went away before it could spawn a handler
                    self.admitted.remove(&client_id);
                }
            }
            HubCommand::Join {
                client_id,
                name,
                sender,
            } => {
                self.handle_join(client_id, name, sender);
            }
            HubCommand::Chat { client_id, text } => {
                self.handle_chat(client_id, text);
            }
            HubCommand::Disconnect { client_id } => {
                self.handle_disconnect(client_id);
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    /// Handle admission check for a freshly accepted connection
    fn handle_admit(&mut self, client_id: ClientId) -> bool {
        if self.admitted.len() >= self.max_clients {
            return false;
        }
        self.admitted.insert(client_id);
        debug!(
            "Admitted {}, connections: {}/{}",
            client_id,
            self.admitted.len(),
            self.max_clients
        );
        true
    }

    /// Handle a client that completed naming
    ///
    /// Registration, replay and the join notice happen in one step, so
    /// the joiner sees every earlier chat line exactly once.
    fn handle_join(&mut self, client_id: ClientId, name: DisplayName, sender: Outbound) {
        if !self.admitted.contains(&client_id) {
            debug!("Ignoring join from unadmitted client {}", client_id);
            return;
        }

        let client = Client::new(client_id, name.clone(), sender);

        for line in &self.history {
            if client.send(ServerMessage::Chat(line.clone())).is_err() {
                debug!("Client {} closed during history replay", client_id);
                break;
            }
        }

        self.clients.insert(client_id, client);
        info!("{} ({}) joined, registered: {}", name, client_id, self.clients.len());

        self.broadcast(ServerMessage::Joined { name });
    }

    /// Handle a chat message: record it and fan it out
    fn handle_chat(&mut self, client_id: ClientId, text: String) {
        let Some(client) = self.clients.get(&client_id) else {
            debug!("Dropping message from unregistered client {}", client_id);
            return;
        };

        let line = format_chat_line((self.clock)(), &client.name, &text);
        self.history.push(line.clone());
        self.broadcast(ServerMessage::Chat(line));
    }

    /// Handle client disconnection
    ///
    /// Safe to call for clients that never joined.
    fn handle_disconnect(&mut self, client_id: ClientId) {
        if let Some(client) = self.clients.remove(&client_id) {
            info!("{} ({}) left, registered: {}", client.name, client_id, self.clients.len());
            self.broadcast(ServerMessage::Left { name: client.name });
        }

        if self.admitted.remove(&client_id) {
            debug!(
                "Released slot of {}, connections: {}/{}",
                client_id,
                self.admitted.len(),
                self.max_clients
            );
        }
    }

    /// Send a message to every registered client
    ///
    /// A closed queue is logged and skipped, that client's handler
    /// cleans up once its read side fails.
    fn broadcast(&self, msg: ServerMessage) {
        for client in self.clients.values() {
            if let Err(e) = client.send(msg.clone()) {
                warn!("Delivery to {} ({}) failed: {}", client.name, client.id, e);
            }
        }
    }

    fn stats(&self) -> HubStats {
        HubStats {
            connections: self.admitted.len(),
            registered: self.clients.len(),
            history_len: self.history.len(),
        }
    }
}

/// Cloneable handle used to talk to the ChatHub actor
#[derive(Debug, Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Wrap an existing command sender
    pub fn new(sender: mpsc::Sender<HubCommand>) -> Self {
        Self { sender }
    }

    async fn send(&self, cmd: HubCommand) -> Result<(), AppError> {
        self.sender.send(cmd).await.map_err(|_| AppError::ChannelSend)
    }

    /// Try to reserve a connection slot
    pub async fn admit(&self, client_id: ClientId) -> Result<bool, AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Admit { client_id, reply }).await?;
        rx.await.map_err(|_| AppError::ChannelSend)
    }

    /// Register a named client
    pub async fn join(
        &self,
        client_id: ClientId,
        name: DisplayName,
        sender: Outbound,
    ) -> Result<(), AppError> {
        self.send(HubCommand::Join {
            client_id,
            name,
            sender,
        })
        .await
    }

    /// Submit a chat message
    pub async fn chat(&self, client_id: ClientId, text: String) -> Result<(), AppError> {
        self.send(HubCommand::Chat { client_id, text }).await
    }

    /// Unregister the client and release its slot
    pub async fn disconnect(&self, client_id: ClientId) -> Result<(), AppError> {
        self.send(HubCommand::Disconnect { client_id }).await
    }

    /// Current hub counters
    pub async fn stats(&self) -> Result<HubStats, AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        rx.await.map_err(|_| AppError::ChannelSend)
    }
}
