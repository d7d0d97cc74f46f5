//! Line-based TCP Chat Server Library
//!
//! A multi-client chat broadcaster: clients connect, pick a display name,
//! and every line they send is fanned out to everyone connected, prefixed
//! with a UTC timestamp and the sender's name.
//!
//! # Features
//! - Admission cap on simultaneous connections (10 by default)
//! - Name negotiation with blank-name rejection
//! - Full history replay for late joiners
//! - Join/leave notices
//! - Optional idle timeout
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatHub` is the central actor owning the registry, history and
//!   admission counter
//! - Each connection has a `handler` task talking to the hub through a
//!   `HubHandle`
//! - No locks needed - every state transition is a command processed in order
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tcp_chat::{serve, ServerSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("0.0.0.0:8989").await.unwrap();
//!     serve(listener, ServerSettings::default()).await.unwrap();
//! }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod hub;
pub mod listener;
pub mod message;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use config::{Config, ServerSettings};
pub use error::{AppError, SendError};
pub use handler::handle_connection;
pub use hub::{ChatHub, HubCommand, HubHandle, HubStats};
pub use listener::{accept_loop, serve};
pub use message::ServerMessage;
pub use types::{ClientId, DisplayName};
