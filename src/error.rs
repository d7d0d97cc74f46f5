//! Error types for the chat server
//!
//! Defines connection-level errors and outbound delivery errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Every variant ends the connection it occurred on. None of them
/// affect other clients.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the socket or listener
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error (configured length cap exceeded)
    #[error("Line codec error: {0}")]
    Codec(#[from] tokio_util::codec::AnyDelimiterCodecError),

    /// Channel send error (fatal - hub task is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Client sent nothing within the configured idle timeout
    #[error("Idle timeout after {0}s")]
    IdleTimeout(u64),
}

/// Message send errors
///
/// Occurs when the outbound queue of a client has been closed.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
