//! Command-line configuration
//!
//! Parsed with clap. A non-numeric or zero port is a usage error and clap exits
//! before the server starts.

use std::time::Duration;

use clap::Parser;

/// Default listen port
pub const DEFAULT_PORT: u16 = 8989;

/// Default admission cap
pub const DEFAULT_MAX_CLIENTS: usize = 10;

/// Line-based TCP chat server
#[derive(Debug, Clone, Parser)]
#[command(name = "tcp_chat", version, about)]
pub struct Config {
    /// Port to listen on
    #[arg(
        value_name = "PORT",
        default_value_t = DEFAULT_PORT,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Maximum number of simultaneous connections
    #[arg(long, default_value_t = DEFAULT_MAX_CLIENTS)]
    pub max_clients: usize,

    /// Disconnect clients that send nothing for this many seconds
    #[arg(long, value_name = "SECS")]
    pub idle_timeout: Option<u64>,

    /// Disconnect clients that send a line longer than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_line_length: Option<usize>,
}

impl Config {
    /// `host:port` string to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Runtime knobs handed to the acceptor and handlers
    pub fn settings(&self) -> ServerSettings {
        ServerSettings {
            max_clients: self.max_clients,
            idle_timeout: self.idle_timeout.map(Duration::from_secs),
            max_line_length: self.max_line_length,
        }
    }
}

/// Per-connection settings shared by every handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    pub max_clients: usize,
    /// None waits forever
    pub idle_timeout: Option<Duration>,
    /// None accepts lines of any length
    pub max_line_length: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_clients: DEFAULT_MAX_CLIENTS,
            idle_timeout: None,
            max_line_length: None,
        }
    }
}
