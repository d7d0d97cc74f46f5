//! Basic type definitions for the chat server
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based unique connection identifier
//! - `DisplayName`: trimmed, non-empty name chosen by a client

use uuid::Uuid;

/// Unique connection identifier (newtype pattern)
///
/// Assigned at accept time, before the client has a name.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name negotiated by a client
///
/// Always trimmed and never empty. Immutable once set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    /// Parse a raw name line, returns None if it is blank after trimming
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.trim();
        if name.is_empty() {
            None
        } else {
            Some(Self(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_unique() {
        let id1 = ClientId::new();
        let id2 = ClientId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_display_name_trimmed() {
        let name = DisplayName::parse("  Alice \t").unwrap();
        assert_eq!(name.as_str(), "Alice");
        assert_eq!(name.to_string(), "Alice");
    }

    #[test]
    fn test_display_name_blank_rejected() {
        assert!(DisplayName::parse("").is_none());
        assert!(DisplayName::parse("   ").is_none());
        assert!(DisplayName::parse("\r").is_none());
    }

    #[test]
    fn test_display_name_keeps_inner_spaces() {
        let name = DisplayName::parse(" Mary Ann ").unwrap();
        assert_eq!(name.as_str(), "Mary Ann");
    }
}
