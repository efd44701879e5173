//! Routing error types

use crate::connection::ConnectionId;
use crate::session::SessionKey;

/// Error type for signaling and role-checked operations
#[derive(Debug, Clone)]
pub enum RouteError {
    /// The target connection is no longer registered or left the session
    ///
    /// Negotiation messages are not durable; the sender is told and nothing
    /// is retried.
    TargetGone(ConnectionId),
    /// The sender does not hold the role the action requires
    UnauthorizedRole {
        /// Offending connection
        connection: ConnectionId,
        /// What it tried to do
        action: &'static str,
    },
    /// No live session for the key
    SessionNotFound(SessionKey),
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteError::TargetGone(id) => write!(f, "target connection {} is gone", id),
            RouteError::UnauthorizedRole { connection, action } => {
                write!(f, "connection {} not authorized to {}", connection, action)
            }
            RouteError::SessionNotFound(key) => write!(f, "no live session: {}", key),
        }
    }
}

impl std::error::Error for RouteError {}
