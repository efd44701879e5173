//! Session error types

use crate::connection::ConnectionId;

use super::key::SessionKey;

/// Error type for session store and lifecycle operations
#[derive(Debug, Clone)]
pub enum SessionError {
    /// No session exists for the key
    NotFound(SessionKey),
    /// The session already has a live broadcaster; the newcomer is rejected
    DuplicateBroadcaster(SessionKey),
    /// The session reached its terminal state and accepts no further events
    Ended(SessionKey),
    /// A viewer was removed that was never admitted (missed add or double remove)
    PhantomViewer {
        /// Session the removal targeted
        session: SessionKey,
        /// The connection that was not a member
        connection: ConnectionId,
    },
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::NotFound(key) => write!(f, "session not found: {}", key),
            SessionError::DuplicateBroadcaster(key) => {
                write!(f, "session already has a broadcaster: {}", key)
            }
            SessionError::Ended(key) => write!(f, "session has ended: {}", key),
            SessionError::PhantomViewer {
                session,
                connection,
            } => write!(
                f,
                "connection {} is not a viewer of session {}",
                connection, session
            ),
        }
    }
}

impl std::error::Error for SessionError {}
