//! Crate-level error type
//!
//! Aggregates the per-module errors. Nothing here is fatal to the process:
//! a malformed or out-of-order event degrades one session, never the
//! coordinator.

use crate::chunk::ChunkError;
use crate::connection::ConnectionId;
use crate::session::SessionError;
use crate::signaling::RouteError;

/// Error type returned by coordinator operations
#[derive(Debug, Clone)]
pub enum Error {
    /// Session store or lifecycle error
    Session(SessionError),
    /// Signaling relay error
    Route(RouteError),
    /// Chunk sequencing error
    Chunk(ChunkError),
    /// Event arrived from a connection that is not registered
    ConnectionNotFound(ConnectionId),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Session(e) => write!(f, "session error: {}", e),
            Error::Route(e) => write!(f, "routing error: {}", e),
            Error::Chunk(e) => write!(f, "chunk error: {}", e),
            Error::ConnectionNotFound(id) => write!(f, "unknown connection: {}", id),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Session(e) => Some(e),
            Error::Route(e) => Some(e),
            Error::Chunk(e) => Some(e),
            Error::ConnectionNotFound(_) => None,
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Error::Session(e)
    }
}

impl From<RouteError> for Error {
    fn from(e: RouteError) -> Self {
        Error::Route(e)
    }
}

impl From<ChunkError> for Error {
    fn from(e: ChunkError) -> Self {
        Error::Chunk(e)
    }
}

/// Result alias for coordinator operations
pub type Result<T> = std::result::Result<T, Error>;
