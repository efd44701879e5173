//! Connection registry
//!
//! Tracks every live transport connection and the identity bound to it.
//! Thread-safe via `RwLock`; lookups and event delivery only take the read
//! lock, so unrelated connections never contend on writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::RwLock;

use super::identity::{Identity, Role};
use super::outbound::{ConnectionHandle, OutboundEvent};

/// Unique identifier for a transport connection
///
/// Allocated at connect time and never reused after the connection is
/// unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered transport connection
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Authenticated user ID
    pub user_id: String,
    /// Role this connection holds
    pub role: Role,
    /// When the connection registered
    pub connected_at: Instant,
    /// Outbound event channel to the client
    handle: ConnectionHandle,
}

impl Connection {
    /// Push an event to this connection's client
    pub(crate) fn push(&self, event: OutboundEvent) -> bool {
        self.handle.send(event)
    }
}

/// Registry of all live connections
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a connection for a resolved identity
    ///
    /// Returns the freshly allocated connection ID.
    pub async fn register(&self, identity: Identity, handle: ConnectionHandle) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let connection = Connection {
            id,
            user_id: identity.user_id,
            role: identity.role,
            connected_at: Instant::now(),
            handle,
        };

        let mut connections = self.connections.write().await;

        tracing::info!(
            connection = %id,
            user = %connection.user_id,
            role = %connection.role,
            "Connection registered"
        );

        connections.insert(id, connection);
        id
    }

    /// Look up a connection by ID
    pub async fn lookup(&self, id: ConnectionId) -> Option<Connection> {
        self.connections.read().await.get(&id).cloned()
    }

    /// Remove a connection from the registry
    ///
    /// Session membership must already be cleaned up by the lifecycle path;
    /// the coordinator's `disconnect` is the only caller that may drop an
    /// entry that belonged to a live session.
    pub async fn unregister(&self, id: ConnectionId) -> Option<Connection> {
        let removed = self.connections.write().await.remove(&id);

        if let Some(ref connection) = removed {
            tracing::info!(
                connection = %id,
                user = %connection.user_id,
                role = %connection.role,
                "Connection unregistered"
            );
        }

        removed
    }

    /// Push an event to a connection's client
    ///
    /// Returns false if the connection is gone or its transport receiver
    /// was dropped.
    pub async fn push(&self, id: ConnectionId, event: OutboundEvent) -> bool {
        match self.connections.read().await.get(&id) {
            Some(connection) => connection.push(event),
            None => false,
        }
    }

    /// Number of live connections
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
