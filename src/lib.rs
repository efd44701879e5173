//! classcast: livestream signaling and session-coordination library
//!
//! One broadcaster (a teacher) and many viewers (students) discover each
//! other, exchange connection-negotiation messages, and tear down cleanly
//! when either side leaves. Recorded media chunks are ingested in strict
//! order for a storage collaborator along the way.
//!
//! The crate is transport-agnostic: a gateway (WebSocket, TCP, whatever)
//! authenticates each connection, feeds its events to the [`Coordinator`],
//! and drains the per-connection [`OutboundEvent`] channel back onto the
//! wire. Negotiation payloads and media chunks are opaque [`bytes::Bytes`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use classcast::{
//!     ConnectionHandle, Coordinator, CoordinatorConfig, Identity, MemorySink, Role, SessionKey,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = Coordinator::new(
//!         CoordinatorConfig::default(),
//!         Arc::new(MemorySink::new()),
//!     );
//!
//!     // The gateway resolves identity, then registers the connection.
//!     let (handle, mut events) = ConnectionHandle::channel();
//!     let teacher = coordinator
//!         .connect(Identity::new("teacher-1", Role::Broadcaster), handle)
//!         .await;
//!
//!     let key = SessionKey::new("teacher-1", "algebra-101");
//!     coordinator.broadcaster_register(teacher, &key).await?;
//!
//!     // Drive the connection: push inbound events in, drain `events` out.
//!     while let Some(event) = events.recv().await {
//!         println!("to teacher: {:?}", event);
//!     }
//!     Ok(())
//! }
//! ```

pub mod chunk;
pub mod config;
pub mod connection;
pub mod coordinator;
pub mod error;
pub mod session;
pub mod signaling;

// Re-export main types for convenience
pub use chunk::{ChunkError, ChunkSequencer, MemorySink, StorageSink};
pub use config::CoordinatorConfig;
pub use connection::{
    AuthError, ConnectionHandle, ConnectionId, ConnectionRegistry, Identity, IdentityProvider,
    OutboundEvent, Role, StaticIdentityProvider,
};
pub use coordinator::Coordinator;
pub use error::{Error, Result};
pub use session::{SessionError, SessionKey, SessionSnapshot, SessionState, SessionStore};
pub use signaling::{RouteError, SignalKind, SignalingRouter};
