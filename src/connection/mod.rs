//! Connection layer
//!
//! Tracks live transport connections, the identity bound to each, and the
//! outbound event channel used to push core events back to clients.

pub mod identity;
pub mod outbound;
pub mod registry;

pub use identity::{AuthError, Identity, IdentityProvider, Role, StaticIdentityProvider};
pub use outbound::{ConnectionHandle, OutboundEvent};
pub use registry::{Connection, ConnectionId, ConnectionRegistry};
