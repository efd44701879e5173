//! Negotiation-message relay
//!
//! Forwards offer / answer / candidate payloads between a broadcaster and
//! a specific viewer, with explicit role checks and no retained state.

pub mod error;
pub mod message;
pub mod router;

pub use error::RouteError;
pub use message::SignalKind;
pub use router::SignalingRouter;
