//! Outbound event surface
//!
//! The coordinator is transport-agnostic: it never writes to a socket.
//! Each connection registers an [`ConnectionHandle`] at connect time, and
//! everything the core pushes to a client travels through it as an
//! [`OutboundEvent`]. The gateway drains the paired receiver and encodes
//! events onto whatever wire it speaks.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::signaling::SignalKind;

use super::registry::ConnectionId;

/// An event pushed from the core to a single client
///
/// Negotiation payloads are opaque `Bytes`; the core never inspects them,
/// so fan-out and buffering stay reference-counted.
#[derive(Debug, Clone)]
pub enum OutboundEvent {
    /// A forwarded negotiation message (offer / answer / candidate)
    Signal {
        /// Kind of negotiation message
        kind: SignalKind,
        /// Connection that sent it
        from: ConnectionId,
        /// Opaque negotiation payload
        payload: Bytes,
    },
    /// A viewer was admitted; the broadcaster should build an offer for it
    WatcherJoined(ConnectionId),
    /// Updated live viewer count for the broadcaster
    ViewerCount(u32),
    /// A viewer left; the broadcaster should release its peer resources
    DisconnectPeer(ConnectionId),
    /// The session ended; sent to every viewer exactly once
    StreamEnded,
    /// No broadcaster appeared within the join timeout
    StreamNotFound,
}

/// Sending half of a connection's outbound channel
///
/// Cheap to clone; the registry keeps one per connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver the transport side drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Push an event to the client
    ///
    /// Returns false if the transport side already dropped the receiver.
    pub(crate) fn send(&self, event: OutboundEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_delivery() {
        let (handle, mut rx) = ConnectionHandle::channel();

        assert!(handle.send(OutboundEvent::ViewerCount(3)));

        match rx.recv().await {
            Some(OutboundEvent::ViewerCount(n)) => assert_eq!(n, 3),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (handle, rx) = ConnectionHandle::channel();
        drop(rx);

        assert!(!handle.send(OutboundEvent::StreamEnded));
    }
}
