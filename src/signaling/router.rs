//! Signaling router
//!
//! Validates and forwards negotiation messages between a broadcaster and a
//! specific viewer within one session. The router holds no negotiation
//! state of its own; it is a relay keyed by session membership, with the
//! sender's role checked against the session record rather than inferred
//! from the message shape.

use std::sync::Arc;

use bytes::Bytes;

use crate::connection::{ConnectionId, ConnectionRegistry, OutboundEvent};
use crate::session::{SessionKey, SessionStore};

use super::error::RouteError;
use super::message::SignalKind;

/// Stateless relay for offer / answer / candidate messages
pub struct SignalingRouter {
    registry: Arc<ConnectionRegistry>,
    store: Arc<SessionStore>,
}

impl SignalingRouter {
    /// Create a router over the shared registry and store
    pub fn new(registry: Arc<ConnectionRegistry>, store: Arc<SessionStore>) -> Self {
        Self { registry, store }
    }

    /// Forward a negotiation message to a peer in the same session
    ///
    /// The payload is delivered unmodified if and only if the target is
    /// still registered and still a member of the session; otherwise the
    /// sender gets [`RouteError::TargetGone`] and nothing is retried.
    pub async fn route(
        &self,
        key: &SessionKey,
        from: ConnectionId,
        to: ConnectionId,
        kind: SignalKind,
        payload: Bytes,
    ) -> Result<(), RouteError> {
        let entry_arc = self
            .store
            .get(key)
            .await
            .ok_or_else(|| RouteError::SessionNotFound(key.clone()))?;

        {
            let entry = entry_arc.read().await;

            if !entry.is_live() {
                return Err(RouteError::SessionNotFound(key.clone()));
            }

            let from_is_broadcaster = entry.broadcaster == Some(from);
            let from_is_viewer = entry.viewers.contains(&from);
            let to_is_broadcaster = entry.broadcaster == Some(to);
            let to_is_viewer = entry.viewers.contains(&to);

            // Direction rules: offers flow broadcaster -> viewer, answers
            // viewer -> broadcaster, candidates along either direction of
            // that same axis.
            let sender_ok = match kind {
                SignalKind::Offer => from_is_broadcaster,
                SignalKind::Answer => from_is_viewer,
                SignalKind::Candidate => from_is_broadcaster || from_is_viewer,
            };
            if !sender_ok {
                tracing::warn!(
                    session = %key,
                    connection = %from,
                    kind = %kind,
                    "Rejected signal from connection without the required role"
                );
                return Err(RouteError::UnauthorizedRole {
                    connection: from,
                    action: kind.as_str(),
                });
            }

            let target_ok = match kind {
                SignalKind::Offer => to_is_viewer,
                SignalKind::Answer => to_is_broadcaster,
                SignalKind::Candidate => {
                    (from_is_broadcaster && to_is_viewer) || (from_is_viewer && to_is_broadcaster)
                }
            };
            if !target_ok {
                // A target that is still a session member but sits on the
                // wrong side of the broadcaster <-> viewer axis is an
                // authorization failure by the sender; TargetGone is
                // reserved for a recipient that actually vanished.
                if to_is_broadcaster || to_is_viewer {
                    tracing::warn!(
                        session = %key,
                        from = %from,
                        to = %to,
                        kind = %kind,
                        "Rejected signal addressed across the wrong peer axis"
                    );
                    return Err(RouteError::UnauthorizedRole {
                        connection: from,
                        action: kind.as_str(),
                    });
                }
                return Err(RouteError::TargetGone(to));
            }
        }

        let delivered = self
            .registry
            .push(to, OutboundEvent::Signal { kind, from, payload })
            .await;

        if !delivered {
            return Err(RouteError::TargetGone(to));
        }

        tracing::trace!(
            session = %key,
            from = %from,
            to = %to,
            kind = %kind,
            "Signal forwarded"
        );

        Ok(())
    }
}
