//! Session lifecycle coordinator
//!
//! The public surface of the crate. One `Coordinator` owns the connection
//! registry, the session store, the signaling router, and the storage sink,
//! and drives every session through `Empty -> Live -> Ended`.
//!
//! # Architecture
//!
//! ```text
//!                           Coordinator
//!            ┌────────────────────────────────────────┐
//!            │ ConnectionRegistry   SessionStore      │
//!            │   id -> (user,role)    key -> entry    │
//!            │   outbound handles     broadcaster     │
//!            │                        viewers         │
//!            │ SignalingRouter        ChunkSequencer ─┼──► StorageSink
//!            └───────────┬────────────────────────────┘
//!                        │ OutboundEvent (mpsc per connection)
//!          ┌─────────────┼─────────────┐
//!          ▼             ▼             ▼
//!     [Broadcaster]   [Viewer]      [Viewer]
//! ```
//!
//! Each transport connection is driven by its own task; the registry and
//! store are the only shared state, and each session mutates behind its
//! own lock. The one intentional suspension point is a viewer waiting for
//! a broadcaster that has not gone live yet.

use std::sync::Arc;

use bytes::Bytes;

use crate::chunk::StorageSink;
use crate::config::CoordinatorConfig;
use crate::connection::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, Identity, OutboundEvent, Role,
};
use crate::error::{Error, Result};
use crate::session::{SessionError, SessionKey, SessionSnapshot, SessionStore};
use crate::signaling::{RouteError, SignalKind, SignalingRouter};

/// Livestream signaling and session-coordination core
pub struct Coordinator {
    config: CoordinatorConfig,
    registry: Arc<ConnectionRegistry>,
    store: Arc<SessionStore>,
    router: SignalingRouter,
    sink: Arc<dyn StorageSink>,
}

impl Coordinator {
    /// Create a coordinator with the given configuration and storage sink
    pub fn new(config: CoordinatorConfig, sink: Arc<dyn StorageSink>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let store = Arc::new(SessionStore::new(config.reorder_window));
        let router = SignalingRouter::new(Arc::clone(&registry), Arc::clone(&store));

        Self {
            config,
            registry,
            store,
            router,
            sink,
        }
    }

    /// Get the connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get the configuration
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Register a transport connection for an already-resolved identity
    ///
    /// The gateway authenticates first (see
    /// [`IdentityProvider`](crate::connection::IdentityProvider)); no event
    /// is accepted from a connection that has not passed through here.
    pub async fn connect(&self, identity: Identity, handle: ConnectionHandle) -> ConnectionId {
        self.registry.register(identity, handle).await
    }

    /// Go live: bind the connection as the session's broadcaster
    ///
    /// Creates the session lazily and wakes any viewers waiting on the key.
    /// A second broadcaster for a live session is rejected; the incumbent
    /// keeps it. A stale terminal record for the key is replaced with a
    /// fresh session, never resurrected.
    pub async fn broadcaster_register(&self, conn: ConnectionId, key: &SessionKey) -> Result<()> {
        let connection = self
            .registry
            .lookup(conn)
            .await
            .ok_or(Error::ConnectionNotFound(conn))?;

        if connection.role != Role::Broadcaster {
            return Err(RouteError::UnauthorizedRole {
                connection: conn,
                action: "register as broadcaster",
            }
            .into());
        }

        // One retry is enough: an Ended entry only lingers between a racing
        // teardown's state flip and its store removal.
        for _ in 0..2 {
            let entry_arc = self.store.get_or_create(key).await;
            let result = entry_arc.write().await.register_broadcaster(conn);

            match result {
                Ok(()) => {
                    tracing::info!(
                        session = %key,
                        connection = %conn,
                        user = %connection.user_id,
                        "Broadcaster registered, session live"
                    );
                    self.store.announce_live(key).await;
                    return Ok(());
                }
                Err(SessionError::Ended(_)) => {
                    self.store.remove_entry(key, &entry_arc).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SessionError::Ended(key.clone()).into())
    }

    /// Join a session as a viewer
    ///
    /// If the session is live the viewer is admitted immediately and the
    /// broadcaster is told via `WatcherJoined` plus a `ViewerCount` update.
    /// If no broadcaster is live for the key, the call waits up to
    /// `join_timeout` for one, then delivers exactly one `StreamNotFound`
    /// to the viewer. This wait is the only suspension point in the core.
    pub async fn watcher_join(&self, conn: ConnectionId, key: &SessionKey) -> Result<()> {
        let connection = self
            .registry
            .lookup(conn)
            .await
            .ok_or(Error::ConnectionNotFound(conn))?;

        if connection.role != Role::Viewer {
            return Err(RouteError::UnauthorizedRole {
                connection: conn,
                action: "join as viewer",
            }
            .into());
        }

        if self.try_admit(conn, key).await? {
            return Ok(());
        }

        // Arm the wakeup before re-checking so a broadcaster registering
        // in between cannot be missed.
        let waiter = self.store.live_waiter(key).await;
        let notified = waiter.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        match self.try_admit(conn, key).await {
            Ok(true) => {
                self.store.drop_waiter(key, &waiter).await;
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => {
                self.store.drop_waiter(key, &waiter).await;
                return Err(e);
            }
        }

        let outcome = tokio::time::timeout(self.config.join_timeout, notified).await;
        self.store.drop_waiter(key, &waiter).await;

        if outcome.is_ok() && self.try_admit(conn, key).await? {
            return Ok(());
        }

        tracing::info!(
            session = %key,
            connection = %conn,
            timeout_ms = self.config.join_timeout.as_millis() as u64,
            "No broadcaster for key, viewer join timed out"
        );
        self.registry.push(conn, OutboundEvent::StreamNotFound).await;
        Ok(())
    }

    /// Forward a negotiation message (offer / answer / candidate) to a peer
    pub async fn signal(
        &self,
        key: &SessionKey,
        from: ConnectionId,
        to: ConnectionId,
        kind: SignalKind,
        payload: Bytes,
    ) -> Result<()> {
        self.registry
            .lookup(from)
            .await
            .ok_or(Error::ConnectionNotFound(from))?;

        self.router.route(key, from, to, kind, payload).await?;
        Ok(())
    }

    /// Ingest one recorded media chunk from the session's broadcaster
    ///
    /// Returns the number of chunks this call released to storage.
    pub async fn media_chunk(
        &self,
        conn: ConnectionId,
        key: &SessionKey,
        index: u64,
        payload: Bytes,
    ) -> Result<usize> {
        let entry_arc = self
            .store
            .get(key)
            .await
            .ok_or_else(|| SessionError::NotFound(key.clone()))?;

        let mut entry = entry_arc.write().await;

        if !entry.is_live() {
            return Err(SessionError::Ended(key.clone()).into());
        }
        if entry.broadcaster != Some(conn) {
            return Err(RouteError::UnauthorizedRole {
                connection: conn,
                action: "push media chunks",
            }
            .into());
        }

        let released = entry.recording.ingest(index, payload, self.sink.as_ref())?;
        Ok(released)
    }

    /// End a stream explicitly (the teacher pressed stop)
    ///
    /// Identical to broadcaster transport loss except the recording flush
    /// is known to be graceful. Idempotent: stopping an already-ended or
    /// unknown session does nothing.
    pub async fn stream_stop(&self, conn: ConnectionId, key: &SessionKey) -> Result<()> {
        let Some(entry_arc) = self.store.get(key).await else {
            tracing::debug!(session = %key, "Stop for unknown session ignored");
            return Ok(());
        };

        {
            let entry = entry_arc.read().await;
            if !entry.is_live() {
                return Ok(());
            }
            if entry.broadcaster != Some(conn) {
                return Err(RouteError::UnauthorizedRole {
                    connection: conn,
                    action: "stop the stream",
                }
                .into());
            }
        }

        self.teardown(key, "explicit stop").await;
        Ok(())
    }

    /// Handle transport-level loss of a connection
    ///
    /// Session cleanup runs before the registry entry is dropped, so no
    /// session ever references a dead connection. A broadcaster loss tears
    /// its sessions down; a viewer loss releases just that viewer.
    pub async fn disconnect(&self, conn: ConnectionId) {
        let Some(connection) = self.registry.lookup(conn).await else {
            return;
        };

        match connection.role {
            Role::Broadcaster => {
                for key in self.store.keys_with_broadcaster(conn).await {
                    self.teardown(&key, "transport loss").await;
                }
            }
            Role::Viewer => {
                for key in self.store.keys_with_viewer(conn).await {
                    self.release_viewer(&key, conn).await;
                }
            }
        }

        self.registry.unregister(conn).await;
    }

    /// Point-in-time view of a session
    pub async fn session_snapshot(&self, key: &SessionKey) -> Option<SessionSnapshot> {
        self.store.snapshot(key).await
    }

    /// Number of active sessions
    pub async fn session_count(&self) -> usize {
        self.store.session_count().await
    }

    /// Admit a viewer into a live session, if one exists for the key
    async fn try_admit(&self, viewer: ConnectionId, key: &SessionKey) -> Result<bool> {
        let Some(entry_arc) = self.store.get(key).await else {
            return Ok(false);
        };

        let (broadcaster, count) = {
            let mut entry = entry_arc.write().await;
            if !entry.is_live() {
                return Ok(false);
            }
            let count = entry.add_viewer(viewer)?;
            (entry.broadcaster, count)
        };

        if let Some(broadcaster) = broadcaster {
            self.registry
                .push(broadcaster, OutboundEvent::WatcherJoined(viewer))
                .await;
            self.registry
                .push(broadcaster, OutboundEvent::ViewerCount(count))
                .await;
        }

        tracing::info!(
            session = %key,
            connection = %viewer,
            viewers = count,
            "Viewer admitted"
        );
        Ok(true)
    }

    /// Remove a departing viewer and tell the broadcaster to release it
    async fn release_viewer(&self, key: &SessionKey, viewer: ConnectionId) {
        let Some(entry_arc) = self.store.get(key).await else {
            return;
        };

        let released = {
            let mut entry = entry_arc.write().await;
            if !entry.is_live() {
                return;
            }
            let broadcaster = entry.broadcaster;
            match entry.remove_viewer(viewer) {
                Ok(count) => Some((broadcaster, count)),
                Err(e) => {
                    tracing::error!(
                        session = %key,
                        connection = %viewer,
                        error = %e,
                        "Viewer accounting error on disconnect"
                    );
                    None
                }
            }
        };

        if let Some((broadcaster, count)) = released {
            if let Some(broadcaster) = broadcaster {
                self.registry
                    .push(broadcaster, OutboundEvent::DisconnectPeer(viewer))
                    .await;
                self.registry
                    .push(broadcaster, OutboundEvent::ViewerCount(count))
                    .await;
            }

            tracing::info!(
                session = %key,
                connection = %viewer,
                viewers = count,
                "Viewer released"
            );
        }
    }

    /// Move a session to its terminal state and notify everyone once
    ///
    /// Idempotent: the first caller flips the state under the entry lock
    /// and takes the viewer set; anyone racing in after that finds `Ended`
    /// (or no entry) and does nothing. Exactly one `StreamEnded` per
    /// viewer, exactly one finalize of the recording.
    async fn teardown(&self, key: &SessionKey, reason: &'static str) {
        let Some(entry_arc) = self.store.get(key).await else {
            return;
        };

        let viewers = {
            let mut entry = entry_arc.write().await;
            match entry.end() {
                Some(viewers) => {
                    entry.recording.finalize(self.sink.as_ref());
                    viewers
                }
                None => return,
            }
        };

        for viewer in &viewers {
            self.registry.push(*viewer, OutboundEvent::StreamEnded).await;
        }

        self.store.remove_entry(key, &entry_arc).await;

        tracing::info!(
            session = %key,
            viewers = viewers.len(),
            reason = reason,
            "Session ended"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::chunk::MemorySink;

    fn coordinator_with(config: CoordinatorConfig) -> (Coordinator, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let coordinator = Coordinator::new(config, Arc::clone(&sink) as Arc<dyn StorageSink>);
        (coordinator, sink)
    }

    fn coordinator() -> (Coordinator, Arc<MemorySink>) {
        coordinator_with(CoordinatorConfig::default().join_timeout(Duration::from_millis(100)))
    }

    async fn connect(
        coordinator: &Coordinator,
        user: &str,
        role: Role,
    ) -> (
        ConnectionId,
        tokio::sync::mpsc::UnboundedReceiver<OutboundEvent>,
    ) {
        let (handle, rx) = ConnectionHandle::channel();
        let id = coordinator.connect(Identity::new(user, role), handle).await;
        (id, rx)
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<OutboundEvent>) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_broadcaster_goes_live() {
        let (coordinator, _sink) = coordinator();
        let key = SessionKey::new("t1", "s1");
        let (teacher, _rx) = connect(&coordinator, "teacher", Role::Broadcaster).await;

        coordinator.broadcaster_register(teacher, &key).await.unwrap();

        let snapshot = coordinator.session_snapshot(&key).await.unwrap();
        assert!(snapshot.has_broadcaster);
        assert_eq!(snapshot.viewer_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_broadcaster_rejected() {
        let (coordinator, _sink) = coordinator();
        let key = SessionKey::new("t1", "s1");
        let (first, _rx1) = connect(&coordinator, "teacher", Role::Broadcaster).await;
        let (second, _rx2) = connect(&coordinator, "impostor", Role::Broadcaster).await;

        coordinator.broadcaster_register(first, &key).await.unwrap();
        let result = coordinator.broadcaster_register(second, &key).await;

        assert!(matches!(
            result,
            Err(Error::Session(SessionError::DuplicateBroadcaster(_)))
        ));
        // The incumbent keeps the session
        assert!(coordinator.session_snapshot(&key).await.unwrap().has_broadcaster);
    }

    #[tokio::test]
    async fn test_viewer_role_checked_on_register() {
        let (coordinator, _sink) = coordinator();
        let key = SessionKey::new("t1", "s1");
        let (viewer, _rx) = connect(&coordinator, "student", Role::Viewer).await;

        let result = coordinator.broadcaster_register(viewer, &key).await;
        assert!(matches!(
            result,
            Err(Error::Route(RouteError::UnauthorizedRole { .. }))
        ));
    }

    #[tokio::test]
    async fn test_viewer_admission_notifies_broadcaster() {
        let (coordinator, _sink) = coordinator();
        let key = SessionKey::new("t1", "s1");
        let (teacher, mut teacher_rx) = connect(&coordinator, "teacher", Role::Broadcaster).await;
        let (student, _rx) = connect(&coordinator, "student", Role::Viewer).await;

        coordinator.broadcaster_register(teacher, &key).await.unwrap();
        coordinator.watcher_join(student, &key).await.unwrap();

        let events = drain(&mut teacher_rx);
        assert!(matches!(events[0], OutboundEvent::WatcherJoined(id) if id == student));
        assert!(matches!(events[1], OutboundEvent::ViewerCount(1)));
    }

    // Scenario: broadcaster registers, two viewers join, broadcaster
    // disconnects; both viewers get exactly one StreamEnded and the
    // session is gone.
    #[tokio::test]
    async fn test_broadcaster_loss_ends_session() {
        let (coordinator, sink) = coordinator();
        let key = SessionKey::new("t1", "s1");
        let (teacher, _teacher_rx) = connect(&coordinator, "teacher", Role::Broadcaster).await;
        let (v1, mut v1_rx) = connect(&coordinator, "alice", Role::Viewer).await;
        let (v2, mut v2_rx) = connect(&coordinator, "bob", Role::Viewer).await;

        coordinator.broadcaster_register(teacher, &key).await.unwrap();
        coordinator.watcher_join(v1, &key).await.unwrap();
        coordinator.watcher_join(v2, &key).await.unwrap();

        coordinator.disconnect(teacher).await;

        for rx in [&mut v1_rx, &mut v2_rx] {
            let ended: Vec<_> = drain(rx)
                .into_iter()
                .filter(|e| matches!(e, OutboundEvent::StreamEnded))
                .collect();
            assert_eq!(ended.len(), 1);
        }

        assert!(coordinator.session_snapshot(&key).await.is_none());
        assert!(coordinator.registry().lookup(teacher).await.is_none());
        assert_eq!(sink.finalized().len(), 1);
    }

    // Scenario: a viewer joins a key no broadcaster ever registered for
    // and gets exactly one StreamNotFound after the timeout.
    #[tokio::test]
    async fn test_join_unknown_key_times_out() {
        let (coordinator, _sink) = coordinator();
        let key = SessionKey::new("t1", "never-live");
        let (student, mut rx) = connect(&coordinator, "student", Role::Viewer).await;

        coordinator.watcher_join(student, &key).await.unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], OutboundEvent::StreamNotFound));
    }

    #[tokio::test]
    async fn test_waiting_viewer_admitted_when_broadcaster_arrives() {
        let (coordinator, _sink) = coordinator_with(
            CoordinatorConfig::default().join_timeout(Duration::from_secs(5)),
        );
        let coordinator = Arc::new(coordinator);
        let key = SessionKey::new("t1", "s1");
        let (teacher, mut teacher_rx) = connect(&coordinator, "teacher", Role::Broadcaster).await;
        let (student, mut student_rx) = connect(&coordinator, "student", Role::Viewer).await;

        let join = {
            let coordinator = Arc::clone(&coordinator);
            let key = key.clone();
            tokio::spawn(async move { coordinator.watcher_join(student, &key).await })
        };

        // Let the join reach its wait before going live
        tokio::time::sleep(Duration::from_millis(20)).await;
        coordinator.broadcaster_register(teacher, &key).await.unwrap();

        join.await.unwrap().unwrap();

        assert!(drain(&mut student_rx).is_empty());
        let events = drain(&mut teacher_rx);
        assert!(matches!(events[0], OutboundEvent::WatcherJoined(id) if id == student));
        assert_eq!(coordinator.session_snapshot(&key).await.unwrap().viewer_count, 1);
    }

    // Scenario: one viewer disconnects while another stays; the broadcaster
    // gets DisconnectPeer for only the departing viewer and the count drops
    // by exactly one.
    #[tokio::test]
    async fn test_single_viewer_departure() {
        let (coordinator, _sink) = coordinator();
        let key = SessionKey::new("t1", "s1");
        let (teacher, mut teacher_rx) = connect(&coordinator, "teacher", Role::Broadcaster).await;
        let (v1, _v1_rx) = connect(&coordinator, "alice", Role::Viewer).await;
        let (v2, mut v2_rx) = connect(&coordinator, "bob", Role::Viewer).await;

        coordinator.broadcaster_register(teacher, &key).await.unwrap();
        coordinator.watcher_join(v1, &key).await.unwrap();
        coordinator.watcher_join(v2, &key).await.unwrap();
        drain(&mut teacher_rx);

        coordinator.disconnect(v1).await;

        let events = drain(&mut teacher_rx);
        assert!(matches!(events[0], OutboundEvent::DisconnectPeer(id) if id == v1));
        assert!(matches!(events[1], OutboundEvent::ViewerCount(1)));

        // The remaining viewer is untouched
        assert!(drain(&mut v2_rx).is_empty());
        assert_eq!(coordinator.session_snapshot(&key).await.unwrap().viewer_count, 1);
    }

    #[tokio::test]
    async fn test_teardown_idempotent() {
        let (coordinator, sink) = coordinator();
        let key = SessionKey::new("t1", "s1");
        let (teacher, _teacher_rx) = connect(&coordinator, "teacher", Role::Broadcaster).await;
        let (student, mut student_rx) = connect(&coordinator, "student", Role::Viewer).await;

        coordinator.broadcaster_register(teacher, &key).await.unwrap();
        coordinator.watcher_join(student, &key).await.unwrap();

        // Explicit stop racing transport-loss detection
        coordinator.stream_stop(teacher, &key).await.unwrap();
        coordinator.stream_stop(teacher, &key).await.unwrap();
        coordinator.disconnect(teacher).await;

        let ended: Vec<_> = drain(&mut student_rx)
            .into_iter()
            .filter(|e| matches!(e, OutboundEvent::StreamEnded))
            .collect();
        assert_eq!(ended.len(), 1);
        assert_eq!(sink.finalized().len(), 1);
    }

    #[tokio::test]
    async fn test_chunks_recorded_and_finalized_complete() {
        let (coordinator, sink) = coordinator();
        let key = SessionKey::new("t1", "s1");
        let (teacher, _rx) = connect(&coordinator, "teacher", Role::Broadcaster).await;

        coordinator.broadcaster_register(teacher, &key).await.unwrap();

        for index in [0u64, 1, 3, 2, 4] {
            coordinator
                .media_chunk(teacher, &key, index, Bytes::from_static(b"chunk"))
                .await
                .unwrap();
        }

        coordinator.stream_stop(teacher, &key).await.unwrap();

        assert_eq!(sink.stored_indices(&key), vec![0, 1, 2, 3, 4]);
        assert_eq!(sink.finalized(), vec![(key, true)]);
    }

    #[tokio::test]
    async fn test_chunk_gap_marks_recording_incomplete() {
        let (coordinator, sink) = coordinator_with(
            CoordinatorConfig::default()
                .join_timeout(Duration::from_millis(100))
                .reorder_window(2),
        );
        let key = SessionKey::new("t1", "s1");
        let (teacher, _rx) = connect(&coordinator, "teacher", Role::Broadcaster).await;

        coordinator.broadcaster_register(teacher, &key).await.unwrap();
        coordinator
            .media_chunk(teacher, &key, 0, Bytes::from_static(b"a"))
            .await
            .unwrap();
        coordinator
            .media_chunk(teacher, &key, 1, Bytes::from_static(b"b"))
            .await
            .unwrap();

        let result = coordinator
            .media_chunk(teacher, &key, 5, Bytes::from_static(b"f"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Chunk(crate::chunk::ChunkError::OutOfWindow { index: 5, .. }))
        ));

        // The session survives the report
        assert!(coordinator.session_snapshot(&key).await.is_some());

        coordinator.disconnect(teacher).await;
        assert_eq!(sink.stored_indices(&key), vec![0, 1]);
        assert_eq!(sink.finalized(), vec![(key, false)]);
    }

    #[tokio::test]
    async fn test_chunks_from_non_broadcaster_rejected() {
        let (coordinator, _sink) = coordinator();
        let key = SessionKey::new("t1", "s1");
        let (teacher, _teacher_rx) = connect(&coordinator, "teacher", Role::Broadcaster).await;
        let (student, _student_rx) = connect(&coordinator, "student", Role::Viewer).await;

        coordinator.broadcaster_register(teacher, &key).await.unwrap();
        coordinator.watcher_join(student, &key).await.unwrap();

        let result = coordinator
            .media_chunk(student, &key, 0, Bytes::from_static(b"x"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Route(RouteError::UnauthorizedRole { .. }))
        ));
    }

    #[tokio::test]
    async fn test_fresh_session_after_end() {
        let (coordinator, _sink) = coordinator();
        let key = SessionKey::new("t1", "s1");
        let (teacher, _rx1) = connect(&coordinator, "teacher", Role::Broadcaster).await;

        coordinator.broadcaster_register(teacher, &key).await.unwrap();
        coordinator
            .media_chunk(teacher, &key, 0, Bytes::from_static(b"a"))
            .await
            .unwrap();
        coordinator.stream_stop(teacher, &key).await.unwrap();
        coordinator.disconnect(teacher).await;

        // Same key, new class: a fresh record, not a resurrected one
        let (teacher2, _rx2) = connect(&coordinator, "teacher", Role::Broadcaster).await;
        coordinator.broadcaster_register(teacher2, &key).await.unwrap();

        let snapshot = coordinator.session_snapshot(&key).await.unwrap();
        assert_eq!(snapshot.recorded_chunks, 0);
        assert_eq!(snapshot.viewer_count, 0);
    }

    #[tokio::test]
    async fn test_sessions_isolated() {
        let (coordinator, _sink) = coordinator();
        let key_a = SessionKey::new("t1", "s1");
        let key_b = SessionKey::new("t2", "s2");
        let (teacher_a, _rx_a) = connect(&coordinator, "teacher-a", Role::Broadcaster).await;
        let (teacher_b, _rx_b) = connect(&coordinator, "teacher-b", Role::Broadcaster).await;
        let (student, mut student_rx) = connect(&coordinator, "student", Role::Viewer).await;

        coordinator.broadcaster_register(teacher_a, &key_a).await.unwrap();
        coordinator.broadcaster_register(teacher_b, &key_b).await.unwrap();
        coordinator.watcher_join(student, &key_b).await.unwrap();

        coordinator.disconnect(teacher_a).await;

        // Ending session A does not touch session B's viewer
        assert!(drain(&mut student_rx).is_empty());
        assert!(coordinator.session_snapshot(&key_a).await.is_none());
        assert_eq!(coordinator.session_snapshot(&key_b).await.unwrap().viewer_count, 1);
    }

    #[tokio::test]
    async fn test_signal_after_session_end_is_target_gone() {
        let (coordinator, _sink) = coordinator();
        let key = SessionKey::new("t1", "s1");
        let (teacher, _teacher_rx) = connect(&coordinator, "teacher", Role::Broadcaster).await;
        let (student, _student_rx) = connect(&coordinator, "student", Role::Viewer).await;

        coordinator.broadcaster_register(teacher, &key).await.unwrap();
        coordinator.watcher_join(student, &key).await.unwrap();
        coordinator.stream_stop(teacher, &key).await.unwrap();

        let result = coordinator
            .signal(&key, teacher, student, SignalKind::Offer, Bytes::from_static(b"late"))
            .await;
        assert!(matches!(
            result,
            Err(Error::Route(RouteError::SessionNotFound(_)))
        ));
    }
}
