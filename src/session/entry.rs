//! Session entry and state types
//!
//! One entry per live session, holding the broadcaster binding, the
//! admitted viewer set, and the recording sequencer. All mutation happens
//! under the entry's own lock in the store, which is what gives each
//! session its exclusion without serializing unrelated streams.

use std::collections::HashSet;
use std::time::Instant;

use crate::chunk::ChunkSequencer;
use crate::connection::ConnectionId;

use super::error::SessionError;
use super::key::SessionKey;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created but no broadcaster yet
    Empty,
    /// Broadcaster present, viewers may join
    Live,
    /// Terminal; no further signaling or chunk ingestion
    Ended,
}

/// Entry for a single session
#[derive(Debug)]
pub struct SessionEntry {
    /// Session key
    pub key: SessionKey,

    /// Current broadcaster connection (at most one at any instant)
    pub broadcaster: Option<ConnectionId>,

    /// Connections currently admitted as viewers
    pub viewers: HashSet<ConnectionId>,

    /// Current lifecycle state
    pub state: SessionState,

    /// Ordered chunk ingestion for this session's recording
    pub recording: ChunkSequencer,

    /// When the entry was created
    pub created_at: Instant,
}

impl SessionEntry {
    /// Create a new empty entry
    pub(super) fn new(key: SessionKey, reorder_window: u64) -> Self {
        let recording = ChunkSequencer::new(key.clone(), reorder_window);
        Self {
            key,
            broadcaster: None,
            viewers: HashSet::new(),
            state: SessionState::Empty,
            recording,
            created_at: Instant::now(),
        }
    }

    /// Whether the session is live
    pub fn is_live(&self) -> bool {
        self.state == SessionState::Live
    }

    /// Bind the broadcaster and move the session to `Live`
    ///
    /// A second registration while one broadcaster is bound is rejected;
    /// the incumbent keeps the session.
    pub fn register_broadcaster(&mut self, id: ConnectionId) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ended => Err(SessionError::Ended(self.key.clone())),
            SessionState::Live if self.broadcaster.is_some() => {
                Err(SessionError::DuplicateBroadcaster(self.key.clone()))
            }
            _ => {
                self.broadcaster = Some(id);
                self.state = SessionState::Live;
                Ok(())
            }
        }
    }

    /// Admit a viewer, returning the new viewer count
    pub fn add_viewer(&mut self, id: ConnectionId) -> Result<u32, SessionError> {
        if self.state != SessionState::Live {
            return Err(SessionError::Ended(self.key.clone()));
        }
        self.viewers.insert(id);
        Ok(self.viewer_count())
    }

    /// Remove a viewer, returning the new viewer count
    ///
    /// Removing a connection that was never admitted is a logic error
    /// (missed add or double remove) and is reported, never clamped.
    pub fn remove_viewer(&mut self, id: ConnectionId) -> Result<u32, SessionError> {
        if !self.viewers.remove(&id) {
            return Err(SessionError::PhantomViewer {
                session: self.key.clone(),
                connection: id,
            });
        }
        Ok(self.viewer_count())
    }

    /// Current viewer count
    ///
    /// Always equals the number of admitted viewer connections, so it can
    /// never go negative.
    pub fn viewer_count(&self) -> u32 {
        self.viewers.len() as u32
    }

    /// Move to the terminal state, taking the viewer set to notify
    ///
    /// Returns `None` if the session already ended, which is what makes
    /// teardown idempotent: only the first caller gets viewers to notify.
    pub fn end(&mut self) -> Option<HashSet<ConnectionId>> {
        if self.state == SessionState::Ended {
            return None;
        }
        self.state = SessionState::Ended;
        self.broadcaster = None;
        Some(std::mem::take(&mut self.viewers))
    }
}

/// Point-in-time view of a session for introspection
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current lifecycle state
    pub state: SessionState,
    /// Whether a broadcaster is bound
    pub has_broadcaster: bool,
    /// Number of admitted viewers
    pub viewer_count: u32,
    /// Chunks delivered to storage so far
    pub recorded_chunks: u64,
    /// Whether the recording has lost data
    pub recording_incomplete: bool,
}

impl SessionSnapshot {
    pub(super) fn of(entry: &SessionEntry) -> Self {
        Self {
            state: entry.state,
            has_broadcaster: entry.broadcaster.is_some(),
            viewer_count: entry.viewer_count(),
            recorded_chunks: entry.recording.next_expected(),
            recording_incomplete: entry.recording.is_incomplete(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionHandle, ConnectionRegistry, Identity, Role};

    async fn connection_id(registry: &ConnectionRegistry, user: &str, role: Role) -> ConnectionId {
        let (handle, _rx) = ConnectionHandle::channel();
        registry.register(Identity::new(user, role), handle).await
    }

    #[tokio::test]
    async fn test_remove_unadmitted_viewer_is_reported() {
        let registry = ConnectionRegistry::new();
        let broadcaster = connection_id(&registry, "teacher", Role::Broadcaster).await;
        let admitted = connection_id(&registry, "alice", Role::Viewer).await;
        let stranger = connection_id(&registry, "bob", Role::Viewer).await;

        let mut entry = SessionEntry::new(SessionKey::new("t1", "s1"), 16);
        entry.register_broadcaster(broadcaster).unwrap();
        entry.add_viewer(admitted).unwrap();

        // A missed add or double remove is a logic error, never clamped
        let result = entry.remove_viewer(stranger);
        assert!(matches!(
            result,
            Err(SessionError::PhantomViewer { connection, .. }) if connection == stranger
        ));
        assert_eq!(entry.viewer_count(), 1);

        // A genuine removal still works afterwards
        assert_eq!(entry.remove_viewer(admitted).unwrap(), 0);
        let result = entry.remove_viewer(admitted);
        assert!(matches!(result, Err(SessionError::PhantomViewer { .. })));
        assert_eq!(entry.viewer_count(), 0);
    }

    #[tokio::test]
    async fn test_end_is_terminal() {
        let registry = ConnectionRegistry::new();
        let broadcaster = connection_id(&registry, "teacher", Role::Broadcaster).await;
        let viewer = connection_id(&registry, "alice", Role::Viewer).await;

        let mut entry = SessionEntry::new(SessionKey::new("t1", "s1"), 16);
        entry.register_broadcaster(broadcaster).unwrap();
        entry.add_viewer(viewer).unwrap();

        let viewers = entry.end().unwrap();
        assert_eq!(viewers.len(), 1);
        assert_eq!(entry.state, SessionState::Ended);

        // Second end yields no viewers to notify
        assert!(entry.end().is_none());
        assert!(matches!(
            entry.add_viewer(viewer),
            Err(SessionError::Ended(_))
        ));
    }
}
