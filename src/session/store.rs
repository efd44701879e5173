//! Session store
//!
//! The central map of active sessions. The outer lock is held only for
//! lookup, insert, and remove; every mutation of a session goes through
//! that session's own entry lock, so concurrent events for different keys
//! never serialize against each other.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify, RwLock};

use super::entry::{SessionEntry, SessionSnapshot};
use super::key::SessionKey;

/// Wakeup handle plus the number of viewers currently waiting on it
///
/// The count is what lets the last waiter prune the map entry; relying on
/// `Arc` strong counts would leave entries behind whenever two waiters
/// time out while both still hold their handle.
struct LiveWaiters {
    notify: Arc<Notify>,
    waiters: usize,
}

/// Store of all active sessions
pub struct SessionStore {
    /// Map of session key to entry, each behind its own lock
    sessions: RwLock<HashMap<SessionKey, Arc<RwLock<SessionEntry>>>>,

    /// Wakeups for viewers waiting on a key with no broadcaster yet
    live_waiters: Mutex<HashMap<SessionKey, LiveWaiters>>,

    /// Reorder window handed to each new session's chunk sequencer
    reorder_window: u64,
}

impl SessionStore {
    /// Create an empty store
    pub fn new(reorder_window: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            live_waiters: Mutex::new(HashMap::new()),
            reorder_window,
        }
    }

    /// Get the entry for a key, creating an empty one if absent
    pub async fn get_or_create(&self, key: &SessionKey) -> Arc<RwLock<SessionEntry>> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!(session = %key, "Session entry created");
                Arc::new(RwLock::new(SessionEntry::new(
                    key.clone(),
                    self.reorder_window,
                )))
            })
            .clone()
    }

    /// Get the entry for a key
    pub async fn get(&self, key: &SessionKey) -> Option<Arc<RwLock<SessionEntry>>> {
        self.sessions.read().await.get(key).cloned()
    }

    /// Remove the entry for a key
    pub async fn remove(&self, key: &SessionKey) -> Option<Arc<RwLock<SessionEntry>>> {
        let removed = self.sessions.write().await.remove(key);
        if removed.is_some() {
            tracing::debug!(session = %key, "Session entry removed");
        }
        removed
    }

    /// Remove an entry only if it is still the one mapped to the key
    ///
    /// Teardown uses this so it can never delete a fresh session that
    /// replaced the one it tore down.
    pub(crate) async fn remove_entry(
        &self,
        key: &SessionKey,
        entry: &Arc<RwLock<SessionEntry>>,
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(key) {
            Some(existing) if Arc::ptr_eq(existing, entry) => {
                sessions.remove(key);
                tracing::debug!(session = %key, "Session entry removed");
                true
            }
            _ => false,
        }
    }

    /// Keys of sessions whose broadcaster is the given connection
    pub(crate) async fn keys_with_broadcaster(&self, id: crate::connection::ConnectionId) -> Vec<SessionKey> {
        let sessions = self.sessions.read().await;
        let mut keys = Vec::new();
        for (key, entry_arc) in sessions.iter() {
            if entry_arc.read().await.broadcaster == Some(id) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Keys of sessions that have the given connection as a viewer
    pub(crate) async fn keys_with_viewer(&self, id: crate::connection::ConnectionId) -> Vec<SessionKey> {
        let sessions = self.sessions.read().await;
        let mut keys = Vec::new();
        for (key, entry_arc) in sessions.iter() {
            if entry_arc.read().await.viewers.contains(&id) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Point-in-time snapshot of a session
    pub async fn snapshot(&self, key: &SessionKey) -> Option<SessionSnapshot> {
        let entry_arc = self.get(key).await?;
        let entry = entry_arc.read().await;
        Some(SessionSnapshot::of(&entry))
    }

    /// Number of active sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Wakeup handle for a viewer waiting on a key that is not live yet
    ///
    /// The caller must create (and enable) the `notified()` future before
    /// re-checking the store, or a broadcaster registering in between would
    /// be missed.
    pub(crate) async fn live_waiter(&self, key: &SessionKey) -> Arc<Notify> {
        let mut waiters = self.live_waiters.lock().await;
        let entry = waiters.entry(key.clone()).or_insert_with(|| LiveWaiters {
            notify: Arc::new(Notify::new()),
            waiters: 0,
        });
        entry.waiters += 1;
        Arc::clone(&entry.notify)
    }

    /// Wake every viewer waiting for this key to go live
    pub(crate) async fn announce_live(&self, key: &SessionKey) {
        let waiter = self.live_waiters.lock().await.remove(key);
        if let Some(waiter) = waiter {
            waiter.notify.notify_waiters();
        }
    }

    /// Release a waiter handle after its wait (admitted or timed out)
    ///
    /// The last waiter for a key prunes the map entry, so keys that never
    /// go live do not accumulate `Notify` entries. A handle from a
    /// generation already removed by `announce_live` is a no-op.
    pub(crate) async fn drop_waiter(&self, key: &SessionKey, waiter: &Arc<Notify>) {
        let mut waiters = self.live_waiters.lock().await;
        if let Some(entry) = waiters.get_mut(key) {
            if Arc::ptr_eq(&entry.notify, waiter) {
                entry.waiters = entry.waiters.saturating_sub(1);
                if entry.waiters == 0 {
                    waiters.remove(key);
                }
            }
        }
    }
}
