//! Storage sink contract
//!
//! The actual recording backend (object store, filesystem, database) lives
//! outside this crate. The sequencer only guarantees that chunks reach the
//! sink in strictly increasing index order and that every recording is
//! finalized exactly once with an honest completeness flag.

use std::sync::Mutex;

use bytes::Bytes;

use crate::session::SessionKey;

/// Receives ordered media chunks and terminal recording metadata
///
/// Called under the owning session's lock, so implementations must not
/// block; hand the payload to a channel or queue if persistence is slow.
pub trait StorageSink: Send + Sync {
    /// Store one chunk; indices arrive strictly increasing with no gaps
    fn store_chunk(&self, key: &SessionKey, index: u64, payload: Bytes);

    /// Close the recording; `complete` is false if any chunk was lost
    fn finalize(&self, key: &SessionKey, complete: bool);
}

/// In-memory sink for tests and demos
#[derive(Debug, Default)]
pub struct MemorySink {
    chunks: Mutex<Vec<(SessionKey, u64, Bytes)>>,
    finalized: Mutex<Vec<(SessionKey, bool)>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices stored for a session, in delivery order
    pub fn stored_indices(&self, key: &SessionKey) -> Vec<u64> {
        self.chunks
            .lock()
            .map(|chunks| {
                chunks
                    .iter()
                    .filter(|(k, _, _)| k == key)
                    .map(|(_, index, _)| *index)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Finalize records `(key, complete)` in call order
    pub fn finalized(&self) -> Vec<(SessionKey, bool)> {
        self.finalized
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl StorageSink for MemorySink {
    fn store_chunk(&self, key: &SessionKey, index: u64, payload: Bytes) {
        if let Ok(mut chunks) = self.chunks.lock() {
            chunks.push((key.clone(), index, payload));
        }
    }

    fn finalize(&self, key: &SessionKey, complete: bool) {
        if let Ok(mut records) = self.finalized.lock() {
            records.push((key.clone(), complete));
        }
    }
}
