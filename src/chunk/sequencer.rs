//! Chunk sequencer
//!
//! The broadcaster pushes recorded media chunks with monotonically
//! increasing indices, but the transport may reorder them. The sequencer
//! delivers chunks to the storage sink in strict index order, holding
//! out-of-order arrivals in a bounded reorder buffer. A chunk that can
//! never be placed (gap beyond the window, duplicate, stale) is reported
//! instead of silently skipped, and data loss is recorded in the terminal
//! metadata handed to the sink at finalize time.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::session::SessionKey;

use super::error::ChunkError;
use super::sink::StorageSink;

/// Per-session ordered chunk ingestion
///
/// Owned by the session entry and mutated only under the session's lock,
/// so it needs no synchronization of its own.
#[derive(Debug)]
pub struct ChunkSequencer {
    /// Session this recording belongs to
    key: SessionKey,

    /// Next index the sink is waiting for
    next_expected: u64,

    /// How far past `next_expected` a chunk may arrive and still be buffered
    window: u64,

    /// Out-of-order chunks waiting for their predecessors
    pending: BTreeMap<u64, Bytes>,

    /// Whether any chunk was lost (gap reported or buffer discarded)
    incomplete: bool,

    /// Whether the recording has been finalized
    finalized: bool,
}

impl ChunkSequencer {
    /// Create a sequencer for a session with the given reorder window
    pub fn new(key: SessionKey, window: u64) -> Self {
        Self {
            key,
            next_expected: 0,
            window,
            pending: BTreeMap::new(),
            incomplete: false,
            finalized: false,
        }
    }

    /// Ingest one chunk from the broadcaster
    ///
    /// Returns the number of chunks released to the sink by this call:
    /// the chunk itself plus any buffered successors it unblocked, or zero
    /// if the chunk was buffered.
    ///
    /// Every unplaceable chunk is reported as
    /// [`OutOfWindow`](ChunkError::OutOfWindow), but only actual data loss
    /// marks the recording incomplete: a gap beyond the window drops a
    /// chunk, whereas a stale index below `next_expected` duplicates data
    /// the sink already holds, so it is reported without tainting an
    /// otherwise complete recording.
    pub fn ingest(
        &mut self,
        index: u64,
        payload: Bytes,
        sink: &dyn StorageSink,
    ) -> Result<usize, ChunkError> {
        if self.finalized {
            return Err(ChunkError::Finalized);
        }

        if index == self.next_expected {
            sink.store_chunk(&self.key, index, payload);
            self.next_expected += 1;
            let mut released = 1;

            // Drain the contiguous run that this chunk unblocked
            while let Some(buffered) = self.pending.remove(&self.next_expected) {
                sink.store_chunk(&self.key, self.next_expected, buffered);
                self.next_expected += 1;
                released += 1;
            }

            return Ok(released);
        }

        if index > self.next_expected && index - self.next_expected <= self.window {
            if self.pending.contains_key(&index) {
                // Duplicate of a buffered chunk; keep the first payload
                return Err(self.out_of_window(index));
            }
            self.pending.insert(index, payload);
            return Ok(0);
        }

        // Beyond the window the chunk is dropped and the gap is permanent;
        // stale indices were already delivered and lose nothing.
        if index > self.next_expected {
            self.incomplete = true;
        }

        Err(self.out_of_window(index))
    }

    /// Close the recording and hand terminal metadata to the sink
    ///
    /// The contiguous prefix was already delivered by `ingest`; whatever
    /// remains buffered is unplayable and discarded, marking the recording
    /// incomplete. Idempotent: only the first call reaches the sink.
    pub fn finalize(&mut self, sink: &dyn StorageSink) -> bool {
        if self.finalized {
            return !self.incomplete;
        }
        self.finalized = true;

        if !self.pending.is_empty() {
            tracing::warn!(
                session = %self.key,
                discarded = self.pending.len(),
                next_expected = self.next_expected,
                "Discarding unplayable buffered chunks at finalize"
            );
            self.pending.clear();
            self.incomplete = true;
        }

        let complete = !self.incomplete;
        sink.finalize(&self.key, complete);

        tracing::info!(
            session = %self.key,
            chunks = self.next_expected,
            complete = complete,
            "Recording finalized"
        );

        complete
    }

    /// Next index the sequencer is waiting for
    pub fn next_expected(&self) -> u64 {
        self.next_expected
    }

    /// Number of chunks currently held in the reorder buffer
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether any chunk has been lost so far
    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    fn out_of_window(&self, index: u64) -> ChunkError {
        tracing::warn!(
            session = %self.key,
            index = index,
            next_expected = self.next_expected,
            window = self.window,
            "Chunk outside reorder window"
        );
        ChunkError::OutOfWindow {
            index,
            next_expected: self.next_expected,
            window: self.window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::sink::MemorySink;

    fn sequencer(window: u64) -> (ChunkSequencer, MemorySink) {
        let key = SessionKey::new("t1", "s1");
        (ChunkSequencer::new(key, window), MemorySink::new())
    }

    #[test]
    fn test_in_order_delivery() {
        let (mut seq, sink) = sequencer(16);
        let key = SessionKey::new("t1", "s1");

        for index in 0..4 {
            let released = seq.ingest(index, Bytes::from_static(b"chunk"), &sink).unwrap();
            assert_eq!(released, 1);
        }

        assert_eq!(sink.stored_indices(&key), vec![0, 1, 2, 3]);
        assert!(!seq.is_incomplete());
    }

    #[test]
    fn test_reorder_within_window() {
        // Arrival order 0,1,3,2,4 must come out 0..=4 with no report
        let (mut seq, sink) = sequencer(16);
        let key = SessionKey::new("t1", "s1");
        let payload = Bytes::from_static(b"chunk");

        assert_eq!(seq.ingest(0, payload.clone(), &sink).unwrap(), 1);
        assert_eq!(seq.ingest(1, payload.clone(), &sink).unwrap(), 1);
        assert_eq!(seq.ingest(3, payload.clone(), &sink).unwrap(), 0);
        // 2 releases itself and the buffered 3
        assert_eq!(seq.ingest(2, payload.clone(), &sink).unwrap(), 2);
        assert_eq!(seq.ingest(4, payload, &sink).unwrap(), 1);

        assert_eq!(sink.stored_indices(&key), vec![0, 1, 2, 3, 4]);
        assert!(!seq.is_incomplete());
        assert_eq!(seq.pending_len(), 0);
    }

    #[test]
    fn test_gap_beyond_window() {
        // Arrival 0,1,5 with window 2: 5 can never be placed
        let (mut seq, sink) = sequencer(2);
        let key = SessionKey::new("t1", "s1");
        let payload = Bytes::from_static(b"chunk");

        seq.ingest(0, payload.clone(), &sink).unwrap();
        seq.ingest(1, payload.clone(), &sink).unwrap();

        let err = seq.ingest(5, payload, &sink).unwrap_err();
        assert!(matches!(
            err,
            ChunkError::OutOfWindow {
                index: 5,
                next_expected: 2,
                ..
            }
        ));

        assert_eq!(sink.stored_indices(&key), vec![0, 1]);
        assert!(seq.is_incomplete());

        let complete = seq.finalize(&sink);
        assert!(!complete);
        assert_eq!(sink.finalized(), vec![(key, false)]);
    }

    #[test]
    fn test_stale_duplicate_reported_without_data_loss() {
        let (mut seq, sink) = sequencer(16);
        let payload = Bytes::from_static(b"chunk");

        seq.ingest(0, payload.clone(), &sink).unwrap();
        seq.ingest(1, payload.clone(), &sink).unwrap();

        // 0 was already delivered; reported but nothing is missing
        assert!(seq.ingest(0, payload, &sink).is_err());
        assert!(!seq.is_incomplete());
    }

    #[test]
    fn test_duplicate_of_buffered_chunk() {
        let (mut seq, sink) = sequencer(16);
        let key = SessionKey::new("t1", "s1");

        seq.ingest(0, Bytes::from_static(b"a"), &sink).unwrap();
        seq.ingest(2, Bytes::from_static(b"first"), &sink).unwrap();
        assert!(seq.ingest(2, Bytes::from_static(b"second"), &sink).is_err());

        seq.ingest(1, Bytes::from_static(b"b"), &sink).unwrap();
        assert_eq!(sink.stored_indices(&key), vec![0, 1, 2]);
    }

    #[test]
    fn test_finalize_discards_unplayable_buffer() {
        let (mut seq, sink) = sequencer(16);
        let key = SessionKey::new("t1", "s1");

        seq.ingest(0, Bytes::from_static(b"a"), &sink).unwrap();
        seq.ingest(2, Bytes::from_static(b"c"), &sink).unwrap();

        let complete = seq.finalize(&sink);
        assert!(!complete);
        assert_eq!(sink.stored_indices(&key), vec![0]);
        assert_eq!(sink.finalized(), vec![(key, false)]);
    }

    #[test]
    fn test_finalize_idempotent() {
        let (mut seq, sink) = sequencer(16);
        let key = SessionKey::new("t1", "s1");

        seq.ingest(0, Bytes::from_static(b"a"), &sink).unwrap();

        assert!(seq.finalize(&sink));
        assert!(seq.finalize(&sink));
        assert_eq!(sink.finalized(), vec![(key, true)]);
    }

    #[test]
    fn test_ingest_after_finalize_rejected() {
        let (mut seq, sink) = sequencer(16);

        seq.finalize(&sink);
        let err = seq.ingest(0, Bytes::from_static(b"a"), &sink).unwrap_err();
        assert!(matches!(err, ChunkError::Finalized));
    }
}
