//! Chunk sequencing error types

/// Error type for chunk ingestion
#[derive(Debug, Clone)]
pub enum ChunkError {
    /// Chunk index is outside the reorder window (gap, duplicate, or stale)
    OutOfWindow {
        /// The rejected index
        index: u64,
        /// The index the sequencer is waiting for
        next_expected: u64,
        /// Reorder window span
        window: u64,
    },
    /// The recording was already finalized; no further chunks are accepted
    Finalized,
}

impl std::fmt::Display for ChunkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkError::OutOfWindow {
                index,
                next_expected,
                window,
            } => write!(
                f,
                "chunk {} outside reorder window (expecting {}, window {})",
                index, next_expected, window
            ),
            ChunkError::Finalized => write!(f, "recording already finalized"),
        }
    }
}

impl std::error::Error for ChunkError {}
