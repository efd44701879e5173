//! Ordered media-chunk ingestion for recording
//!
//! During a live session the broadcaster streams recorded chunks in
//! parallel with signaling. This module keeps them strictly ordered on the
//! way to the storage collaborator and is explicit about any loss.

pub mod error;
pub mod sequencer;
pub mod sink;

pub use error::ChunkError;
pub use sequencer::ChunkSequencer;
pub use sink::{MemorySink, StorageSink};
