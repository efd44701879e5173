//! Session store and per-session state
//!
//! A session is a livestream's signaling scope, keyed by
//! `(teacher_id, stream_id)`. The store maps keys to entries; each entry
//! owns the broadcaster binding, the viewer set, and the recording
//! sequencer behind its own lock.

pub mod entry;
pub mod error;
pub mod key;
pub mod store;

pub use entry::{SessionEntry, SessionSnapshot, SessionState};
pub use error::SessionError;
pub use key::SessionKey;
pub use store::SessionStore;
