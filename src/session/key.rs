//! Session key type
//!
//! A livestream's signaling scope is identified by the pair of the
//! broadcasting teacher's ID and the stream ID.

/// Unique identifier for a session (teacher + stream)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// ID of the teacher who owns the stream
    pub teacher_id: String,
    /// Stream identifier (e.g., a lesson or room ID)
    pub stream_id: String,
}

impl SessionKey {
    /// Create a new session key
    pub fn new(teacher_id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            stream_id: stream_id.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.teacher_id, self.stream_id)
    }
}
