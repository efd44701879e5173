//! Negotiation message kinds
//!
//! The three message kinds exchanged while a broadcaster and a viewer
//! establish their direct media path. Payloads are opaque to this crate.

/// Kind of negotiation message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Connection offer, sent by the broadcaster to one viewer
    Offer,
    /// Answer to an offer, sent by a viewer back to the broadcaster
    Answer,
    /// Network candidate, sent by either side
    Candidate,
}

impl SignalKind {
    /// Wire-friendly name
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Candidate => "candidate",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
