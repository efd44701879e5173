//! Identity resolution
//!
//! Every transport connection must be resolved to a `(user, role)` pair
//! before the coordinator accepts any event from it. The actual auth flow
//! (tokens, cookies, whatever the gateway speaks) lives outside this crate;
//! the `IdentityProvider` trait is the seam it plugs into.

use std::collections::HashMap;

/// Role a connection holds for the duration of its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Produces the media stream for a session (the teacher)
    Broadcaster,
    /// Consumes a session's stream (a student)
    Viewer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Broadcaster => write!(f, "broadcaster"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

/// Resolved identity for a transport connection
#[derive(Debug, Clone)]
pub struct Identity {
    /// Authenticated user ID
    pub user_id: String,
    /// Role this user connects as
    pub role: Role,
}

impl Identity {
    /// Create a new identity
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

/// Error type for identity resolution
#[derive(Debug, Clone)]
pub enum AuthError {
    /// Credentials did not resolve to a known user
    InvalidCredentials,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid credentials"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Resolves transport-level credentials to an identity
///
/// Implemented by the gateway's auth collaborator. The coordinator never
/// sees raw credentials; it only accepts connections that carry an already
/// resolved [`Identity`].
pub trait IdentityProvider: Send + Sync {
    /// Authenticate a connection's credentials
    fn authenticate(&self, credentials: &str) -> Result<Identity, AuthError>;
}

/// Token-table identity provider for tests and demos
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for an identity
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn authenticate(&self, credentials: &str) -> Result<Identity, AuthError> {
        self.tokens
            .get(credentials)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_provider() {
        let provider = StaticIdentityProvider::new()
            .with_token("tok-1", Identity::new("teacher-1", Role::Broadcaster));

        let identity = provider.authenticate("tok-1").unwrap();
        assert_eq!(identity.user_id, "teacher-1");
        assert_eq!(identity.role, Role::Broadcaster);

        assert!(matches!(
            provider.authenticate("bogus"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
