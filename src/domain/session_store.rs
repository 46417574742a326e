use super::models::{AuthenticatedSession, PendingCeremony, SessionToken};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Token-scoped state kept on behalf of a client between requests.
///
/// Holds at most one pending ceremony and at most one authenticated session
/// per token.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    // ---
    /// Store a pending ceremony, replacing any previous one for the token.
    async fn put_pending(&self, token: &SessionToken, pending: &PendingCeremony) -> Result<()>;

    /// Remove and return the pending ceremony in one step.
    ///
    /// Of two concurrent calls for the same token at most one gets `Some`.
    async fn take_pending(&self, token: &SessionToken) -> Result<Option<PendingCeremony>>;

    /// Drop the pending ceremony without reading it.
    async fn remove_pending(&self, token: &SessionToken) -> Result<()>;

    /// Bind session state to the token. `ttl` bounds how long the backend keeps it.
    async fn put_session(
        &self,
        token: &SessionToken,
        session: &AuthenticatedSession,
        ttl: Duration,
    ) -> Result<()>;

    async fn get_session(&self, token: &SessionToken) -> Result<Option<AuthenticatedSession>>;

    /// Remove session state. Returns whether anything was bound.
    async fn remove_session(&self, token: &SessionToken) -> Result<bool>;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Type alias for any backend that implements SessionStore.
pub type SessionStorePtr = Arc<dyn SessionStore>;
