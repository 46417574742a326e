//! In-memory storage for pending ceremonies and sessions.
//!
//! Entries are short-lived and keyed by session token. Expired entries are
//! never handed out as valid; `sweep_expired` reclaims them.

use crate::domain::{AuthenticatedSession, PendingCeremony, SessionStore, SessionToken};
use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

struct SessionEntry {
    session: AuthenticatedSession,
    evict_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemorySessionStore {
    /// Pending ceremonies (token -> ceremony)
    pending: DashMap<SessionToken, PendingCeremony>,
    /// Authenticated sessions (token -> session)
    sessions: DashMap<SessionToken, SessionEntry>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove pending ceremonies and sessions that can no longer be used.
    pub fn sweep_expired(&self) {
        // ---
        let now = Utc::now();
        self.pending.retain(|_, pending| !pending.is_expired_at(now));
        self.sessions.retain(|_, entry| entry.evict_at > now);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("pending", &self.pending.len())
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    // ---
    async fn put_pending(&self, token: &SessionToken, pending: &PendingCeremony) -> Result<()> {
        self.pending.insert(token.clone(), pending.clone());
        Ok(())
    }

    async fn take_pending(&self, token: &SessionToken) -> Result<Option<PendingCeremony>> {
        Ok(self.pending.remove(token).map(|(_, pending)| pending))
    }

    async fn remove_pending(&self, token: &SessionToken) -> Result<()> {
        self.pending.remove(token);
        Ok(())
    }

    async fn put_session(
        &self,
        token: &SessionToken,
        session: &AuthenticatedSession,
        ttl: Duration,
    ) -> Result<()> {
        // ---
        let evict_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| anyhow::anyhow!("session ttl out of range"))?;
        self.sessions.insert(
            token.clone(),
            SessionEntry {
                session: session.clone(),
                evict_at,
            },
        );
        Ok(())
    }

    async fn get_session(&self, token: &SessionToken) -> Result<Option<AuthenticatedSession>> {
        // ---
        let now = Utc::now();
        match self.sessions.get(token) {
            Some(entry) if entry.evict_at > now => return Ok(Some(entry.session.clone())),
            Some(_) => {}
            None => return Ok(None),
        }
        // Read guard must be released before removing from the same shard.
        self.sessions
            .remove_if(token, |_, entry| entry.evict_at <= now);
        Ok(None)
    }

    async fn remove_session(&self, token: &SessionToken) -> Result<bool> {
        Ok(self.sessions.remove(token).is_some())
    }
}
