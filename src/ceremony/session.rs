//! Session management for authenticated users.
//!
//! Binds a verified identity to the client's session token and answers
//! "who is this token?" until the session is terminated or outlives the
//! configured lifetime cap.

use crate::domain::{
    AuthenticatedSession, CeremonyResult, SessionIdentity, SessionStorePtr, SessionToken,
};
use chrono::Utc;
use std::time::Duration;
use uuid::Uuid;

pub struct SessionBinder {
    // ---
    store: SessionStorePtr,
    lifetime: Duration,
}

impl SessionBinder {
    // ---
    pub fn new(store: SessionStorePtr, lifetime: Duration) -> Self {
        Self { store, lifetime }
    }

    /// Bind `user_id`/`username` to `token`, replacing any earlier session on it.
    pub async fn establish(
        &self,
        token: &SessionToken,
        user_id: Uuid,
        username: &str,
    ) -> CeremonyResult<AuthenticatedSession> {
        // ---
        let session = AuthenticatedSession {
            user_id,
            username: username.to_string(),
            established_at: Utc::now(),
        };

        self.store.put_session(token, &session, self.lifetime).await?;

        tracing::info!("Created session for user: {}", username);

        Ok(session)
    }

    /// Drop session state and any half-finished ceremony on `token`.
    ///
    /// Returns `true` when a session was bound, in which case the transport
    /// should invalidate the client's copy of the token.
    pub async fn terminate(&self, token: &SessionToken) -> CeremonyResult<bool> {
        // ---
        self.store.remove_pending(token).await?;
        let existed = self.store.remove_session(token).await?;

        if existed {
            tracing::info!("Session terminated");
        }

        Ok(existed)
    }

    /// Identity bound to `token`, if any and not past the lifetime cap.
    pub async fn current_identity(
        &self,
        token: &SessionToken,
    ) -> CeremonyResult<Option<SessionIdentity>> {
        // ---
        let Some(session) = self.store.get_session(token).await? else {
            return Ok(None);
        };

        let age = Utc::now().signed_duration_since(session.established_at);
        let expired = match age.to_std() {
            Ok(age) => age >= self.lifetime,
            // established in the future: clock skew, treat as fresh
            Err(_) => false,
        };

        if expired {
            tracing::debug!("Session for '{}' exceeded lifetime cap", session.username);
            return Ok(None);
        }

        Ok(Some(SessionIdentity {
            user_id: session.user_id,
            username: session.username,
        }))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::domain::{CeremonySubject, PendingCeremony, SessionStore};
    use crate::infrastructure::MemorySessionStore;
    use std::sync::Arc;

    fn binder(lifetime: Duration) -> (SessionBinder, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        (SessionBinder::new(store.clone(), lifetime), store)
    }

    #[tokio::test]
    async fn establish_then_read_identity() {
        // ---
        let (binder, _) = binder(Duration::from_secs(60));
        let token = SessionToken::generate();
        let user_id = Uuid::new_v4();

        let session = binder.establish(&token, user_id, "alice").await.unwrap();
        assert_eq!(session.username, "alice");

        let identity = binder.current_identity(&token).await.unwrap().unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.username, "alice");
    }

    #[tokio::test]
    async fn unknown_token_has_no_identity() {
        // ---
        let (binder, _) = binder(Duration::from_secs(60));
        assert!(binder
            .current_identity(&SessionToken::generate())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn establish_overwrites_previous_session() {
        // ---
        let (binder, _) = binder(Duration::from_secs(60));
        let token = SessionToken::generate();
        binder.establish(&token, Uuid::new_v4(), "alice").await.unwrap();
        let bob = Uuid::new_v4();
        binder.establish(&token, bob, "bob").await.unwrap();

        let identity = binder.current_identity(&token).await.unwrap().unwrap();
        assert_eq!(identity.user_id, bob);
    }

    #[tokio::test]
    async fn terminate_removes_session_and_pending_ceremony() {
        // ---
        let (binder, store) = binder(Duration::from_secs(60));
        let token = SessionToken::generate();
        binder.establish(&token, Uuid::new_v4(), "alice").await.unwrap();
        store
            .put_pending(
                &token,
                &PendingCeremony {
                    challenge: vec![1; 16],
                    subject: CeremonySubject::Registration {
                        user_id: Uuid::new_v4(),
                        username: "carol".into(),
                    },
                    expires_at: Utc::now() + chrono::Duration::seconds(60),
                },
            )
            .await
            .unwrap();

        assert!(binder.terminate(&token).await.unwrap());
        assert!(binder.current_identity(&token).await.unwrap().is_none());
        assert!(store.take_pending(&token).await.unwrap().is_none());

        // second logout has nothing left to remove
        assert!(!binder.terminate(&token).await.unwrap());
    }

    #[tokio::test]
    async fn session_past_lifetime_is_ignored() {
        // ---
        let (binder, _) = binder(Duration::from_millis(20));
        let token = SessionToken::generate();
        binder.establish(&token, Uuid::new_v4(), "alice").await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(binder.current_identity(&token).await.unwrap().is_none());
    }
}
