//! Redis-backed token state.
//!
//! Pending ceremonies live at `ceremony:pending:{token}` with a TTL equal to
//! their remaining lifetime and are taken with `GETDEL`, which makes the
//! take atomic across server instances. Sessions live at `session:{token}`
//! for the session lifetime.

use crate::domain::{AuthenticatedSession, PendingCeremony, SessionStore, SessionToken};
use anyhow::{Context, Result};
use chrono::Utc;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::time::Duration;

pub struct RedisSessionStore {
    // ---
    client: Client,
}

/// Create a Redis-backed store. Connections are opened per operation.
pub fn create_redis_session_store(url: &str) -> Result<RedisSessionStore> {
    // ---
    let client = Client::open(url).context("invalid Redis URL")?;
    Ok(RedisSessionStore { client })
}

fn pending_key(token: &SessionToken) -> String {
    format!("ceremony:pending:{token}")
}

fn session_key(token: &SessionToken) -> String {
    format!("session:{token}")
}

impl RedisSessionStore {
    // ---
    async fn conn(&self) -> Result<MultiplexedConnection> {
        // ---
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|err| {
                tracing::error!("Failed to connect to Redis: {:?}", err);
                anyhow::anyhow!("Redis connection failed: {err}")
            })
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    // ---
    async fn put_pending(&self, token: &SessionToken, pending: &PendingCeremony) -> Result<()> {
        // ---
        let payload = serde_json::to_string(pending)?;
        let ttl_ms = (pending.expires_at - Utc::now()).num_milliseconds().max(1) as u64;

        let mut conn = self.conn().await?;
        conn.pset_ex::<_, _, ()>(pending_key(token), payload, ttl_ms)
            .await
            .context("Failed to store pending ceremony in Redis")?;

        Ok(())
    }

    async fn take_pending(&self, token: &SessionToken) -> Result<Option<PendingCeremony>> {
        // ---
        let mut conn = self.conn().await?;

        // A challenge must be consumed, not fetched then deleted later
        let payload: Option<String> = conn
            .get_del(pending_key(token))
            .await
            .context("Failed to take pending ceremony from Redis")?;

        payload
            .map(|json| serde_json::from_str(&json).context("Corrupt pending ceremony payload"))
            .transpose()
    }

    async fn remove_pending(&self, token: &SessionToken) -> Result<()> {
        // ---
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(pending_key(token)).await?;
        Ok(())
    }

    async fn put_session(
        &self,
        token: &SessionToken,
        session: &AuthenticatedSession,
        ttl: Duration,
    ) -> Result<()> {
        // ---
        let payload = serde_json::to_string(session)?;
        let mut conn = self.conn().await?;
        conn.set_ex::<_, _, ()>(session_key(token), payload, ttl.as_secs().max(1))
            .await
            .context("Failed to store session in Redis")?;
        Ok(())
    }

    async fn get_session(&self, token: &SessionToken) -> Result<Option<AuthenticatedSession>> {
        // ---
        let mut conn = self.conn().await?;
        let payload: Option<String> = conn.get(session_key(token)).await?;

        payload
            .map(|json| serde_json::from_str(&json).context("Corrupt session payload"))
            .transpose()
    }

    async fn remove_session(&self, token: &SessionToken) -> Result<bool> {
        // ---
        let mut conn = self.conn().await?;
        let removed: u64 = conn.del(session_key(token)).await?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<()> {
        // ---
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::domain::CeremonySubject;
    use uuid::Uuid;

    fn store() -> RedisSessionStore {
        let url = std::env::var("PASSKEY_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        create_redis_session_store(&url).expect("valid redis url")
    }

    #[test]
    fn keys_are_namespaced_by_token() {
        let token = SessionToken::from("abc");
        assert_eq!(pending_key(&token), "ceremony:pending:abc");
        assert_eq!(session_key(&token), "session:abc");
    }

    #[test]
    fn invalid_url_rejected() {
        assert!(create_redis_session_store("not-a-redis-url").is_err());
    }

    #[tokio::test]
    #[ignore = "requires redis"]
    async fn pending_round_trip_is_single_use() {
        // ---
        let store = store();
        let token = SessionToken::generate();
        let pending = PendingCeremony {
            challenge: vec![7; 32],
            subject: CeremonySubject::Registration {
                user_id: Uuid::new_v4(),
                username: "bob".into(),
            },
            expires_at: Utc::now() + chrono::Duration::seconds(60),
        };

        store.put_pending(&token, &pending).await.unwrap();
        assert_eq!(store.take_pending(&token).await.unwrap(), Some(pending));
        assert_eq!(store.take_pending(&token).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires redis"]
    async fn session_round_trip() {
        // ---
        let store = store();
        let token = SessionToken::generate();
        let session = AuthenticatedSession {
            user_id: Uuid::new_v4(),
            username: "alice".into(),
            established_at: Utc::now(),
        };

        store
            .put_session(&token, &session, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get_session(&token).await.unwrap(), Some(session));
        assert!(store.remove_session(&token).await.unwrap());
        assert_eq!(store.get_session(&token).await.unwrap(), None);
    }
}
