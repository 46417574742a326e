//! Single-use challenge issuance and consumption.
//!
//! A challenge lives in the session store under the client's token together
//! with the subject it was issued for. Consuming it removes it whatever the
//! outcome, so a ceremony can never be finished twice.

use crate::config::{CeremonyConfig, MIN_CHALLENGE_BYTES};
use crate::domain::{
    CeremonyError, CeremonyKind, CeremonyResult, CeremonySubject, PendingCeremony, RepositoryPtr,
    SessionStorePtr, SessionToken, Transport,
};
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

/// Issued registration challenge plus the candidate user handle.
#[derive(Debug, Clone)]
pub struct RegistrationChallenge {
    pub challenge: Vec<u8>,
    pub user_id: Uuid,
    pub username: String,
}

/// A credential the authenticator may answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedCredential {
    pub id: Vec<u8>,
    pub transports: Vec<Transport>,
}

/// Issued authentication challenge plus the allow-list.
#[derive(Debug, Clone)]
pub struct AuthenticationChallenge {
    pub challenge: Vec<u8>,
    pub user_id: Uuid,
    pub allowed: Vec<AllowedCredential>,
}

pub struct ChallengeTracker {
    // ---
    repository: RepositoryPtr,
    sessions: SessionStorePtr,
    config: CeremonyConfig,
}

impl ChallengeTracker {
    // ---
    pub fn new(repository: RepositoryPtr, sessions: SessionStorePtr, config: CeremonyConfig) -> Self {
        // ---
        Self {
            repository,
            sessions,
            config,
        }
    }

    pub fn config(&self) -> &CeremonyConfig {
        &self.config
    }

    /// Normalize a username according to policy. Blank names are rejected.
    pub fn normalize_username(&self, raw: &str) -> CeremonyResult<String> {
        // ---
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CeremonyError::MissingUsername);
        }
        if self.config.fold_username_case {
            Ok(trimmed.to_lowercase())
        } else {
            Ok(trimmed.to_string())
        }
    }

    /// Issue a registration challenge for a username nobody holds yet.
    pub async fn begin_registration(
        &self,
        token: &SessionToken,
        username: &str,
    ) -> CeremonyResult<RegistrationChallenge> {
        // ---
        let username = self.normalize_username(username)?;

        if self
            .repository
            .find_user_by_username(&username)
            .await?
            .is_some()
        {
            tracing::warn!("Registration requested for taken username: {}", username);
            return Err(CeremonyError::UsernameTaken);
        }

        let user_id = Uuid::new_v4();
        let challenge = self.mint_challenge();

        self.store(
            token,
            challenge.clone(),
            CeremonySubject::Registration {
                user_id,
                username: username.clone(),
            },
        )
        .await?;

        tracing::info!("Registration challenge issued for: {}", username);

        Ok(RegistrationChallenge {
            challenge,
            user_id,
            username,
        })
    }

    /// Issue an authentication challenge scoped to the user's credentials.
    pub async fn begin_authentication(
        &self,
        token: &SessionToken,
        username: &str,
    ) -> CeremonyResult<AuthenticationChallenge> {
        // ---
        let username = self.normalize_username(username)?;

        let user = self
            .repository
            .find_user_by_username(&username)
            .await?
            .ok_or_else(|| {
                //
                tracing::warn!("Authentication attempt for non-existent user: {}", username);
                CeremonyError::UnknownUser
            })?;

        let credentials = self.repository.find_credentials_by_owner(user.id).await?;
        if credentials.is_empty() {
            tracing::warn!("User '{}' has no registered credentials", username);
            return Err(CeremonyError::NoCredentialsEnrolled);
        }

        let allowed = credentials
            .into_iter()
            .map(|cred| AllowedCredential {
                id: cred.id,
                transports: cred.transports,
            })
            .collect();

        let challenge = self.mint_challenge();
        self.store(
            token,
            challenge.clone(),
            CeremonySubject::Authentication {
                user_id: user.id,
                username: user.username.clone(),
            },
        )
        .await?;

        tracing::info!("Authentication challenge issued for: {}", user.username);

        Ok(AuthenticationChallenge {
            challenge,
            user_id: user.id,
            allowed,
        })
    }

    /// Take the pending ceremony for `token`.
    ///
    /// The entry is removed before it is inspected, so expired or mismatched
    /// ceremonies are discarded as well.
    pub async fn consume(
        &self,
        token: &SessionToken,
        expected: CeremonyKind,
    ) -> CeremonyResult<PendingCeremony> {
        // ---
        let pending = self
            .sessions
            .take_pending(token)
            .await?
            .ok_or(CeremonyError::NoPendingCeremony)?;

        if pending.is_expired_at(Utc::now()) {
            tracing::warn!(
                "Expired {} ceremony presented for: {}",
                pending.kind(),
                pending.subject.username()
            );
            return Err(CeremonyError::CeremonyExpired);
        }

        if pending.kind() != expected {
            tracing::warn!(
                "Ceremony kind mismatch: expected {}, found {}",
                expected,
                pending.kind()
            );
            return Err(CeremonyError::CeremonyKindMismatch {
                expected,
                found: pending.kind(),
            });
        }

        Ok(pending)
    }

    fn mint_challenge(&self) -> Vec<u8> {
        // ---
        let len = self.config.challenge_bytes.max(MIN_CHALLENGE_BYTES);
        let mut challenge = vec![0u8; len];
        OsRng.fill_bytes(&mut challenge);
        challenge
    }

    async fn store(
        &self,
        token: &SessionToken,
        challenge: Vec<u8>,
        subject: CeremonySubject,
    ) -> CeremonyResult<()> {
        // ---
        let expires_at = chrono::Duration::from_std(self.config.timeout)
            .ok()
            .and_then(|timeout| Utc::now().checked_add_signed(timeout))
            .ok_or_else(|| anyhow::anyhow!("ceremony timeout out of range"))?;

        let pending = PendingCeremony {
            challenge,
            subject,
            expires_at,
        };

        self.sessions.put_pending(token, &pending).await?;
        Ok(())
    }
}
