//! Authentication ceremony: signed assertion in, verified identity out.
//!
//! The signature counter is the only clone signal a relying party gets. A
//! counter that fails to advance means two devices may hold the same key, so
//! the ceremony is rejected without touching stored state.

use super::challenge::ChallengeTracker;
use super::check_client_data;
use crate::config::RelyingPartyConfig;
use crate::domain::{
    AuthenticationResponse, CeremonyError, CeremonyKind, CeremonyResult, CeremonySubject,
    Expectations, RepositoryError, RepositoryPtr, SessionToken,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// How to treat authenticators whose counter stays at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterPolicy {
    /// Stored and asserted both zero is accepted at lower assurance.
    #[default]
    AllowCounterless,
    /// Every assertion must strictly advance the counter.
    Strict,
}

impl FromStr for CounterPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow-counterless" => Ok(Self::AllowCounterless),
            "strict" => Ok(Self::Strict),
            other => anyhow::bail!(
                "Unknown counter policy '{other}' (expected allow-counterless or strict)"
            ),
        }
    }
}

/// Strength of the clone check that backed a successful assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assurance {
    /// The counter strictly advanced.
    Counted,
    /// The authenticator does not keep a counter; clones are undetectable.
    Counterless,
}

/// Apply the counter rule to a stored and asserted value.
pub fn check_counter(policy: CounterPolicy, stored: u32, asserted: u32) -> CeremonyResult<Assurance> {
    // ---
    if stored == 0 && asserted == 0 {
        return match policy {
            CounterPolicy::AllowCounterless => Ok(Assurance::Counterless),
            CounterPolicy::Strict => Err(CeremonyError::PossibleCloneDetected { stored, asserted }),
        };
    }
    if asserted > stored {
        Ok(Assurance::Counted)
    } else {
        Err(CeremonyError::PossibleCloneDetected { stored, asserted })
    }
}

/// Identity proven by a successful assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: Uuid,
    pub username: String,
    pub credential_id: Vec<u8>,
    pub new_counter: u32,
    pub assurance: Assurance,
}

pub struct AuthenticationCeremony {
    // ---
    tracker: Arc<ChallengeTracker>,
    repository: RepositoryPtr,
    verifier: crate::domain::VerifierPtr,
    relying_party: RelyingPartyConfig,
    policy: CounterPolicy,
}

impl AuthenticationCeremony {
    // ---
    pub fn new(
        tracker: Arc<ChallengeTracker>,
        repository: RepositoryPtr,
        verifier: crate::domain::VerifierPtr,
        relying_party: RelyingPartyConfig,
        policy: CounterPolicy,
    ) -> Self {
        // ---
        Self {
            tracker,
            repository,
            verifier,
            relying_party,
            policy,
        }
    }

    /// Complete an authentication started on `token`.
    ///
    /// # Flow
    /// 1. Consume the pending authentication (single use)
    /// 2. Resolve the credential and check it belongs to the pending user
    /// 3. Match challenge, origin and RP id
    /// 4. Verify the signature with the stored public key
    /// 5. Require the counter to advance (see [`CounterPolicy`])
    /// 6. Store the new counter, conditioned on the value read in step 2
    pub async fn finish(
        &self,
        token: &SessionToken,
        response: &AuthenticationResponse,
    ) -> CeremonyResult<VerifiedIdentity> {
        // ---
        let pending = self
            .tracker
            .consume(token, CeremonyKind::Authentication)
            .await?;

        let (user_id, username) = match pending.subject {
            CeremonySubject::Authentication { user_id, username } => (user_id, username),
            CeremonySubject::Registration { .. } => {
                return Err(CeremonyError::CeremonyKindMismatch {
                    expected: CeremonyKind::Authentication,
                    found: CeremonyKind::Registration,
                })
            }
        };

        let credential_hex = hex::encode(&response.credential_id);
        let stored = self
            .repository
            .find_credential_by_id(&response.credential_id)
            .await?
            .filter(|cred| cred.user_id == user_id)
            .ok_or_else(|| {
                //
                tracing::warn!(
                    "Credential {} is not enrolled for user '{}'",
                    credential_hex,
                    username
                );
                CeremonyError::UnknownCredential
            })?;

        check_client_data(&response.client_data, &pending.challenge, &self.relying_party)
            .inspect_err(|e| tracing::warn!("Authentication for '{}' rejected: {}", username, e))?;

        let expected = Expectations {
            challenge: &pending.challenge,
            origin: &self.relying_party.origin,
            rp_id: &self.relying_party.rp_id,
        };
        let asserted = self
            .verifier
            .verify_signature(response, &expected, &stored.public_key)
            .map_err(|e| {
                //
                tracing::warn!(
                    "Signature verification failed for user '{}': {}",
                    username,
                    e
                );
                CeremonyError::SignatureInvalid
            })?;

        let assurance = check_counter(self.policy, stored.counter, asserted).inspect_err(|_| {
            tracing::error!(
                "Possible cloned authenticator for user '{}' (credential {}): stored={}, asserted={}",
                username,
                credential_hex,
                stored.counter,
                asserted
            );
        })?;

        if assurance == Assurance::Counterless {
            tracing::warn!(
                "Credential {} for user '{}' does not keep a signature counter; lower assurance",
                credential_hex,
                username
            );
        }

        self.repository
            .update_counter(&stored.id, stored.counter, asserted)
            .await
            .map_err(|e| match e {
                RepositoryError::StaleCounter | RepositoryError::Conflict(_) => {
                    tracing::warn!(
                        "Counter for credential {} changed during authentication",
                        credential_hex
                    );
                    CeremonyError::PersistenceConflict(
                        "signature counter changed concurrently".to_string(),
                    )
                }
                RepositoryError::Backend(err) => {
                    tracing::error!("Failed to update credential counter: {:?}", err);
                    CeremonyError::Persistence(err)
                }
            })?;

        tracing::info!("User '{}' authenticated (counter {})", username, asserted);

        Ok(VerifiedIdentity {
            user_id,
            username,
            credential_id: stored.id,
            new_counter: asserted,
            assurance,
        })
    }
}
