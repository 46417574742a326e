//! Registration ceremony: attested response in, user and credential out.

use super::challenge::ChallengeTracker;
use super::check_client_data;
use crate::config::RelyingPartyConfig;
use crate::domain::{
    CeremonyError, CeremonyKind, CeremonyResult, CeremonySubject, Credential, Expectations,
    RegistrationResponse, RepositoryError, RepositoryPtr, SessionToken, User, VerifierPtr,
};
use std::sync::Arc;

pub struct RegistrationCeremony {
    // ---
    tracker: Arc<ChallengeTracker>,
    repository: RepositoryPtr,
    verifier: VerifierPtr,
    relying_party: RelyingPartyConfig,
}

impl RegistrationCeremony {
    // ---
    pub fn new(
        tracker: Arc<ChallengeTracker>,
        repository: RepositoryPtr,
        verifier: VerifierPtr,
        relying_party: RelyingPartyConfig,
    ) -> Self {
        // ---
        Self {
            tracker,
            repository,
            verifier,
            relying_party,
        }
    }

    /// Complete a registration started on `token`.
    ///
    /// # Flow
    /// 1. Consume the pending registration (single use)
    /// 2. Match challenge, origin and RP id
    /// 3. Verify the attestation and extract the key material
    /// 4. Create the user and its first credential in one atomic write
    ///
    /// No session is established; the new user must authenticate.
    pub async fn finish(
        &self,
        token: &SessionToken,
        response: &RegistrationResponse,
    ) -> CeremonyResult<Credential> {
        // ---
        let pending = self
            .tracker
            .consume(token, CeremonyKind::Registration)
            .await?;

        let (user_id, username) = match pending.subject {
            CeremonySubject::Registration { user_id, username } => (user_id, username),
            CeremonySubject::Authentication { .. } => {
                return Err(CeremonyError::CeremonyKindMismatch {
                    expected: CeremonyKind::Registration,
                    found: CeremonyKind::Authentication,
                })
            }
        };

        check_client_data(&response.client_data, &pending.challenge, &self.relying_party)
            .inspect_err(|e| tracing::warn!("Registration for '{}' rejected: {}", username, e))?;

        let expected = Expectations {
            challenge: &pending.challenge,
            origin: &self.relying_party.origin,
            rp_id: &self.relying_party.rp_id,
        };
        let attested = self
            .verifier
            .verify_attestation(response, &expected)
            .map_err(|e| {
                //
                tracing::warn!("Attestation verification failed for '{}': {}", username, e);
                CeremonyError::AttestationInvalid
            })?;

        let user = User::new(user_id, username);
        let credential = Credential::new(
            attested.credential_id,
            user.id,
            attested.public_key,
            response.transports.clone(),
        );

        self.repository
            .create_user_and_credential(&user, &credential)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(detail) => {
                    tracing::warn!("Registration conflict for '{}': {}", user.username, detail);
                    CeremonyError::PersistenceConflict(detail)
                }
                RepositoryError::StaleCounter => {
                    CeremonyError::PersistenceConflict("stale counter on create".to_string())
                }
                RepositoryError::Backend(err) => {
                    tracing::error!("Failed to persist registration: {:?}", err);
                    CeremonyError::Persistence(err)
                }
            })?;

        tracing::info!(
            "Registration completed for user: {} (credential: {})",
            user.username,
            hex::encode(&credential.id)
        );

        Ok(credential)
    }
}
