//! The produced surface of the engine.
//!
//! `CeremonyService` wires the challenge tracker, both ceremonies and the
//! session binder together and exposes the six operations a transport layer
//! calls. It also records metrics for every outcome.

use super::authentication::{AuthenticationCeremony, VerifiedIdentity};
use super::challenge::ChallengeTracker;
use super::registration::RegistrationCeremony;
use super::session::SessionBinder;
use super::wire::{AuthenticationOptions, RegistrationOptions};
use crate::config::{CeremonyConfig, RelyingPartyConfig, SessionConfig};
use crate::domain::{
    AuthenticatedSession, AuthenticationResponse, CeremonyKind, CeremonyResult, Credential,
    MetricsPtr, RegistrationResponse, RepositoryPtr, SessionIdentity, SessionStorePtr,
    SessionToken, VerifierPtr,
};
use std::sync::Arc;

/// Outcome of a successful authentication: the verified identity and the session it opened.
#[derive(Debug, Clone)]
pub struct AuthenticationOutcome {
    pub identity: VerifiedIdentity,
    pub session: AuthenticatedSession,
}

/// Collaborators the service is built from.
#[derive(Clone)]
pub struct ServiceDeps {
    pub repository: RepositoryPtr,
    pub sessions: SessionStorePtr,
    pub verifier: VerifierPtr,
    pub metrics: MetricsPtr,
}

pub struct CeremonyService {
    // ---
    tracker: Arc<ChallengeTracker>,
    registration: RegistrationCeremony,
    authentication: AuthenticationCeremony,
    binder: SessionBinder,
    relying_party: RelyingPartyConfig,
    sessions: SessionStorePtr,
    metrics: MetricsPtr,
}

impl CeremonyService {
    // ---
    pub fn new(
        deps: ServiceDeps,
        relying_party: RelyingPartyConfig,
        ceremony: CeremonyConfig,
        session: SessionConfig,
    ) -> Self {
        // ---
        let policy = ceremony.counter_policy;
        let tracker = Arc::new(ChallengeTracker::new(
            deps.repository.clone(),
            deps.sessions.clone(),
            ceremony,
        ));

        let registration = RegistrationCeremony::new(
            tracker.clone(),
            deps.repository.clone(),
            deps.verifier.clone(),
            relying_party.clone(),
        );
        let authentication = AuthenticationCeremony::new(
            tracker.clone(),
            deps.repository,
            deps.verifier,
            relying_party.clone(),
            policy,
        );
        let binder = SessionBinder::new(deps.sessions.clone(), session.lifetime);

        Self {
            tracker,
            registration,
            authentication,
            binder,
            relying_party,
            sessions: deps.sessions,
            metrics: deps.metrics,
        }
    }

    pub fn relying_party(&self) -> &RelyingPartyConfig {
        &self.relying_party
    }

    pub fn metrics(&self) -> &MetricsPtr {
        &self.metrics
    }

    /// Check the token-state backend is reachable.
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.sessions.ping().await
    }

    /// Issue registration options for a new username.
    pub async fn begin_registration(
        &self,
        token: &SessionToken,
        username: &str,
    ) -> CeremonyResult<RegistrationOptions> {
        // ---
        let issued = self
            .observe(
                CeremonyKind::Registration,
                self.tracker.begin_registration(token, username).await,
            )?;
        self.metrics.record_ceremony_started(CeremonyKind::Registration);

        Ok(RegistrationOptions::new(
            &issued,
            &self.relying_party,
            self.tracker.config().timeout,
        ))
    }

    /// Verify an attested response and enroll the user.
    pub async fn finish_registration(
        &self,
        token: &SessionToken,
        response: &RegistrationResponse,
    ) -> CeremonyResult<Credential> {
        // ---
        let credential = self.observe(
            CeremonyKind::Registration,
            self.registration.finish(token, response).await,
        )?;
        self.metrics.record_ceremony_completed(CeremonyKind::Registration);
        Ok(credential)
    }

    /// Issue authentication options for an enrolled username.
    pub async fn begin_authentication(
        &self,
        token: &SessionToken,
        username: &str,
    ) -> CeremonyResult<AuthenticationOptions> {
        // ---
        let issued = self.observe(
            CeremonyKind::Authentication,
            self.tracker.begin_authentication(token, username).await,
        )?;
        self.metrics.record_ceremony_started(CeremonyKind::Authentication);

        Ok(AuthenticationOptions::new(
            &issued,
            &self.relying_party,
            self.tracker.config().timeout,
        ))
    }

    /// Verify a signed assertion and bind the identity to `token`.
    pub async fn finish_authentication(
        &self,
        token: &SessionToken,
        response: &AuthenticationResponse,
    ) -> CeremonyResult<AuthenticationOutcome> {
        // ---
        let identity = self.observe(
            CeremonyKind::Authentication,
            self.authentication.finish(token, response).await,
        )?;

        let session = self.observe(
            CeremonyKind::Authentication,
            self.binder
                .establish(token, identity.user_id, &identity.username)
                .await,
        )?;
        self.metrics.record_ceremony_completed(CeremonyKind::Authentication);

        Ok(AuthenticationOutcome { identity, session })
    }

    pub async fn current_identity(
        &self,
        token: &SessionToken,
    ) -> CeremonyResult<Option<SessionIdentity>> {
        self.binder.current_identity(token).await
    }

    pub async fn terminate(&self, token: &SessionToken) -> CeremonyResult<bool> {
        self.binder.terminate(token).await
    }

    fn observe<T>(&self, kind: CeremonyKind, result: CeremonyResult<T>) -> CeremonyResult<T> {
        // ---
        if let Err(err) = &result {
            self.metrics.record_ceremony_rejected(kind, err.category());
        }
        result
    }
}
