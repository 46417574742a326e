// Gateway module - ceremony engine
// Sub-modules are private, only exported symbols are public

mod authentication;
mod challenge;
mod registration;
mod service;
mod session;
mod wire;

use crate::config::RelyingPartyConfig;
use crate::domain::{CeremonyError, CeremonyResult, ClientData};

pub use authentication::{
    check_counter, Assurance, AuthenticationCeremony, CounterPolicy, VerifiedIdentity,
};
pub use challenge::{
    AllowedCredential, AuthenticationChallenge, ChallengeTracker, RegistrationChallenge,
};
pub use registration::RegistrationCeremony;
pub use service::{AuthenticationOutcome, CeremonyService, ServiceDeps};
pub use session::SessionBinder;
pub use wire::{
    AuthenticationOptions, AuthenticationResponseJson, ClientDataJson, CredentialDescriptor,
    RegistrationOptions, RegistrationResponseJson,
};

/// Match what the client signed over against the pending ceremony and this
/// relying party. The challenge comparison is byte-for-byte.
fn check_client_data(
    client_data: &ClientData,
    challenge: &[u8],
    rp: &RelyingPartyConfig,
) -> CeremonyResult<()> {
    // ---
    if client_data.challenge != challenge {
        return Err(CeremonyError::ChallengeMismatch);
    }
    if client_data.origin != rp.origin {
        return Err(CeremonyError::OriginMismatch);
    }
    if client_data.rp_id != rp.rp_id {
        return Err(CeremonyError::RpIdMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rp() -> RelyingPartyConfig {
        RelyingPartyConfig::new("localhost", "Test App", "http://localhost:8080").unwrap()
    }

    fn client_data(challenge: &[u8]) -> ClientData {
        ClientData {
            challenge: challenge.to_vec(),
            origin: "http://localhost:8080".to_string(),
            rp_id: "localhost".to_string(),
        }
    }

    #[test]
    fn matching_client_data_passes() {
        assert!(check_client_data(&client_data(&[1, 2, 3]), &[1, 2, 3], &rp()).is_ok());
    }

    #[test]
    fn challenge_must_match_exactly() {
        let err = check_client_data(&client_data(&[1, 2, 3]), &[1, 2, 3, 0], &rp()).unwrap_err();
        assert!(matches!(err, CeremonyError::ChallengeMismatch));
    }

    #[test]
    fn origin_and_rp_id_are_checked() {
        let mut data = client_data(&[9]);
        data.origin = "http://localhost:9090".to_string();
        assert!(matches!(
            check_client_data(&data, &[9], &rp()).unwrap_err(),
            CeremonyError::OriginMismatch
        ));

        let mut data = client_data(&[9]);
        data.rp_id = "example.com".to_string();
        assert!(matches!(
            check_client_data(&data, &[9], &rp()).unwrap_err(),
            CeremonyError::RpIdMismatch
        ));
    }
}
