//! Shared-secret digest verifier for development and tests.
//!
//! Not public-key cryptography. The "public key" is a secret the simulated
//! authenticator and the server share, and a signature is
//! `SHA1(public_key || authenticator_data || challenge || origin || rp_id)`,
//! with origin and RP id length-prefixed. Authenticator data starts with the
//! signature counter as four big-endian bytes.
//!
//! The attestation object is JSON:
//! `{"credential_id": b64, "public_key": b64, "challenge": b64, "origin": str, "rp_id": str}`.

use crate::codec;
use crate::domain::{
    AttestedCredential, AuthenticationResponse, CeremonyVerifier, ClientData, Expectations,
    RegistrationResponse, VerificationError,
};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Attestation object understood by [`DigestVerifier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestAttestation {
    pub credential_id: String,
    pub public_key: String,
    pub challenge: String,
    pub origin: String,
    pub rp_id: String,
}

/// Signature over the authenticator data and the client data it answers.
pub fn digest_signature(
    public_key: &[u8],
    authenticator_data: &[u8],
    client_data: &ClientData,
) -> Vec<u8> {
    // ---
    let mut hasher = Sha1::new();
    hasher.update(public_key);
    hasher.update(authenticator_data);
    hasher.update(&client_data.challenge);
    for field in [&client_data.origin, &client_data.rp_id] {
        hasher.update((field.len() as u32).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.finalize().to_vec()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DigestVerifier;

fn decode_field(value: &str, field: &str) -> Result<Vec<u8>, VerificationError> {
    codec::decode(value).map_err(|e| VerificationError(format!("{field}: {e}")))
}

fn check_scope(origin: &str, rp_id: &str, expected: &Expectations<'_>) -> Result<(), VerificationError> {
    // ---
    if origin != expected.origin {
        return Err(VerificationError("signed origin does not match".into()));
    }
    if rp_id != expected.rp_id {
        return Err(VerificationError("signed rp id does not match".into()));
    }
    Ok(())
}

impl CeremonyVerifier for DigestVerifier {
    // ---
    fn verify_attestation(
        &self,
        response: &RegistrationResponse,
        expected: &Expectations<'_>,
    ) -> Result<AttestedCredential, VerificationError> {
        // ---
        let attestation: DigestAttestation = serde_json::from_slice(&response.attestation_object)
            .map_err(|e| VerificationError(format!("unreadable attestation object: {e}")))?;

        let challenge = decode_field(&attestation.challenge, "challenge")?;
        if challenge != expected.challenge {
            return Err(VerificationError("attestation covers another challenge".into()));
        }
        check_scope(&attestation.origin, &attestation.rp_id, expected)?;
        check_scope(&response.client_data.origin, &response.client_data.rp_id, expected)?;

        let credential_id = decode_field(&attestation.credential_id, "credential_id")?;
        let public_key = decode_field(&attestation.public_key, "public_key")?;
        if credential_id.is_empty() || public_key.is_empty() {
            return Err(VerificationError("empty credential id or key".into()));
        }

        Ok(AttestedCredential {
            credential_id,
            public_key,
        })
    }

    fn verify_signature(
        &self,
        response: &AuthenticationResponse,
        expected: &Expectations<'_>,
        public_key: &[u8],
    ) -> Result<u32, VerificationError> {
        // ---
        let counter_bytes: [u8; 4] = response
            .authenticator_data
            .get(..4)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| VerificationError("authenticator data too short".into()))?;

        // Recompute over what the server expects, not what the client reports
        let signed = ClientData {
            challenge: expected.challenge.to_vec(),
            origin: expected.origin.to_string(),
            rp_id: expected.rp_id.to_string(),
        };
        check_scope(&response.client_data.origin, &response.client_data.rp_id, expected)?;

        let expected_signature = digest_signature(public_key, &response.authenticator_data, &signed);
        if expected_signature != response.signature {
            return Err(VerificationError("signature mismatch".into()));
        }

        Ok(u32::from_be_bytes(counter_bytes))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    const CHALLENGE: &[u8] = &[5; 32];

    fn expectations() -> Expectations<'static> {
        Expectations {
            challenge: CHALLENGE,
            origin: "http://localhost:8080",
            rp_id: "localhost",
        }
    }

    fn client_data() -> ClientData {
        ClientData {
            challenge: CHALLENGE.to_vec(),
            origin: "http://localhost:8080".into(),
            rp_id: "localhost".into(),
        }
    }

    fn registration(challenge: &[u8]) -> RegistrationResponse {
        let attestation = DigestAttestation {
            credential_id: codec::encode(b"cred-1"),
            public_key: codec::encode(b"secret-key"),
            challenge: codec::encode(challenge),
            origin: "http://localhost:8080".into(),
            rp_id: "localhost".into(),
        };
        RegistrationResponse {
            client_data: client_data(),
            attestation_object: serde_json::to_vec(&attestation).unwrap(),
            transports: vec![],
        }
    }

    fn assertion(counter: u32, key: &[u8]) -> AuthenticationResponse {
        assertion_signed_over(counter, key, &client_data())
    }

    fn assertion_signed_over(counter: u32, key: &[u8], signed: &ClientData) -> AuthenticationResponse {
        let authenticator_data = counter.to_be_bytes().to_vec();
        AuthenticationResponse {
            credential_id: b"cred-1".to_vec(),
            client_data: client_data(),
            signature: digest_signature(key, &authenticator_data, signed),
            authenticator_data,
            user_handle: None,
        }
    }

    #[test]
    fn attestation_yields_credential() {
        let attested = DigestVerifier
            .verify_attestation(&registration(CHALLENGE), &expectations())
            .unwrap();
        assert_eq!(attested.credential_id, b"cred-1");
        assert_eq!(attested.public_key, b"secret-key");
    }

    #[test]
    fn attestation_for_other_challenge_rejected() {
        assert!(DigestVerifier
            .verify_attestation(&registration(&[6; 32]), &expectations())
            .is_err());
    }

    #[test]
    fn garbage_attestation_rejected() {
        let mut response = registration(CHALLENGE);
        response.attestation_object = b"not json".to_vec();
        assert!(DigestVerifier
            .verify_attestation(&response, &expectations())
            .is_err());
    }

    #[test]
    fn signature_yields_counter() {
        let counter = DigestVerifier
            .verify_signature(&assertion(42, b"secret-key"), &expectations(), b"secret-key")
            .unwrap();
        assert_eq!(counter, 42);
    }

    #[test]
    fn signature_with_wrong_key_rejected() {
        assert!(DigestVerifier
            .verify_signature(&assertion(1, b"other-key"), &expectations(), b"secret-key")
            .is_err());
    }

    #[test]
    fn short_authenticator_data_rejected() {
        let mut response = assertion(1, b"secret-key");
        response.authenticator_data = vec![0, 1];
        assert!(DigestVerifier
            .verify_signature(&response, &expectations(), b"secret-key")
            .is_err());
    }

    #[test]
    fn signature_binds_origin() {
        // Signed for another origin, then relabelled with ours
        let mut signed = client_data();
        signed.origin = "https://evil.example".into();
        let response = assertion_signed_over(1, b"secret-key", &signed);
        assert_eq!(response.client_data.origin, "http://localhost:8080");

        assert!(DigestVerifier
            .verify_signature(&response, &expectations(), b"secret-key")
            .is_err());
    }

    #[test]
    fn signature_binds_rp_id() {
        let mut signed = client_data();
        signed.rp_id = "evil.example".into();
        let response = assertion_signed_over(1, b"secret-key", &signed);

        assert!(DigestVerifier
            .verify_signature(&response, &expectations(), b"secret-key")
            .is_err());
    }

    #[test]
    fn attestation_for_other_origin_rejected() {
        let mut response = registration(CHALLENGE);
        let mut attestation: DigestAttestation =
            serde_json::from_slice(&response.attestation_object).unwrap();
        attestation.origin = "https://evil.example".into();
        response.attestation_object = serde_json::to_vec(&attestation).unwrap();

        assert!(DigestVerifier
            .verify_attestation(&response, &expectations())
            .is_err());
    }
}
