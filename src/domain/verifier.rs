//! Abstract attestation and assertion verification.
//!
//! The engine checks challenge, origin and RP id itself and then hands the
//! response to a [`CeremonyVerifier`] for the cryptographic part. Any
//! signature scheme can sit behind this trait.

use super::models::Transport;
use std::sync::Arc;
use thiserror::Error;

/// Client-side data the authenticator signed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientData {
    pub challenge: Vec<u8>,
    pub origin: String,
    pub rp_id: String,
}

/// Decoded response to a registration ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationResponse {
    pub client_data: ClientData,
    pub attestation_object: Vec<u8>,
    pub transports: Vec<Transport>,
}

/// Decoded response to an authentication ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResponse {
    pub credential_id: Vec<u8>,
    pub client_data: ClientData,
    pub authenticator_data: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

/// What a response must have been produced for.
#[derive(Debug, Clone, Copy)]
pub struct Expectations<'a> {
    pub challenge: &'a [u8],
    pub origin: &'a str,
    pub rp_id: &'a str,
}

/// Key material established by a verified attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredential {
    pub credential_id: Vec<u8>,
    pub public_key: Vec<u8>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("verification failed: {0}")]
pub struct VerificationError(pub String);

pub trait CeremonyVerifier: Send + Sync {
    /// Check that the attestation is well formed and covers the expected challenge.
    fn verify_attestation(
        &self,
        response: &RegistrationResponse,
        expected: &Expectations<'_>,
    ) -> Result<AttestedCredential, VerificationError>;

    /// Check the assertion signature with `public_key` and return the counter it asserts.
    fn verify_signature(
        &self,
        response: &AuthenticationResponse,
        expected: &Expectations<'_>,
        public_key: &[u8],
    ) -> Result<u32, VerificationError>;
}

pub type VerifierPtr = Arc<dyn CeremonyVerifier>;
