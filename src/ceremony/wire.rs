//! Wire shapes exchanged with the browser.
//!
//! Everything here is plain serde data with byte strings carried as
//! URL-safe base64. Conversion to and from domain types goes through the
//! [`codec`](crate::codec) so the ceremonies themselves only see bytes.

use super::challenge::{AuthenticationChallenge, RegistrationChallenge};
use crate::codec;
use crate::config::RelyingPartyConfig;
use crate::domain::{
    AuthenticationResponse, CeremonyError, ClientData, RegistrationResponse, Transport,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// COSE algorithm identifiers offered at registration: ES256 and RS256.
const SUPPORTED_ALGORITHMS: [i64; 2] = [-7, -257];

// ============================================================================
// Outgoing options
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelyingPartyEntity {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// User handle: the candidate user id's 16 bytes.
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialParameter {
    #[serde(rename = "type")]
    pub kind: String,
    pub alg: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatorSelection {
    pub resident_key: String,
    pub user_verification: String,
}

/// Options passed to `navigator.credentials.create()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationOptions {
    pub challenge: String,
    pub rp: RelyingPartyEntity,
    pub user: UserEntity,
    pub timeout_ms: u64,
    pub pub_key_cred_params: Vec<CredentialParameter>,
    pub attestation: String,
    pub authenticator_selection: AuthenticatorSelection,
}

impl RegistrationOptions {
    pub fn new(issued: &RegistrationChallenge, rp: &RelyingPartyConfig, timeout: Duration) -> Self {
        // ---
        Self {
            challenge: codec::encode(&issued.challenge),
            rp: RelyingPartyEntity {
                id: rp.rp_id.clone(),
                name: rp.rp_name.clone(),
            },
            user: UserEntity {
                id: codec::encode(issued.user_id.as_bytes()),
                name: issued.username.clone(),
                display_name: issued.username.clone(),
            },
            timeout_ms: timeout.as_millis() as u64,
            pub_key_cred_params: SUPPORTED_ALGORITHMS
                .iter()
                .map(|alg| CredentialParameter {
                    kind: "public-key".to_string(),
                    alg: *alg,
                })
                .collect(),
            attestation: "none".to_string(),
            authenticator_selection: AuthenticatorSelection {
                resident_key: "preferred".to_string(),
                user_verification: "preferred".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub transports: Vec<Transport>,
}

/// Options passed to `navigator.credentials.get()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticationOptions {
    pub challenge: String,
    pub rp_id: String,
    pub timeout_ms: u64,
    pub allow_credentials: Vec<CredentialDescriptor>,
    pub user_verification: String,
}

impl AuthenticationOptions {
    pub fn new(issued: &AuthenticationChallenge, rp: &RelyingPartyConfig, timeout: Duration) -> Self {
        // ---
        Self {
            challenge: codec::encode(&issued.challenge),
            rp_id: rp.rp_id.clone(),
            timeout_ms: timeout.as_millis() as u64,
            allow_credentials: issued
                .allowed
                .iter()
                .map(|cred| CredentialDescriptor {
                    id: codec::encode(&cred.id),
                    kind: "public-key".to_string(),
                    transports: cred.transports.clone(),
                })
                .collect(),
            user_verification: "preferred".to_string(),
        }
    }
}

// ============================================================================
// Incoming responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientDataJson {
    pub challenge: String,
    pub origin: String,
    pub rp_id: String,
}

impl TryFrom<&ClientDataJson> for ClientData {
    type Error = CeremonyError;

    fn try_from(value: &ClientDataJson) -> Result<Self, Self::Error> {
        Ok(ClientData {
            challenge: codec::decode(&value.challenge)?,
            origin: value.origin.clone(),
            rp_id: value.rp_id.clone(),
        })
    }
}

/// Result of `navigator.credentials.create()` as posted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationResponseJson {
    pub client_data: ClientDataJson,
    pub attestation_object: String,
    #[serde(default)]
    pub transports: Vec<Transport>,
}

impl TryFrom<&RegistrationResponseJson> for RegistrationResponse {
    type Error = CeremonyError;

    fn try_from(value: &RegistrationResponseJson) -> Result<Self, Self::Error> {
        Ok(RegistrationResponse {
            client_data: ClientData::try_from(&value.client_data)?,
            attestation_object: codec::decode(&value.attestation_object)?,
            transports: value.transports.clone(),
        })
    }
}

impl From<&RegistrationResponse> for RegistrationResponseJson {
    fn from(value: &RegistrationResponse) -> Self {
        Self {
            client_data: ClientDataJson::from(&value.client_data),
            attestation_object: codec::encode(&value.attestation_object),
            transports: value.transports.clone(),
        }
    }
}

/// Result of `navigator.credentials.get()` as posted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticationResponseJson {
    pub id: String,
    pub client_data: ClientDataJson,
    pub authenticator_data: String,
    pub signature: String,
    #[serde(default)]
    pub user_handle: Option<String>,
}

impl TryFrom<&AuthenticationResponseJson> for AuthenticationResponse {
    type Error = CeremonyError;

    fn try_from(value: &AuthenticationResponseJson) -> Result<Self, Self::Error> {
        Ok(AuthenticationResponse {
            credential_id: codec::decode(&value.id)?,
            client_data: ClientData::try_from(&value.client_data)?,
            authenticator_data: codec::decode(&value.authenticator_data)?,
            signature: codec::decode(&value.signature)?,
            user_handle: value
                .user_handle
                .as_deref()
                .map(codec::decode)
                .transpose()?,
        })
    }
}

impl From<&AuthenticationResponse> for AuthenticationResponseJson {
    fn from(value: &AuthenticationResponse) -> Self {
        Self {
            id: codec::encode(&value.credential_id),
            client_data: ClientDataJson::from(&value.client_data),
            authenticator_data: codec::encode(&value.authenticator_data),
            signature: codec::encode(&value.signature),
            user_handle: value.user_handle.as_deref().map(codec::encode),
        }
    }
}

impl From<&ClientData> for ClientDataJson {
    fn from(value: &ClientData) -> Self {
        Self {
            challenge: codec::encode(&value.challenge),
            origin: value.origin.clone(),
            rp_id: value.rp_id.clone(),
        }
    }
}
