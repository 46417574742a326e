use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Represents an enrolled user. Exists only together with at least one credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    // ---
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    // ---
    pub fn new(id: Uuid, username: String) -> Self {
        // ---
        Self {
            id,
            username,
            created_at: Utc::now(),
        }
    }
}

/// Transport hint reported by an authenticator during registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    Usb,
    Nfc,
    Ble,
    Internal,
    Hybrid,
    SmartCard,
}

/// Represents an enrolled authenticator (passkey) for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    // ---
    /// Unique credential ID (from authenticator)
    pub id: Vec<u8>,

    /// User this credential belongs to
    pub user_id: Uuid,

    /// Public key for signature verification
    pub public_key: Vec<u8>,

    /// Signature counter (for clone detection)
    pub counter: u32,

    /// Transports the authenticator said it can be reached over
    pub transports: Vec<Transport>,

    /// When this credential was created
    pub created_at: DateTime<Utc>,
}

impl Credential {
    // ---
    pub fn new(id: Vec<u8>, user_id: Uuid, public_key: Vec<u8>, transports: Vec<Transport>) -> Self {
        // ---
        Self {
            id,
            user_id,
            public_key,
            counter: 0,
            transports,
            created_at: Utc::now(),
        }
    }
}

/// Which ceremony a pending challenge was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CeremonyKind {
    Registration,
    Authentication,
}

impl CeremonyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CeremonyKind::Registration => "registration",
            CeremonyKind::Authentication => "authentication",
        }
    }
}

impl fmt::Display for CeremonyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a pending ceremony is about.
///
/// For registration the user does not exist yet; the id is a candidate that
/// only becomes real when the ceremony commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CeremonySubject {
    Registration { user_id: Uuid, username: String },
    Authentication { user_id: Uuid, username: String },
}

impl CeremonySubject {
    pub fn kind(&self) -> CeremonyKind {
        match self {
            CeremonySubject::Registration { .. } => CeremonyKind::Registration,
            CeremonySubject::Authentication { .. } => CeremonyKind::Authentication,
        }
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            CeremonySubject::Registration { user_id, .. }
            | CeremonySubject::Authentication { user_id, .. } => *user_id,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            CeremonySubject::Registration { username, .. }
            | CeremonySubject::Authentication { username, .. } => username,
        }
    }
}

/// A challenge that has been issued and not yet consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCeremony {
    pub challenge: Vec<u8>,
    pub subject: CeremonySubject,
    pub expires_at: DateTime<Utc>,
}

impl PendingCeremony {
    pub fn kind(&self) -> CeremonyKind {
        self.subject.kind()
    }

    /// An entry is expired from the instant `expires_at` is reached.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Session state bound to a token after a verified authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    pub user_id: Uuid,
    pub username: String,
    pub established_at: DateTime<Utc>,
}

/// Read-only view of who a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub username: String,
}

/// Opaque per-client token that scopes pending ceremonies and session state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Mint a new random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
