//! Ceremony error taxonomy.
//!
//! Every failure the engine can produce is a variant of [`CeremonyError`].
//! Each variant belongs to exactly one [`ErrorCategory`], which is what
//! outward surfaces should branch on.

use super::models::CeremonyKind;
use crate::codec::CodecError;
use thiserror::Error;

/// Coarse classification used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad request data. Report, do not retry.
    ClientInput,
    /// Uniqueness or concurrent-write conflict. Caller may retry with new input or a new ceremony.
    Conflict,
    /// Missing, expired or mismatched ceremony. Caller must restart the ceremony.
    CeremonyState,
    /// The response failed verification. Always rendered as one generic failure.
    Verification,
    /// The signature counter did not advance. Credential needs manual review.
    SecurityInvariant,
    /// Backend failure.
    Persistence,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::ClientInput => "client_input",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::CeremonyState => "ceremony_state",
            ErrorCategory::Verification => "verification",
            ErrorCategory::SecurityInvariant => "security_invariant",
            ErrorCategory::Persistence => "persistence",
        }
    }
}

#[derive(Debug, Error)]
pub enum CeremonyError {
    #[error("username is required")]
    MissingUsername,

    #[error(transparent)]
    MalformedEncoding(#[from] CodecError),

    #[error("unknown user")]
    UnknownUser,

    #[error("user has no enrolled credentials")]
    NoCredentialsEnrolled,

    #[error("username is already registered")]
    UsernameTaken,

    #[error("conflicting write: {0}")]
    PersistenceConflict(String),

    #[error("no pending ceremony for this session")]
    NoPendingCeremony,

    #[error("ceremony expired")]
    CeremonyExpired,

    #[error("expected a {expected} ceremony, found {found}")]
    CeremonyKindMismatch {
        expected: CeremonyKind,
        found: CeremonyKind,
    },

    #[error("challenge does not match the pending ceremony")]
    ChallengeMismatch,

    #[error("origin does not match this relying party")]
    OriginMismatch,

    #[error("relying party id does not match")]
    RpIdMismatch,

    #[error("attestation could not be verified")]
    AttestationInvalid,

    #[error("credential is not eligible for this ceremony")]
    UnknownCredential,

    #[error("assertion signature could not be verified")]
    SignatureInvalid,

    #[error("signature counter did not advance (stored {stored}, asserted {asserted})")]
    PossibleCloneDetected { stored: u32, asserted: u32 },

    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl CeremonyError {
    pub fn category(&self) -> ErrorCategory {
        // ---
        use CeremonyError::*;
        match self {
            MissingUsername | MalformedEncoding(_) | UnknownUser | NoCredentialsEnrolled => {
                ErrorCategory::ClientInput
            }
            UsernameTaken | PersistenceConflict(_) => ErrorCategory::Conflict,
            NoPendingCeremony | CeremonyExpired | CeremonyKindMismatch { .. } => {
                ErrorCategory::CeremonyState
            }
            ChallengeMismatch | OriginMismatch | RpIdMismatch | AttestationInvalid
            | UnknownCredential | SignatureInvalid => ErrorCategory::Verification,
            PossibleCloneDetected { .. } => ErrorCategory::SecurityInvariant,
            Persistence(_) => ErrorCategory::Persistence,
        }
    }

    /// Message safe to hand to an untrusted client.
    ///
    /// Verification failures collapse into one message so a caller cannot
    /// learn which sub-check rejected the response. Counter values stay in
    /// logs.
    pub fn public_message(&self) -> String {
        match self.category() {
            ErrorCategory::Verification => "verification failed".to_string(),
            ErrorCategory::SecurityInvariant => "authenticator rejected".to_string(),
            ErrorCategory::Persistence => "internal error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<anyhow::Error> for CeremonyError {
    fn from(err: anyhow::Error) -> Self {
        CeremonyError::Persistence(err)
    }
}

pub type CeremonyResult<T> = std::result::Result<T, CeremonyError>;
