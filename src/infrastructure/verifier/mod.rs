//! Built-in ceremony verifiers.
//!
//! The engine only depends on [`CeremonyVerifier`]; a deployment that talks
//! to real authenticators injects its own implementation through
//! `build_service`. The one shipped here is a development verifier.

mod digest_verifier;

pub use digest_verifier::{digest_signature, DigestAttestation, DigestVerifier};

use crate::domain::VerifierPtr;
use anyhow::Result;
use std::sync::Arc;

/// Creates the verifier named by `PASSKEY_VERIFIER`.
///
/// # Errors
/// Fails when no verifier is named or the name is not built in. Starting
/// without a verifier would accept nothing, so this is a deployment error.
pub fn create_verifier(name: Option<&str>) -> Result<VerifierPtr> {
    // ---
    match name {
        Some("digest") => {
            tracing::warn!("Using the digest verifier; it is for development with simulated authenticators only");
            Ok(Arc::new(DigestVerifier))
        }
        Some(other) => anyhow::bail!("Unknown PASSKEY_VERIFIER '{other}' (built in: digest)"),
        None => anyhow::bail!(
            "Missing required configuration: PASSKEY_VERIFIER (or inject a verifier via build_service)"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_verifier_is_built_in() {
        assert!(create_verifier(Some("digest")).is_ok());
    }

    #[test]
    fn unknown_or_missing_verifier_fails() {
        assert!(create_verifier(Some("webauthn")).is_err());

        let err = create_verifier(None).err().unwrap();
        assert!(err.to_string().contains("PASSKEY_VERIFIER"));
    }
}
