//! Transport encoding for ceremony byte strings.
//!
//! Challenges, credential ids, public keys and signatures travel as
//! URL-safe base64 without padding. Ceremony logic only ever sees the
//! decoded bytes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

/// Failure to turn wire text back into bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed encoding: {reason}")]
pub struct CodecError {
    reason: String,
}

/// Encode raw bytes as URL-safe, unpadded base64.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe, unpadded base64.
///
/// Rejects characters outside the URL-safe alphabet, any `=` padding and
/// trailing groups that do not map back onto whole bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    // ---
    URL_SAFE_NO_PAD.decode(text).map_err(|e| CodecError {
        reason: e.to_string(),
    })
}
