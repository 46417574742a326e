use super::models::{Credential, User};
use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Failure of a repository write.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write (username or credential id).
    #[error("uniqueness conflict: {0}")]
    Conflict(String),

    /// The conditional counter update found a different prior value.
    #[error("signature counter changed since it was read")]
    StaleCounter,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Abstraction for durable user and credential storage.
#[async_trait::async_trait]
pub trait CredentialRepository: Send + Sync {
    // ---
    /// Get user by username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get all credentials for a user.
    async fn find_credentials_by_owner(&self, user_id: Uuid) -> Result<Vec<Credential>>;

    /// Get a specific credential by its ID.
    async fn find_credential_by_id(&self, credential_id: &[u8]) -> Result<Option<Credential>>;

    /// Create a user together with its first credential.
    ///
    /// Both rows are written or neither is.
    async fn create_user_and_credential(
        &self,
        user: &User,
        credential: &Credential,
    ) -> std::result::Result<(), RepositoryError>;

    /// Set the signature counter, provided it still equals `expected`.
    async fn update_counter(
        &self,
        credential_id: &[u8],
        expected: u32,
        new_counter: u32,
    ) -> std::result::Result<(), RepositoryError>;
}

/// Type alias for any backend that implements CredentialRepository.
pub type RepositoryPtr = Arc<dyn CredentialRepository>;
