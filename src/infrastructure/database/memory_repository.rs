//! Process-local repository.
//!
//! Users and credentials live in two tables behind a single lock so that
//! multi-row writes are atomic with respect to every reader.

use crate::domain::{Credential, CredentialRepository, RepositoryError, User};
use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    usernames: HashMap<String, Uuid>,
    credentials: HashMap<Vec<u8>, Credential>,
}

#[derive(Default)]
pub struct MemoryRepository {
    // ---
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user directly, outside any ceremony.
    pub async fn insert_user(&self, user: User) -> Result<(), RepositoryError> {
        // ---
        let mut tables = self.tables.write().await;
        if tables.usernames.contains_key(&user.username) || tables.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        tables.usernames.insert(user.username.clone(), user.id);
        tables.users.insert(user.id, user);
        Ok(())
    }

    /// Seed an additional credential for an existing user.
    pub async fn insert_credential(&self, credential: Credential) -> Result<(), RepositoryError> {
        // ---
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&credential.user_id) {
            return Err(RepositoryError::Backend(anyhow::anyhow!(
                "credential owner {} does not exist",
                credential.user_id
            )));
        }
        if tables.credentials.contains_key(&credential.id) {
            return Err(RepositoryError::Conflict(format!(
                "credential {} already exists",
                hex::encode(&credential.id)
            )));
        }
        tables.credentials.insert(credential.id.clone(), credential);
        Ok(())
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    pub async fn credential_count(&self) -> usize {
        self.tables.read().await.credentials.len()
    }
}

#[async_trait::async_trait]
impl CredentialRepository for MemoryRepository {
    // ---
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        // ---
        let tables = self.tables.read().await;
        Ok(tables
            .usernames
            .get(username)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_credentials_by_owner(&self, user_id: Uuid) -> Result<Vec<Credential>> {
        // ---
        let tables = self.tables.read().await;
        Ok(tables
            .credentials
            .values()
            .filter(|cred| cred.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_credential_by_id(&self, credential_id: &[u8]) -> Result<Option<Credential>> {
        // ---
        Ok(self.tables.read().await.credentials.get(credential_id).cloned())
    }

    async fn create_user_and_credential(
        &self,
        user: &User,
        credential: &Credential,
    ) -> Result<(), RepositoryError> {
        // ---
        let mut tables = self.tables.write().await;

        // Check every constraint before touching either table.
        if tables.usernames.contains_key(&user.username) || tables.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        if tables.credentials.contains_key(&credential.id) {
            return Err(RepositoryError::Conflict(format!(
                "credential {} already exists",
                hex::encode(&credential.id)
            )));
        }
        if credential.user_id != user.id {
            return Err(RepositoryError::Backend(anyhow::anyhow!(
                "credential owner does not match the user being created"
            )));
        }

        tables.usernames.insert(user.username.clone(), user.id);
        tables.users.insert(user.id, user.clone());
        tables
            .credentials
            .insert(credential.id.clone(), credential.clone());

        Ok(())
    }

    async fn update_counter(
        &self,
        credential_id: &[u8],
        expected: u32,
        new_counter: u32,
    ) -> Result<(), RepositoryError> {
        // ---
        let mut tables = self.tables.write().await;
        let credential = tables.credentials.get_mut(credential_id).ok_or_else(|| {
            RepositoryError::Backend(anyhow::anyhow!(
                "credential {} not found",
                hex::encode(credential_id)
            ))
        })?;

        if credential.counter != expected {
            return Err(RepositoryError::StaleCounter);
        }
        credential.counter = new_counter;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::domain::Transport;

    fn user(name: &str) -> User {
        User::new(Uuid::new_v4(), name.to_string())
    }

    #[tokio::test]
    async fn create_and_find_user_with_credential() {
        // ---
        let repo = MemoryRepository::new();
        let thorin = user("Thorin Oakenshield");
        let cred = Credential::new(vec![1, 2, 3], thorin.id, vec![10, 20], vec![Transport::Usb]);

        repo.create_user_and_credential(&thorin, &cred).await.unwrap();

        let found = repo
            .find_user_by_username("Thorin Oakenshield")
            .await
            .unwrap()
            .expect("user exists");
        assert_eq!(found.id, thorin.id);

        let creds = repo.find_credentials_by_owner(thorin.id).await.unwrap();
        assert_eq!(creds, vec![cred.clone()]);
        assert_eq!(
            repo.find_credential_by_id(&[1, 2, 3]).await.unwrap(),
            Some(cred)
        );
    }

    #[tokio::test]
    async fn duplicate_username_leaves_no_partial_rows() {
        // ---
        let repo = MemoryRepository::new();
        let fili = user("Fili");
        repo.create_user_and_credential(&fili, &Credential::new(vec![1], fili.id, vec![], vec![]))
            .await
            .unwrap();

        let impostor = user("Fili");
        let err = repo
            .create_user_and_credential(
                &impostor,
                &Credential::new(vec![2], impostor.id, vec![], vec![]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(repo.user_count().await, 1);
        assert_eq!(repo.credential_count().await, 1);
        assert!(repo.find_credential_by_id(&[2]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_credential_id_leaves_no_user() {
        // ---
        let repo = MemoryRepository::new();
        let kili = user("Kili");
        repo.create_user_and_credential(&kili, &Credential::new(vec![5], kili.id, vec![], vec![]))
            .await
            .unwrap();

        let balin = user("Balin");
        let err = repo
            .create_user_and_credential(&balin, &Credential::new(vec![5], balin.id, vec![], vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(repo.find_user_by_username("Balin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn counter_update_is_conditional() {
        // ---
        let repo = MemoryRepository::new();
        let dwalin = user("Dwalin");
        repo.create_user_and_credential(
            &dwalin,
            &Credential::new(vec![5, 5, 5], dwalin.id, vec![50], vec![]),
        )
        .await
        .unwrap();

        repo.update_counter(&[5, 5, 5], 0, 1).await.unwrap();

        let err = repo.update_counter(&[5, 5, 5], 0, 2).await.unwrap_err();
        assert!(matches!(err, RepositoryError::StaleCounter));

        repo.update_counter(&[5, 5, 5], 1, 5).await.unwrap();
        let found = repo.find_credential_by_id(&[5, 5, 5]).await.unwrap().unwrap();
        assert_eq!(found.counter, 5);
    }

    #[tokio::test]
    async fn credential_for_missing_owner_rejected() {
        // ---
        let repo = MemoryRepository::new();
        let orphan = Credential::new(vec![8, 8, 8], Uuid::new_v4(), vec![80], vec![]);
        assert!(repo.insert_credential(orphan).await.is_err());
    }
}
