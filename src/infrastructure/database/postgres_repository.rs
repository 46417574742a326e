use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::{Credential, CredentialRepository, RepositoryError, Transport, User};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS credentials (
        id BYTEA PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        public_key BYTEA NOT NULL,
        counter BIGINT NOT NULL CHECK (counter >= 0 AND counter <= 4294967295),
        transports TEXT NOT NULL DEFAULT '[]',
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS credentials_user_id_idx ON credentials (user_id)",
];

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            username: r.username,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Vec<u8>,
    user_id: Uuid,
    public_key: Vec<u8>,
    counter: i64,
    transports: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CredentialRow> for Credential {
    type Error = anyhow::Error;

    fn try_from(r: CredentialRow) -> Result<Self> {
        // ---
        let counter = u32::try_from(r.counter)
            .map_err(|_| anyhow::anyhow!("stored counter {} out of range", r.counter))?;
        let transports: Vec<Transport> = serde_json::from_str(&r.transports)?;

        Ok(Credential {
            id: r.id,
            user_id: r.user_id,
            public_key: r.public_key,
            counter,
            transports,
            created_at: r.created_at,
        })
    }
}

/// Connect a pool and make sure the schema exists.
pub async fn create_postgres_repository(config: &DatabaseConfig) -> Result<PostgresRepository> {
    // ---
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await?;

    let repository = PostgresRepository::new(pool);
    repository.init_schema().await?;

    tracing::info!("Postgres repository ready");
    Ok(repository)
}

pub struct PostgresRepository {
    // ---
    pool: PgPool,
}

impl PostgresRepository {
    // ---
    pub fn new(pool: PgPool) -> Self {
        // ---
        Self { pool }
    }

    /// Create tables and indexes if they are missing.
    pub async fn init_schema(&self) -> Result<()> {
        // ---
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

/// Map a write failure, splitting unique violations out as conflicts.
fn classify(err: sqlx::Error, what: &str) -> RepositoryError {
    // ---
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(format!("{what} already exists"))
        }
        _ => RepositoryError::Backend(err.into()),
    }
}

#[async_trait::async_trait]
impl CredentialRepository for PostgresRepository {
    // ---
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        // ---
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_credentials_by_owner(&self, user_id: Uuid) -> Result<Vec<Credential>> {
        // ---
        let rows = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, user_id, public_key, counter, transports, created_at
             FROM credentials WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Credential::try_from).collect()
    }

    async fn find_credential_by_id(&self, credential_id: &[u8]) -> Result<Option<Credential>> {
        // ---
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, user_id, public_key, counter, transports, created_at
             FROM credentials WHERE id = $1",
        )
        .bind(credential_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Credential::try_from).transpose()
    }

    async fn create_user_and_credential(
        &self,
        user: &User,
        credential: &Credential,
    ) -> Result<(), RepositoryError> {
        // ---
        let transports = serde_json::to_string(&credential.transports)
            .map_err(|e| RepositoryError::Backend(e.into()))?;

        // Dropping the transaction without commit rolls both inserts back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Backend(e.into()))?;

        sqlx::query("INSERT INTO users (id, username, created_at) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(&user.username)
            .bind(user.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| classify(e, "username"))?;

        sqlx::query(
            "INSERT INTO credentials (id, user_id, public_key, counter, transports, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&credential.id)
        .bind(credential.user_id)
        .bind(&credential.public_key)
        .bind(i64::from(credential.counter))
        .bind(transports)
        .bind(credential.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify(e, "credential id"))?;

        tx.commit()
            .await
            .map_err(|e| classify(e, "user or credential"))?;

        Ok(())
    }

    async fn update_counter(
        &self,
        credential_id: &[u8],
        expected: u32,
        new_counter: u32,
    ) -> Result<(), RepositoryError> {
        // ---
        let result = sqlx::query("UPDATE credentials SET counter = $1 WHERE id = $2 AND counter = $3")
            .bind(i64::from(new_counter))
            .bind(credential_id)
            .bind(i64::from(expected))
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Backend(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::StaleCounter);
        }

        Ok(())
    }
}
