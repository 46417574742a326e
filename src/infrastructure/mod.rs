mod database;
pub mod metrics;
mod session;
mod verifier;

pub use database::{create_postgres_repository, MemoryRepository, PostgresRepository};
pub use metrics::{create_noop_metrics, create_prom_metrics};
pub use session::{create_redis_session_store, MemorySessionStore, RedisSessionStore};
pub use verifier::{create_verifier, digest_signature, DigestAttestation, DigestVerifier};
