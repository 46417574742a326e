// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::Result;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .map_err(|_| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. This macro is appropriate for non-critical
/// tuning parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
/// All required configuration is validated eagerly during initialization.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub relying_party: RelyingPartyConfig,
    pub ceremony: CeremonyConfig,
    pub session: SessionConfig,
    pub backend: BackendConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    /// This function is intended to be called exactly once at startup.
    pub fn from_env() -> Result<Self> {
        // ---
        Ok(Self {
            relying_party: RelyingPartyConfig::from_env()?,
            ceremony: CeremonyConfig::from_env()?,
            session: SessionConfig::from_env()?,
            backend: BackendConfig::from_env()?,
            server: ServerConfig::from_env(),
        })
    }
}

// ============================================================
// Relying party configuration
// ============================================================

mod relying_party {
    // ---
    use super::*;
    use reqwest::Url;

    /// Relying party identity that every response must match.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RelyingPartyConfig {
        /// Relying Party ID (a domain name).
        pub rp_id: String,

        /// Human-readable Relying Party name.
        pub rp_name: String,

        /// Serialized origin (scheme://host[:port]) with no trailing slash.
        pub origin: String,
    }

    impl RelyingPartyConfig {
        /// Validates and normalizes a relying party identity.
        ///
        /// The origin must parse as a URL and its host must be the RP id or
        /// a subdomain of it.
        pub fn new(rp_id: &str, rp_name: &str, origin: &str) -> Result<Self> {
            // ---
            tracing::debug!("Validating relying party rp_id:{} origin:{}", rp_id, origin);

            anyhow::ensure!(!rp_id.trim().is_empty(), "RP id must not be empty");

            let url = Url::parse(origin)
                .map_err(|e| anyhow::anyhow!("Invalid origin '{origin}': {e}"))?;
            let host = url
                .host_str()
                .ok_or_else(|| anyhow::anyhow!("Origin '{origin}' has no host"))?;

            let rp_id = rp_id.to_ascii_lowercase();
            let host = host.to_ascii_lowercase();
            anyhow::ensure!(
                host == rp_id || host.ends_with(&format!(".{rp_id}")),
                "Origin host '{host}' is not within RP id '{rp_id}'"
            );

            Ok(Self {
                rp_id,
                rp_name: rp_name.to_string(),
                origin: url.origin().ascii_serialization(),
            })
        }

        /// Builds a [`RelyingPartyConfig`] from environment variables.
        ///
        /// # Errors
        /// RP id and origin are security-critical and must be explicitly provided.
        pub fn from_env() -> Result<Self> {
            // ---
            let rp_id = required_env!("PASSKEY_RP_ID");
            let origin = required_env!("PASSKEY_ORIGIN");

            let rp_name = std::env::var("PASSKEY_RP_NAME")
                .unwrap_or_else(|_| "Passkey Ceremony".to_string());

            Self::new(&rp_id, &rp_name, &origin)
        }
    }
}
pub use relying_party::RelyingPartyConfig;

// ============================================================
// Ceremony configuration
// ============================================================

mod ceremony {
    // ---
    use super::*;
    use crate::ceremony::CounterPolicy;

    /// Smallest challenge the tracker will ever mint.
    pub const MIN_CHALLENGE_BYTES: usize = 16;

    /// Longest a pending ceremony may stay open (one hour).
    pub const MAX_CEREMONY_TIMEOUT_SECS: u64 = 3_600;

    /// Tuning for challenge issuance and verification policy.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CeremonyConfig {
        /// How long a pending ceremony stays valid. Defaults to 60 seconds.
        pub timeout: Duration,

        /// Random bytes per challenge. Defaults to 32, never below 16.
        pub challenge_bytes: usize,

        /// How to treat authenticators that never advance their counter.
        pub counter_policy: CounterPolicy,

        /// Lowercase usernames before lookup and storage. Defaults to false.
        pub fold_username_case: bool,
    }

    impl Default for CeremonyConfig {
        fn default() -> Self {
            Self {
                timeout: Duration::from_secs(60),
                challenge_bytes: 32,
                counter_policy: CounterPolicy::AllowCounterless,
                fold_username_case: false,
            }
        }
    }

    impl CeremonyConfig {
        /// Builds a [`CeremonyConfig`] from environment variables.
        ///
        /// # Errors
        /// Fails if the timeout is zero or above [`MAX_CEREMONY_TIMEOUT_SECS`],
        /// the challenge length is below the minimum, or the counter policy
        /// is not recognized.
        pub fn from_env() -> Result<Self> {
            // ---
            let timeout_secs = optional_env_parse!("PASSKEY_CEREMONY_TIMEOUT_SEC", u64, 60);
            let challenge_bytes = optional_env_parse!("PASSKEY_CHALLENGE_BYTES", usize, 32);
            let fold_username_case = optional_env_parse!("PASSKEY_USERNAME_CASE_FOLD", bool, false);

            let counter_policy = match std::env::var("PASSKEY_COUNTER_POLICY") {
                Ok(raw) => raw.parse::<CounterPolicy>()?,
                Err(_) => CounterPolicy::AllowCounterless,
            };

            anyhow::ensure!(
                (1..=MAX_CEREMONY_TIMEOUT_SECS).contains(&timeout_secs),
                "PASSKEY_CEREMONY_TIMEOUT_SEC must be between 1 and {MAX_CEREMONY_TIMEOUT_SECS}, got {timeout_secs}"
            );
            anyhow::ensure!(
                challenge_bytes >= MIN_CHALLENGE_BYTES,
                "PASSKEY_CHALLENGE_BYTES must be at least {MIN_CHALLENGE_BYTES}, got {challenge_bytes}"
            );

            Ok(Self {
                timeout: Duration::from_secs(timeout_secs),
                challenge_bytes,
                counter_policy,
                fold_username_case,
            })
        }
    }
}
pub use ceremony::{CeremonyConfig, MAX_CEREMONY_TIMEOUT_SECS, MIN_CHALLENGE_BYTES};

// ============================================================
// Session configuration
// ============================================================

mod session {
    // ---
    use super::*;

    /// Session lifetime cap in seconds (7 days).
    const DEFAULT_SESSION_LIFETIME_SECS: u64 = 604_800;

    /// Upper bound on a configured lifetime (365 days).
    pub const MAX_SESSION_LIFETIME_SECS: u64 = 31_536_000;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SessionConfig {
        /// Maximum age of an authenticated session.
        pub lifetime: Duration,
    }

    impl Default for SessionConfig {
        fn default() -> Self {
            Self {
                lifetime: Duration::from_secs(DEFAULT_SESSION_LIFETIME_SECS),
            }
        }
    }

    impl SessionConfig {
        /// # Errors
        /// Fails if the lifetime is zero or above [`MAX_SESSION_LIFETIME_SECS`].
        pub fn from_env() -> Result<Self> {
            // ---
            let secs = optional_env_parse!(
                "PASSKEY_SESSION_LIFETIME_SEC",
                u64,
                DEFAULT_SESSION_LIFETIME_SECS
            );
            anyhow::ensure!(
                (1..=MAX_SESSION_LIFETIME_SECS).contains(&secs),
                "PASSKEY_SESSION_LIFETIME_SEC must be between 1 and {MAX_SESSION_LIFETIME_SECS}, got {secs}"
            );
            Ok(Self {
                lifetime: Duration::from_secs(secs),
            })
        }
    }
}
pub use session::{SessionConfig, MAX_SESSION_LIFETIME_SECS};

// ============================================================
// Backend configuration
// ============================================================

mod backend {
    // ---
    use super::*;

    /// Database-related configuration derived from environment variables.
    #[derive(Debug, Clone)]
    pub struct DatabaseConfig {
        /// PostgreSQL connection string.
        pub database_url: String,

        /// Maximum time to wait when acquiring a connection from the pool. Defaults to 30 seconds.
        pub acquire_timeout: Duration,

        /// Maximum number of connections open concurrently. Defaults to 15.
        pub max_connections: u32,
    }

    impl DatabaseConfig {
        /// Builds a [`DatabaseConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if `DATABASE_URL` is missing.
        pub fn from_env() -> Result<Self> {
            // ---
            let database_url = required_env!("DATABASE_URL");
            let acquire_timeout_secs =
                optional_env_parse!("PASSKEY_DB_ACQUIRE_TIMEOUT_SEC", u64, 30);
            let max_connections = optional_env_parse!("PASSKEY_DB_MAX_CONNECTIONS", u32, 15);

            Ok(Self {
                database_url,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
                max_connections,
            })
        }
    }

    /// Redis-related configuration used for pending ceremonies and sessions.
    #[derive(Debug, Clone)]
    pub struct RedisConfig {
        /// Redis connection string.
        pub url: String,
    }

    impl RedisConfig {
        pub fn from_env() -> Result<Self> {
            // ---
            let url = required_env!("PASSKEY_REDIS_URL");
            Ok(Self { url })
        }
    }

    /// Where users, credentials and session state live.
    #[derive(Debug, Clone)]
    pub enum BackendConfig {
        /// Process-local maps. State is lost on restart.
        Memory,
        /// Postgres for users and credentials, Redis for token-scoped state.
        Durable {
            database: DatabaseConfig,
            redis: RedisConfig,
        },
    }

    impl BackendConfig {
        /// Reads `PASSKEY_BACKEND` (`memory` or `durable`, default `memory`).
        pub fn from_env() -> Result<Self> {
            // ---
            let kind = std::env::var("PASSKEY_BACKEND").unwrap_or_else(|_| "memory".to_string());
            match kind.as_str() {
                "memory" => Ok(Self::Memory),
                "durable" => Ok(Self::Durable {
                    database: DatabaseConfig::from_env()?,
                    redis: RedisConfig::from_env()?,
                }),
                other => anyhow::bail!("Unknown PASSKEY_BACKEND '{other}' (expected memory or durable)"),
            }
        }
    }
}
pub use backend::{BackendConfig, DatabaseConfig, RedisConfig};

// ============================================================
// Server configuration
// ============================================================

mod server {
    // ---

    #[derive(Debug, Clone)]
    pub struct ServerConfig {
        /// Listen address. Defaults to 127.0.0.1:8080.
        pub bind_addr: String,

        /// `prom` for Prometheus metrics, anything else for no-op.
        pub metrics_type: String,

        /// Verifier the binary wires in. Only `digest` is built in.
        pub verifier: Option<String>,
    }

    impl ServerConfig {
        pub fn from_env() -> Self {
            // ---
            Self {
                bind_addr: std::env::var("PASSKEY_BIND_ADDR")
                    .unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
                metrics_type: std::env::var("PASSKEY_METRICS_TYPE")
                    .unwrap_or_else(|_| "noop".to_string()),
                verifier: std::env::var("PASSKEY_VERIFIER").ok(),
            }
        }
    }
}
pub use server::ServerConfig;

// ============================================================
// Tests
// ============================================================
