// src/lib.rs
use anyhow::Result;
use app_state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::{Arc, Weak};
use std::time::Duration;

use ceremony::{CeremonyService, ServiceDeps};
use domain::{MetricsPtr, RepositoryPtr, SessionStorePtr, VerifierPtr};
use handlers::{
    dashboard_data, health_check, login_finish, login_start, logout, me, metrics_handler,
    register_finish, register_start, require_session,
};

// Public exports (visible outside this module)
pub mod ceremony;
pub mod codec;
pub mod domain;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod handlers;
mod infrastructure;

pub use config::*;

// Publicly expose the infrastructure backends and factories
pub use infrastructure::{
    create_noop_metrics, // ---
    create_postgres_repository,
    create_prom_metrics,
    create_redis_session_store,
    create_verifier,
    digest_signature,
    DigestAttestation,
    DigestVerifier,
    MemoryRepository,
    MemorySessionStore,
    PostgresRepository,
    RedisSessionStore,
};

/// How often the in-memory backend drops expired ceremonies and sessions.
const MEMORY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Build the ceremony service on the backend `config` selects.
///
/// The verifier is injected because the engine does not implement
/// signature cryptography itself.
pub async fn build_service(
    config: &AppConfig,
    metrics: MetricsPtr,
    verifier: VerifierPtr,
) -> Result<CeremonyService> {
    // ---
    let (repository, sessions): (RepositoryPtr, SessionStorePtr) = match &config.backend {
        BackendConfig::Memory => {
            tracing::info!("Using in-memory backend; state is lost on restart");
            let store = Arc::new(MemorySessionStore::new());
            spawn_sweeper(Arc::downgrade(&store));

            let repository: RepositoryPtr = Arc::new(MemoryRepository::new());
            let sessions: SessionStorePtr = store;
            (repository, sessions)
        }
        BackendConfig::Durable { database, redis } => {
            tracing::info!("Using Postgres and Redis backend");
            let repository: RepositoryPtr = Arc::new(create_postgres_repository(database).await?);
            let sessions: SessionStorePtr = Arc::new(create_redis_session_store(&redis.url)?);
            (repository, sessions)
        }
    };

    let deps = ServiceDeps {
        repository,
        sessions,
        verifier,
        metrics,
    };

    Ok(CeremonyService::new(
        deps,
        config.relying_party.clone(),
        config.ceremony.clone(),
        config.session.clone(),
    ))
}

/// Periodically sweep the memory store until it is dropped.
fn spawn_sweeper(store: Weak<MemorySessionStore>) {
    // ---
    tokio::spawn(async move {
        //
        let mut ticker = tokio::time::interval(MEMORY_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match store.upgrade() {
                Some(store) => store.sweep_expired(),
                None => break,
            }
        }
    });
}

/// Build the HTTP router over a ready ceremony service.
pub fn create_router(service: Arc<CeremonyService>) -> Router {
    // ---
    let app_state = AppState::new(service);

    // Rejects requests without a live session
    let guard = middleware::from_fn_with_state(app_state.clone(), require_session);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest(
            "/auth",
            Router::new()
                .route("/register/start", post(register_start))
                .route("/register/finish", post(register_finish))
                .route("/login/start", post(login_start))
                .route("/login/finish", post(login_finish))
                .route("/me", get(me).route_layer(guard.clone()))
                .route("/logout", post(logout)),
        )
        .nest(
            "/api",
            Router::new()
                .route("/dashboard-data", get(dashboard_data))
                .route_layer(guard),
        )
        .with_state(app_state)
}
