// Test helpers are intentionally partially used
#![allow(dead_code)]

use passkey_ceremony::ceremony::{
    AuthenticationOptions, CeremonyService, RegistrationOptions, ServiceDeps,
};
use passkey_ceremony::domain::{
    AuthenticationResponse, ClientData, MetricsPtr, RegistrationResponse, RepositoryPtr,
    Transport,
};
use passkey_ceremony::{
    codec, create_noop_metrics, create_router, digest_signature, AppConfig, BackendConfig,
    CeremonyConfig, DigestAttestation, DigestVerifier, MemoryRepository, MemorySessionStore,
    RelyingPartyConfig, ServerConfig, SessionConfig,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

pub const RP_ID: &str = "localhost";
pub const ORIGIN: &str = "http://localhost:8080";

// ============================================================================
// Service harness
// ============================================================================

pub fn relying_party() -> RelyingPartyConfig {
    RelyingPartyConfig::new(RP_ID, "Test App", ORIGIN).expect("valid relying party")
}

pub fn test_config(ceremony: CeremonyConfig) -> AppConfig {
    // ---
    AppConfig {
        relying_party: relying_party(),
        ceremony,
        session: SessionConfig::default(),
        backend: BackendConfig::Memory,
        server: ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            metrics_type: "noop".to_string(),
            verifier: Some("digest".to_string()),
        },
    }
}

/// Service on in-memory backends, with the backends kept for inspection.
pub struct Harness {
    pub service: Arc<CeremonyService>,
    pub repository: Arc<MemoryRepository>,
    pub sessions: Arc<MemorySessionStore>,
}

impl Harness {
    // ---
    pub fn new() -> Self {
        Self::with(CeremonyConfig::default(), SessionConfig::default())
    }

    pub fn with(ceremony: CeremonyConfig, session: SessionConfig) -> Self {
        Self::with_metrics(ceremony, session, create_noop_metrics().unwrap())
    }

    pub fn with_metrics(ceremony: CeremonyConfig, session: SessionConfig, metrics: MetricsPtr) -> Self {
        Self::build(ceremony, session, metrics, |repository| repository as RepositoryPtr)
    }

    /// Service whose repository is `wrap` applied to the inspected memory one.
    pub fn wrapping(wrap: impl FnOnce(Arc<MemoryRepository>) -> RepositoryPtr) -> Self {
        Self::build(
            CeremonyConfig::default(),
            SessionConfig::default(),
            create_noop_metrics().unwrap(),
            wrap,
        )
    }

    fn build(
        ceremony: CeremonyConfig,
        session: SessionConfig,
        metrics: MetricsPtr,
        wrap: impl FnOnce(Arc<MemoryRepository>) -> RepositoryPtr,
    ) -> Self {
        // ---
        let repository = Arc::new(MemoryRepository::new());
        let sessions = Arc::new(MemorySessionStore::new());

        let deps = ServiceDeps {
            repository: wrap(repository.clone()),
            sessions: sessions.clone(),
            verifier: Arc::new(DigestVerifier),
            metrics,
        };
        let service = CeremonyService::new(deps, relying_party(), ceremony, session);

        Self {
            service: Arc::new(service),
            repository,
            sessions,
        }
    }
}

pub fn challenge_of_registration(options: &RegistrationOptions) -> Vec<u8> {
    codec::decode(&options.challenge).expect("challenge is base64url")
}

pub fn challenge_of_authentication(options: &AuthenticationOptions) -> Vec<u8> {
    codec::decode(&options.challenge).expect("challenge is base64url")
}

// ============================================================================
// Simulated authenticator
// ============================================================================

/// Authenticator producing responses the digest verifier accepts.
#[derive(Debug, Clone)]
pub struct SimulatedAuthenticator {
    pub credential_id: Vec<u8>,
    pub secret: Vec<u8>,
    pub counter: u32,
    /// Counterless authenticators always assert 0.
    pub counting: bool,
    pub origin: String,
    pub rp_id: String,
}

impl SimulatedAuthenticator {
    // ---
    pub fn new(credential_id: &str) -> Self {
        Self {
            credential_id: credential_id.as_bytes().to_vec(),
            secret: format!("secret-{credential_id}").into_bytes(),
            counter: 0,
            counting: true,
            origin: ORIGIN.to_string(),
            rp_id: RP_ID.to_string(),
        }
    }

    pub fn counterless(credential_id: &str) -> Self {
        Self {
            counting: false,
            ..Self::new(credential_id)
        }
    }

    fn client_data(&self, challenge: &[u8]) -> ClientData {
        ClientData {
            challenge: challenge.to_vec(),
            origin: self.origin.clone(),
            rp_id: self.rp_id.clone(),
        }
    }

    /// Attest this credential over `challenge`.
    pub fn register(&self, challenge: &[u8]) -> RegistrationResponse {
        // ---
        let attestation = DigestAttestation {
            credential_id: codec::encode(&self.credential_id),
            public_key: codec::encode(&self.secret),
            challenge: codec::encode(challenge),
            origin: self.origin.clone(),
            rp_id: self.rp_id.clone(),
        };

        RegistrationResponse {
            client_data: self.client_data(challenge),
            attestation_object: serde_json::to_vec(&attestation).unwrap(),
            transports: vec![Transport::Internal],
        }
    }

    /// Sign `challenge`, advancing the counter first when counting.
    pub fn assert(&mut self, challenge: &[u8]) -> AuthenticationResponse {
        // ---
        if self.counting {
            self.counter += 1;
        }
        self.assert_with_counter(challenge, self.counter)
    }

    /// Sign `challenge` asserting an explicit counter.
    pub fn assert_with_counter(&self, challenge: &[u8], counter: u32) -> AuthenticationResponse {
        // ---
        let authenticator_data = counter.to_be_bytes().to_vec();
        let client_data = self.client_data(challenge);
        AuthenticationResponse {
            credential_id: self.credential_id.clone(),
            signature: digest_signature(&self.secret, &authenticator_data, &client_data),
            client_data,
            authenticator_data,
            user_handle: None,
        }
    }
}

// ============================================================================
// HTTP test server
// ============================================================================

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub client: Client,
}

impl TestServer {
    // ---
    pub async fn new(service: Arc<CeremonyService>) -> Self {
        // ---
        let app = create_router(service);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Spawn the server in the background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start
        sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self { addr, client }
    }

    pub fn url(&self, path: &str) -> String {
        // ---
        format!("http://{}{}", self.addr, path)
    }
}
