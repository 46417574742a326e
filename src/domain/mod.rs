mod error;
mod metrics;
mod models;
mod repository;
mod session_store;
mod verifier;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Error taxonomy
pub use error::{CeremonyError, CeremonyResult, ErrorCategory};

// Ceremony data model
pub use models::{
    AuthenticatedSession, CeremonyKind, CeremonySubject, Credential, PendingCeremony,
    SessionIdentity, SessionToken, Transport, User,
};

// Collaborator abstractions
pub use repository::{CredentialRepository, RepositoryError, RepositoryPtr};
pub use session_store::{SessionStore, SessionStorePtr};
pub use verifier::{
    AttestedCredential, AuthenticationResponse, CeremonyVerifier, ClientData, Expectations,
    RegistrationResponse, VerificationError, VerifierPtr,
};
