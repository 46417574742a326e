// Gateway module - controls public API for handlers
// Modules are private, only exported symbols are public

mod authentication;
mod guard;
mod health;
mod metrics;
mod protected;
mod registration;
mod session;
mod shared_types;

pub use health::health_check;
pub use metrics::metrics_handler;

pub use authentication::{login_finish, login_start};
pub use guard::require_session;
pub use protected::dashboard_data;
pub use registration::{register_finish, register_start};
pub use session::{logout, me};
