//! Client core for the role-based admin/member service portal.
//!
//! Decodes the bearer token into an auth session, guards navigation across
//! the admin and member route trees, and talks to the portal API through an
//! authenticated client whose 401 handling ends the session.

pub mod auth;
pub mod config;
pub mod net;
pub mod router;
pub mod storage;
pub mod stores;

pub use auth::{AuthSession, AuthState, Claims, Role};
pub use config::PortalConfig;
pub use net::{ApiClient, ApiError};
pub use router::{GuardDecision, Navigator, RouteTable, guard};
pub use storage::TokenStore;
pub use stores::{ProfileStore, ServicesStore};
