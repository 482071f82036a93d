//! Token decoding and the authentication session state machine.

pub mod claims;
pub mod state;

pub use claims::{Claims, DecodeError, Role, UnknownRole, decode};
pub use state::{AuthError, AuthSession, AuthState, now_millis};
