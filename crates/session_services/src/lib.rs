//! # Session Services
//!
//! This crate owns the authenticated identity of a Kheyma client.
//! It normalizes the user shapes the backend sends, persists the session in
//! a durable key/value store, restores and validates it on start, and
//! clears it on logout or when the gateway reports a rejected token.

/// Canonical identity and the normalization of backend user shapes.
pub mod identity;
/// Navigation targets emitted by session and checkout flows.
pub mod navigation;
/// Durable key/value stores for the persisted session.
pub mod store;
/// Session state machine and the shared session handle.
pub mod state;
/// Login, registration, bootstrap and logout operations.
pub mod manager;

pub use identity::{Identity, Role, UserShape, identity_from_auth, normalize};
pub use manager::{AuthFailure, SessionManager};
pub use navigation::{Navigator, Route, RouteHistory};
pub use state::{Credentials, SessionHandle, SessionState};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
