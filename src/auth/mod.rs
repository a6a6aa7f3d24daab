//! Session state and the operations that move it.
//!
//! [`SessionHandle`] is the single owner of "who is logged in". It is
//! injected into the HTTP client and services; only [`AuthService`] and the
//! client's 401 handling mutate it.

pub mod service;
pub mod session;
pub mod store;

pub use service::AuthService;
pub use session::{AuthState, Session, SessionHandle};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession};
