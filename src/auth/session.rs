use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::store::{MemorySessionStore, SessionStore, StoredSession};
use crate::errors::ServiceError;
use crate::models::User;

/// An authenticated identity and the bearer token that proves it.
#[derive(Clone, PartialEq, Serialize)]
pub struct Session {
    pub user: User,
    #[serde(skip_serializing)]
    pub token: String,
    pub token_type: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user.email)
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

impl Session {
    fn to_stored(&self) -> StoredSession {
        StoredSession {
            access_token: self.token.clone(),
            token_type: self.token_type.clone(),
            user: self.user.clone(),
            saved_at: Utc::now(),
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            user: stored.user,
            token: stored.access_token,
            token_type: stored.token_type,
        }
    }
}

#[derive(Clone, Debug, PartialEq, strum::Display)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated(Session),
    Failed(String),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Shared view of the current session.
///
/// Cheap to clone; every clone observes the same state. Only the auth
/// service and the HTTP client's 401 handling change it.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<RwLock<AuthState>>,
    store: Arc<dyn SessionStore>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle").finish_non_exhaustive()
    }
}

impl SessionHandle {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            state: Arc::new(RwLock::new(AuthState::Anonymous)),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.session().map(|s| s.token.clone())
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.session().map(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(*self.state.read().await, AuthState::Authenticated(_))
    }

    pub async fn is_admin(&self) -> bool {
        self.state
            .read()
            .await
            .session()
            .map(|s| s.user.is_admin())
            .unwrap_or(false)
    }

    pub(crate) fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub(crate) async fn begin_login(&self) {
        *self.state.write().await = AuthState::Authenticating;
    }

    pub(crate) async fn fail(&self, message: impl Into<String>) {
        *self.state.write().await = AuthState::Failed(message.into());
    }

    /// Enters `Authenticated` and persists the credentials.
    pub(crate) async fn establish(&self, session: Session) -> Result<(), ServiceError> {
        let stored = session.to_stored();
        *self.state.write().await = AuthState::Authenticated(session);
        self.store.save(&stored).await
    }

    /// Enters `Authenticated` from persisted credentials without rewriting them.
    pub(crate) async fn resume(&self, stored: StoredSession) {
        *self.state.write().await = AuthState::Authenticated(Session::from(stored));
    }

    /// Replaces the cached user, keeping the token.
    pub(crate) async fn replace_user(&self, user: User) -> Result<(), ServiceError> {
        let stored = {
            let mut state = self.state.write().await;
            match &mut *state {
                AuthState::Authenticated(session) => {
                    session.user = user;
                    session.to_stored()
                }
                _ => {
                    return Err(ServiceError::InvalidOperation(
                        "no active session".to_string(),
                    ))
                }
            }
        };
        self.store.save(&stored).await
    }

    /// Like [`expire`](Self::expire), but only while `token` is still the
    /// held token. A stale rejection must not end a newer session.
    pub(crate) async fn expire_if_current(&self, token: &str) -> bool {
        {
            let mut state = self.state.write().await;
            match &*state {
                AuthState::Authenticated(session) if session.token == token => {
                    *state = AuthState::Anonymous;
                }
                _ => return false,
            }
        }
        info!("session cleared");
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear persisted session");
        }
        true
    }

    /// Drops the session in memory and on disk. Storage failures are logged;
    /// the in-memory state is always reset.
    pub(crate) async fn expire(&self) {
        let was_authenticated = {
            let mut state = self.state.write().await;
            let was = matches!(*state, AuthState::Authenticated(_));
            *state = AuthState::Anonymous;
            was
        };
        if was_authenticated {
            info!("session cleared");
        }
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear persisted session");
        }
    }
}
