use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ServiceError;
use crate::models::User;

/// Credentials persisted between runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
    pub saved_at: DateTime<Utc>,
}

/// Where the session survives process restarts.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<StoredSession>, ServiceError>;
    async fn save(&self, session: &StoredSession) -> Result<(), ServiceError>;
    async fn clear(&self) -> Result<(), ServiceError>;
}

/// JSON file store, `~/.cellar/session.json` unless overridden.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolves the default location from `CELLAR_CLI_HOME` or `HOME`.
    pub fn default_location() -> Option<Self> {
        default_session_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn default_session_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("CELLAR_CLI_HOME") {
        let mut path = PathBuf::from(dir);
        if path.extension().is_none() {
            path.push("session.json");
        }
        return Some(path);
    }

    std::env::var("HOME").ok().map(|home| {
        let mut path = PathBuf::from(home);
        path.push(".cellar");
        path.push("session.json");
        path
    })
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, ServiceError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(ServiceError::Storage(format!(
                    "failed to read session file {}: {err}",
                    self.path.display()
                )))
            }
        };
        let session = serde_json::from_str(&data).map_err(|err| {
            ServiceError::Storage(format!(
                "failed to parse session file {}: {err}",
                self.path.display()
            ))
        })?;
        Ok(Some(session))
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ServiceError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                ServiceError::Storage(format!(
                    "failed creating directory {}: {err}",
                    parent.display()
                ))
            })?;
        }
        let payload = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, payload).await.map_err(|err| {
            ServiceError::Storage(format!("failed writing {}: {err}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "session persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<(), ServiceError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ServiceError::Storage(format!(
                "failed to remove {}: {err}",
                self.path.display()
            ))),
        }
    }
}

/// Process-local store; nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<StoredSession>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, ServiceError> {
        Ok(self.lock().clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ServiceError> {
        *self.lock() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ServiceError> {
        *self.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn stored() -> StoredSession {
        StoredSession {
            access_token: "tok-123".into(),
            token_type: "bearer".into(),
            user: User {
                id: 1,
                email: "admin@cellar.test".into(),
                name: "Admin".into(),
                role: UserRole::Admin,
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            saved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load().await.unwrap().is_none());
        let session = stored();
        store.save(&session).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileSessionStore::new(path);
        assert!(matches!(store.load().await, Err(ServiceError::Storage(_))));
    }

    #[tokio::test]
    async fn memory_store_holds_one_session() {
        let store = MemorySessionStore::new();
        store.save(&stored()).await.unwrap();
        assert!(store.load().await.unwrap().is_some());
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
