//! Persistence of the signed-in session between runs

use common::identity::AuthSession;
use mockall::automock;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

use crate::error::{AuthError, AuthResult};

/// Where the current session is kept
#[automock]
pub trait SessionStore: Send + Sync {
    fn load(&self) -> AuthResult<Option<AuthSession>>;
    fn save(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear(&self) -> AuthResult<()>;
}

/// Session stored as JSON in a file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> AuthResult<Option<AuthSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, session: &AuthSession) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(&self.path, serde_json::to_string_pretty(session)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        info!("Session saved to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> AuthResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session kept in memory only
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<AuthSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> AuthResult<Option<AuthSession>> {
        let slot = self.slot.lock().map_err(poisoned)?;
        Ok(slot.clone())
    }

    fn save(&self, session: &AuthSession) -> AuthResult<()> {
        let mut slot = self.slot.lock().map_err(poisoned)?;
        *slot = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> AuthResult<()> {
        let mut slot = self.slot.lock().map_err(poisoned)?;
        *slot = None;
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AuthError {
    AuthError::SessionStorage("session lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::identity::AuthUser;
    use uuid::Uuid;

    fn session() -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
            user: AuthUser {
                id: Uuid::new_v4(),
                email: "ada@example.com".to_string(),
            },
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested/session.json"));

        assert!(store.load().unwrap().is_none());

        let session = session();
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileSessionStore::new(&path).load().unwrap_err();
        assert!(matches!(err, AuthError::SessionStorage(_)));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        store.save(&session()).unwrap();
        assert!(store.load().unwrap().is_some());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
