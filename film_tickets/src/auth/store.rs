//! Durable session persistence.
//!
//! [`SessionStore`] keeps two entries in a [`Storage`] backend: the bearer
//! token under [`TOKEN_KEY`] and the JSON-encoded principal under
//! [`USER_KEY`]. Both are written in one storage call and removed in one
//! storage call, so no reader ever observes one without the other.

use std::{
    collections::{BTreeMap, HashMap},
    fmt, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::{
    errors::StorageError,
    models::{Principal, Session},
};

pub const TOKEN_KEY: &str = "accessToken";
pub const USER_KEY: &str = "user";

/// String key/value backend for the session store.
///
/// Implementations must apply each `set_many`/`remove_many` call as a unit.
pub trait Storage: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;
    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}

/// Process-local storage. Lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let mut map = self.entries();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut map = self.entries();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// Storage backed by a single JSON document on disk.
///
/// Every mutation rewrites the whole document through a temporary file and
/// a rename, which makes multi-key updates atomic on the same filesystem.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Discarding unreadable session file"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_all()?;
        apply(&mut map);
        self.write_all(&map)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        self.update(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), value.clone());
            }
        })
    }

    /// Falls back to deleting the document when it cannot be rewritten, so
    /// removal always takes effect if the file itself can be removed.
    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let rewritten = self.update(|map| {
            for key in keys {
                map.remove(*key);
            }
        });
        let Err(e) = rewritten else {
            return Ok(());
        };

        tracing::warn!(
            path = %self.path.display(),
            error = %e,
            "Rewrite failed, removing session file"
        );
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(io) if io.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(_) => Err(e),
        }
    }
}

/// Shared handle to the persisted session.
///
/// Cloning is cheap; all clones see the same backend.
#[derive(Clone, Debug)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(FileStorage::new(path))
    }

    /// Stored bearer token. Only returned together with a readable principal.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session().map(|s| s.token)
    }

    /// Stored principal. Only returned together with a token.
    #[must_use]
    pub fn user(&self) -> Option<Principal> {
        self.session().map(|s| s.principal)
    }

    /// Write token and principal together.
    pub fn save_session(&self, token: &str, principal: &Principal) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(principal)?;
        self.storage
            .set_many(&[(TOKEN_KEY, token.to_string()), (USER_KEY, encoded)])
    }

    /// Replace the stored principal after a profile update.
    ///
    /// Returns `false` without writing when there is no session to update.
    pub fn update_user(&self, principal: &Principal) -> Result<bool, StorageError> {
        if !self.is_authenticated() {
            return Ok(false);
        }
        let encoded = serde_json::to_string(principal)?;
        self.storage.set_many(&[(USER_KEY, encoded)])?;
        Ok(true)
    }

    /// Remove token and principal together.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_many(&[TOKEN_KEY, USER_KEY])
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// Token and principal, or nothing.
    ///
    /// A half-present or unreadable pair is treated as no session and is
    /// removed from storage.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        let token = self.read(TOKEN_KEY);
        let user = self.read(USER_KEY);

        let principal = match (&token, user) {
            (None, None) => return None,
            (Some(_), Some(raw)) => match serde_json::from_str::<Principal>(&raw) {
                Ok(principal) => Some(principal),
                Err(e) => {
                    tracing::warn!(error = %e, "Stored session user is corrupt");
                    None
                }
            },
            _ => {
                tracing::warn!("Stored session is incomplete");
                None
            }
        };

        match (token, principal) {
            (Some(token), Some(principal)) => Some(Session { token, principal }),
            _ => {
                if let Err(e) = self.clear() {
                    tracing::warn!(error = %e, "Failed to discard broken session");
                }
                None
            }
        }
    }

    /// Storage failures read as "absent".
    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read session entry");
                None
            }
        }
    }
}
