use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};

use super::ClientError;
use crate::cart::CartData;

/// What survives a restart on the client: the session token and the cart
/// collected while signed out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub guest_cart: CartData,
}

pub trait GuestStorage: Send + Sync {
    fn load(&self) -> Result<StoredSession, ClientError>;

    fn store(&self, session: &StoredSession) -> Result<(), ClientError>;

    fn update(&self, f: impl FnOnce(&mut StoredSession)) -> Result<(), ClientError>
    where
        Self: Sized,
    {
        let mut session = self.load()?;
        f(&mut session);
        self.store(&session)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<StoredSession>,
}

impl MemoryStorage {
    pub fn new(session: StoredSession) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }
}

impl GuestStorage for MemoryStorage {
    fn load(&self) -> Result<StoredSession, ClientError> {
        self.inner
            .lock()
            .map(|session| session.clone())
            .map_err(|_| ClientError::Storage("memory storage poisoned".into()))
    }

    fn store(&self, session: &StoredSession) -> Result<(), ClientError> {
        let mut slot = self
            .inner
            .lock()
            .map_err(|_| ClientError::Storage("memory storage poisoned".into()))?;
        *slot = session.clone();
        Ok(())
    }
}

/// JSON file on disk. A missing file reads as an empty session.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GuestStorage for FileStorage {
    fn load(&self) -> Result<StoredSession, ClientError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(StoredSession::default()),
            Err(err) => Err(storage_error(&self.path, err)),
        }
    }

    fn store(&self, session: &StoredSession) -> Result<(), ClientError> {
        let bytes = serde_json::to_vec_pretty(session)?;
        write_atomic(&self.path, &bytes).map_err(|err| storage_error(&self.path, err))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

fn storage_error(path: &Path, err: io::Error) -> ClientError {
    ClientError::Storage(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("guest-storage-{}", uuid::Uuid::new_v4()));
        let path = dir.join("session.json");

        let storage = FileStorage::new(&path);
        assert_eq!(storage.load().unwrap(), StoredSession::default());

        storage
            .update(|session| {
                session.token = Some("abc".into());
                session.guest_cart.add_one("p1", "M").unwrap();
            })
            .unwrap();

        let reopened = FileStorage::new(&path).load().unwrap();
        assert_eq!(reopened.token.as_deref(), Some("abc"));
        assert_eq!(reopened.guest_cart.quantity("p1", "M"), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn memory_storage_round_trips() {
        let storage = MemoryStorage::default();
        storage
            .update(|session| session.token = Some("t".into()))
            .unwrap();
        assert_eq!(storage.load().unwrap().token.as_deref(), Some("t"));
    }
}
