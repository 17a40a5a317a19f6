//! Token persistence in `localStorage`.

use comicshelf_client::{Session, StorageError, TokenStorage};
use gloo::storage::errors::StorageError as BrowserStorageError;
use gloo::storage::{LocalStorage, Storage};

pub(crate) const ACCESS_KEY: &str = "comicshelf.auth.access";
pub(crate) const REFRESH_KEY: &str = "comicshelf.auth.refresh";

/// [`TokenStorage`] over the page's `localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LocalTokenStorage;

fn read(key: &str) -> Result<Option<String>, StorageError> {
    match LocalStorage::get::<String>(key) {
        Ok(value) => Ok(Some(value)),
        Err(BrowserStorageError::KeyNotFound(_)) => Ok(None),
        Err(BrowserStorageError::SerdeError(err)) => Err(StorageError::Corrupt(err.to_string())),
        Err(err) => Err(StorageError::Unavailable(err.to_string())),
    }
}

fn write(key: &str, value: Option<&str>) -> Result<(), StorageError> {
    match value {
        Some(value) => LocalStorage::set(key, value)
            .map_err(|err| StorageError::Unavailable(err.to_string())),
        None => {
            LocalStorage::delete(key);
            Ok(())
        }
    }
}

impl TokenStorage for LocalTokenStorage {
    fn load(&self) -> Result<Session, StorageError> {
        Ok(Session::new(read(ACCESS_KEY)?, read(REFRESH_KEY)?))
    }

    fn save(&self, session: &Session) -> Result<(), StorageError> {
        write(ACCESS_KEY, session.access_token())?;
        write(REFRESH_KEY, session.refresh_token())
    }

    fn clear(&self) -> Result<(), StorageError> {
        LocalStorage::delete(ACCESS_KEY);
        LocalStorage::delete(REFRESH_KEY);
        Ok(())
    }
}
