//! Session persistence for the CLI: a small JSON file in the user's config dir.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use comicshelf_client::{Session, StorageError, TokenStorage};

/// Directory name under the platform config dir.
const APP_DIR: &str = "comicshelf";
/// Session file name.
const SESSION_FILE: &str = "session.json";

/// Default session file location, when the platform has a config dir.
pub(crate) fn default_session_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SESSION_FILE))
}

/// [`TokenStorage`] backed by a JSON file.
#[derive(Debug, Clone)]
pub(crate) struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Session, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Session::default()),
            Err(err) => {
                return Err(StorageError::Unavailable(format!(
                    "failed to read '{}': {err}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&text).map_err(|err| {
            StorageError::Corrupt(format!("'{}': {err}", self.path.display()))
        })
    }

    fn save(&self, session: &Session) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                StorageError::Unavailable(format!(
                    "failed to create '{}': {err}",
                    parent.display()
                ))
            })?;
        }
        let text = serde_json::to_string_pretty(session)
            .map_err(|err| StorageError::Corrupt(err.to_string()))?;
        fs::write(&self.path, text).map_err(|err| {
            StorageError::Unavailable(format!("failed to write '{}': {err}", self.path.display()))
        })?;
        restrict_permissions(&self.path)
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Unavailable(format!(
                "failed to remove '{}': {err}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|err| {
        StorageError::Unavailable(format!(
            "failed to restrict permissions on '{}': {err}",
            path.display()
        ))
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), StorageError> {
    Ok(())
}
