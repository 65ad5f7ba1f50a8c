//! API key storage.
//!
//! Lookup order for the key used by `generate`:
//! 1. `GEMINI_API_KEY` environment variable
//! 2. The credential file written by `commitwright set-key`

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::APP_DIR;
use crate::error::CredentialError;

/// Environment variable that takes precedence over the stored key.
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

/// Opaque secret storage. The pipeline only needs a string back.
pub trait CredentialStore {
    fn get(&self) -> Result<Option<String>, CredentialError>;
    fn store(&self, secret: &str) -> Result<(), CredentialError>;
    fn delete(&self) -> Result<(), CredentialError>;
}

/// Stores the key in a single file, readable only by the owner on Unix.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/commitwright/credentials`.
    pub fn default_location() -> Result<Self, CredentialError> {
        let dir = dirs::config_dir().ok_or(CredentialError::NoConfigDir)?;
        Ok(Self::new(dir.join(APP_DIR).join("credentials")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> CredentialError {
        CredentialError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<String>, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let key = content.trim();
                Ok((!key.is_empty()).then(|| key.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CredentialError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Write atomically: a temp file in the same directory is renamed over the target.
    fn store(&self, secret: &str) -> Result<(), CredentialError> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| self.write_error(std::io::Error::other("credential path has no parent")))?;
        std::fs::create_dir_all(dir).map_err(|e| self.write_error(e))?;

        let mut file = NamedTempFile::new_in(dir).map_err(|e| self.write_error(e))?;
        restrict_permissions(file.path()).map_err(|e| self.write_error(e))?;
        file.write_all(secret.trim().as_bytes())
            .map_err(|e| self.write_error(e))?;
        file.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        debug!("Stored API key at {}", self.path.display());
        Ok(())
    }

    fn delete(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.write_error(e)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Resolve the API key: environment first, then the store.
pub fn resolve_api_key(store: &dyn CredentialStore) -> Result<Option<String>, CredentialError> {
    if let Ok(key) = env::var(ENV_API_KEY)
        && !key.trim().is_empty()
    {
        debug!("Using API key from {}", ENV_API_KEY);
        return Ok(Some(key.trim().to_string()));
    }
    store.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nope"));
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_store_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("sub").join("credentials"));

        store.store("  abc123\n").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("abc123"));

        store.store("rotated").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("rotated"));

        store.delete().unwrap();
        assert_eq!(store.get().unwrap(), None);
        // Deleting twice is fine.
        store.delete().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_stored_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials"));
        store.store("secret").unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    #[serial]
    fn test_env_key_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials"));
        store.store("from-file").unwrap();

        temp_env::with_var(ENV_API_KEY, Some("from-env"), || {
            assert_eq!(resolve_api_key(&store).unwrap().as_deref(), Some("from-env"));
        });
        temp_env::with_var_unset(ENV_API_KEY, || {
            assert_eq!(resolve_api_key(&store).unwrap().as_deref(), Some("from-file"));
        });
    }

    #[test]
    #[serial]
    fn test_blank_env_key_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials"));

        temp_env::with_var(ENV_API_KEY, Some("  "), || {
            assert_eq!(resolve_api_key(&store).unwrap(), None);
        });
    }
}
