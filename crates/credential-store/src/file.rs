//! File-backed secret storage
//!
//! Keeps both secrets in a small JSON object on disk. All writes use atomic
//! temp-file + rename and a tokio Mutex serializes them, so a refresh racing
//! a logout never leaves a half-written file behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::backend::{BoxFuture, SecretBackend, SecretKey};
use crate::error::{Error, Result};

/// JSON credential file, keyed by `SecretKey::name()`.
pub struct FileBackend {
    path: PathBuf,
    state: Mutex<HashMap<String, String>>,
}

impl FileBackend {
    /// Load secrets from the given file path.
    ///
    /// A missing file is created as `{}` (logged out), along with its parent
    /// directory.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let secrets: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::Parse(format!("parsing credential file: {e}")))?;
            info!(path = %path.display(), secrets = secrets.len(), "loaded credential file");
            secrets
        } else {
            info!(path = %path.display(), "credential file not found, starting logged out");
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| Error::Io(format!("creating credential directory: {e}")))?;
            }
            let secrets = HashMap::new();
            write_atomic(&path, &secrets).await?;
            secrets
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }
}

impl SecretBackend for FileBackend {
    fn id(&self) -> &str {
        "file"
    }

    fn read(&self, key: SecretKey) -> BoxFuture<'_, Result<Option<String>>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state.get(key.name()).cloned())
        })
    }

    fn write<'a>(&'a self, key: SecretKey, value: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.insert(key.name().to_owned(), value.to_owned());
            debug!(secret = key.name(), "stored secret");
            write_atomic(&self.path, &state).await
        })
    }

    fn remove(&self, key: SecretKey) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.remove(key.name()).is_some() {
                debug!(secret = key.name(), "removed secret");
                write_atomic(&self.path, &state).await?;
            }
            Ok(())
        })
    }
}

/// Write secrets to a file atomically with 0600 permissions (unix).
async fn write_atomic(path: &Path, data: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Parse(format!("serializing credentials: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("credentials");
    let tmp_path = dir.join(format!(".{file_name}.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credential file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let backend = FileBackend::load(path.clone()).await.unwrap();
        backend.write(SecretKey::Access, "A1").await.unwrap();
        backend.write(SecretKey::Refresh, "R1").await.unwrap();

        let reloaded = FileBackend::load(path).await.unwrap();
        assert_eq!(
            reloaded.read(SecretKey::Access).await.unwrap().as_deref(),
            Some("A1")
        );
        assert_eq!(
            reloaded.read(SecretKey::Refresh).await.unwrap().as_deref(),
            Some("R1")
        );
    }

    #[tokio::test]
    async fn cold_start_creates_empty_file_and_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        let backend = FileBackend::load(path.clone()).await.unwrap();
        assert!(path.exists());
        assert!(backend.read(SecretKey::Access).await.unwrap().is_none());

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: HashMap<String, String> = serde_json::from_str(&contents).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn remove_missing_secret_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::load(dir.path().join("credentials.json"))
            .await
            .unwrap();

        backend.remove(SecretKey::Refresh).await.unwrap();
        backend.remove(SecretKey::Refresh).await.unwrap();
    }

    #[tokio::test]
    async fn remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let backend = FileBackend::load(path.clone()).await.unwrap();
        backend.write(SecretKey::Access, "A1").await.unwrap();
        backend.remove(SecretKey::Access).await.unwrap();

        let reloaded = FileBackend::load(path).await.unwrap();
        assert!(reloaded.read(SecretKey::Access).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let result = FileBackend::load(path).await;
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let backend = FileBackend::load(path.clone()).await.unwrap();
        backend.write(SecretKey::Access, "A1").await.unwrap();

        let metadata = tokio::fs::metadata(&path).await.unwrap();
        let mode = metadata.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "credential file must be 0600, got {mode:o}");
    }
}
