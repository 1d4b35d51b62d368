//! Backend abstraction for secret persistence
//!
//! Defines the `SecretBackend` trait that decouples `CredentialStore` from the
//! platform storage mechanism. Uses `Pin<Box<dyn Future>>` return types so the
//! store can hold an `Arc<dyn SecretBackend>` chosen at startup.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;
use crate::{FileBackend, KeyringBackend, MemoryBackend};

/// Boxed future returned by backend operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The two named secrets the application persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKey {
    Access,
    Refresh,
}

impl SecretKey {
    pub const ALL: [SecretKey; 2] = [SecretKey::Access, SecretKey::Refresh];

    /// Storage name of the secret, shared by every backend.
    pub fn name(self) -> &'static str {
        match self {
            SecretKey::Access => "access_token",
            SecretKey::Refresh => "refresh_token",
        }
    }
}

/// Platform storage for named secrets.
///
/// `remove` must succeed when the secret is already absent.
pub trait SecretBackend: Send + Sync {
    /// Identifier for logging (e.g. "keyring", "file", "memory")
    fn id(&self) -> &str;

    fn read(&self, key: SecretKey) -> BoxFuture<'_, Result<Option<String>>>;

    fn write<'a>(&'a self, key: SecretKey, value: &'a str) -> BoxFuture<'a, Result<()>>;

    fn remove(&self, key: SecretKey) -> BoxFuture<'_, Result<()>>;
}

/// Backend selection, resolved once from configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Platform secure storage under the given service name.
    Keyring { service: String },
    /// JSON credential file at the given path.
    File { path: PathBuf },
    /// Process-local storage; nothing survives exit.
    Memory,
}

impl BackendConfig {
    /// Construct the configured backend.
    pub async fn open(&self) -> Result<Arc<dyn SecretBackend>> {
        let backend: Arc<dyn SecretBackend> = match self {
            BackendConfig::Keyring { service } => Arc::new(KeyringBackend::new(service)?),
            BackendConfig::File { path } => Arc::new(FileBackend::load(path.clone()).await?),
            BackendConfig::Memory => Arc::new(MemoryBackend::new()),
        };
        Ok(backend)
    }
}
