//! Access/refresh credential store
//!
//! The store is injected into the HTTP client rather than reached through
//! globals, so tests can hand it a `MemoryBackend` or a failing double.

use std::sync::Arc;

use common::Secret;
use tracing::{debug, info, warn};

use crate::backend::{BackendConfig, SecretBackend, SecretKey};
use crate::error::Result;
use crate::memory::MemoryBackend;

/// Both stored credentials, read together.
#[derive(Debug, Clone, Default)]
pub struct CredentialPair {
    pub access: Option<Secret<String>>,
    pub refresh: Option<Secret<String>>,
}

/// Durable key-value surface for the two credentials.
///
/// Cloning is cheap and every clone shares the same backend. Writes are
/// last-write-wins; there is no locking beyond what the backend does.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn SecretBackend>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn SecretBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Open the backend named by the startup configuration.
    pub async fn open(config: &BackendConfig) -> Result<Self> {
        let backend = config.open().await?;
        info!(backend = backend.id(), "credential store ready");
        Ok(Self::new(backend))
    }

    pub fn backend_id(&self) -> &str {
        self.backend.id()
    }

    pub async fn get_access(&self) -> Option<Secret<String>> {
        self.read(SecretKey::Access).await
    }

    pub async fn get_refresh(&self) -> Option<Secret<String>> {
        self.read(SecretKey::Refresh).await
    }

    pub async fn set_access(&self, token: &str) -> Result<()> {
        self.backend.write(SecretKey::Access, token).await
    }

    pub async fn set_refresh(&self, token: &str) -> Result<()> {
        self.backend.write(SecretKey::Refresh, token).await
    }

    /// Store a fresh session, as produced by the login exchange.
    pub async fn set_pair(&self, access: &str, refresh: &str) -> Result<()> {
        self.set_access(access).await?;
        self.set_refresh(refresh).await
    }

    /// Remove both credentials.
    ///
    /// Safe to call when already empty. Backend failures are logged and the
    /// remaining secret is still attempted.
    pub async fn clear(&self) {
        for key in SecretKey::ALL {
            if let Err(e) = self.backend.remove(key).await {
                warn!(backend = self.backend.id(), secret = key.name(), error = %e, "failed to remove credential");
            }
        }
        debug!(backend = self.backend.id(), "credentials cleared");
    }

    pub async fn is_logged_in(&self) -> bool {
        self.get_access().await.is_some()
    }

    pub async fn snapshot(&self) -> CredentialPair {
        CredentialPair {
            access: self.get_access().await,
            refresh: self.get_refresh().await,
        }
    }

    /// Read a secret, treating backend errors and empty values as absent.
    async fn read(&self, key: SecretKey) -> Option<Secret<String>> {
        match self.backend.read(key).await {
            Ok(value) => value.filter(|v| !v.is_empty()).map(Secret::new),
            Err(e) => {
                warn!(backend = self.backend.id(), secret = key.name(), error = %e, "credential read failed, treating as absent");
                None
            }
        }
    }
}
