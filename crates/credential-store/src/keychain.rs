//! Platform secure storage via the OS keyring
//!
//! Each secret lives in its own keyring entry under a shared service name,
//! with the secret name as the entry's user. Entries are created once and
//! reused. Keyring calls block, so they run on the blocking thread pool.

use std::sync::Arc;

use keyring::Entry;
use tracing::debug;

use crate::backend::{BoxFuture, SecretBackend, SecretKey};
use crate::error::{Error, Result};

pub struct KeyringBackend {
    service: String,
    access: Arc<Entry>,
    refresh: Arc<Entry>,
}

impl KeyringBackend {
    pub fn new(service: &str) -> Result<Self> {
        let entry = |key: SecretKey| {
            Entry::new(service, key.name())
                .map(Arc::new)
                .map_err(|e| Error::Backend(format!("creating keyring entry {}: {e}", key.name())))
        };
        Ok(Self {
            service: service.to_owned(),
            access: entry(SecretKey::Access)?,
            refresh: entry(SecretKey::Refresh)?,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: SecretKey) -> Arc<Entry> {
        match key {
            SecretKey::Access => self.access.clone(),
            SecretKey::Refresh => self.refresh.clone(),
        }
    }
}

/// Run a blocking keyring call off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Backend(format!("keyring task failed: {e}")))?
}

impl SecretBackend for KeyringBackend {
    fn id(&self) -> &str {
        "keyring"
    }

    fn read(&self, key: SecretKey) -> BoxFuture<'_, Result<Option<String>>> {
        let entry = self.entry(key);
        Box::pin(blocking(move || match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Backend(format!("reading {}: {e}", key.name()))),
        }))
    }

    fn write<'a>(&'a self, key: SecretKey, value: &'a str) -> BoxFuture<'a, Result<()>> {
        let entry = self.entry(key);
        let value = value.to_owned();
        Box::pin(async move {
            blocking(move || {
                entry
                    .set_password(&value)
                    .map_err(|e| Error::Backend(format!("storing {}: {e}", key.name())))
            })
            .await?;
            debug!(secret = key.name(), "stored secret in keyring");
            Ok(())
        })
    }

    fn remove(&self, key: SecretKey) -> BoxFuture<'_, Result<()>> {
        let entry = self.entry(key);
        Box::pin(blocking(move || match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Backend(format!("deleting {}: {e}", key.name()))),
        }))
    }
}
