//! In-process secret storage

use std::collections::HashMap;
use std::sync::Mutex;

use crate::backend::{BoxFuture, SecretBackend, SecretKey};
use crate::error::Result;

#[derive(Default)]
pub struct MemoryBackend {
    secrets: Mutex<HashMap<SecretKey, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_secrets<T>(&self, f: impl FnOnce(&mut HashMap<SecretKey, String>) -> T) -> T {
        let mut secrets = self.secrets.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut secrets)
    }
}

impl SecretBackend for MemoryBackend {
    fn id(&self) -> &str {
        "memory"
    }

    fn read(&self, key: SecretKey) -> BoxFuture<'_, Result<Option<String>>> {
        let value = self.with_secrets(|s| s.get(&key).cloned());
        Box::pin(async move { Ok(value) })
    }

    fn write<'a>(&'a self, key: SecretKey, value: &'a str) -> BoxFuture<'a, Result<()>> {
        self.with_secrets(|s| s.insert(key, value.to_owned()));
        Box::pin(async { Ok(()) })
    }

    fn remove(&self, key: SecretKey) -> BoxFuture<'_, Result<()>> {
        self.with_secrets(|s| s.remove(&key));
        Box::pin(async { Ok(()) })
    }
}
