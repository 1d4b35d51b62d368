//! Durable storage for the access and refresh credentials
//!
//! `CredentialStore` is the only component that touches stored tokens. It is a
//! thin async key-value surface over a `SecretBackend`, picked once at startup:
//!
//! - `KeyringBackend`: platform secure storage (Keychain, Credential Manager, keyutils)
//! - `FileBackend`: JSON file with atomic writes and 0600 permissions
//! - `MemoryBackend`: process-local, for tests and throwaway sessions
//!
//! Reads never fail: a backend error is logged and reported as "not present",
//! which the HTTP client treats the same as being logged out.

pub mod backend;
pub mod error;
pub mod file;
pub mod keychain;
pub mod memory;
pub mod store;

pub use backend::{BackendConfig, BoxFuture, SecretBackend, SecretKey};
pub use error::{Error, Result};
pub use file::FileBackend;
pub use keychain::KeyringBackend;
pub use memory::MemoryBackend;
pub use store::{CredentialPair, CredentialStore};
