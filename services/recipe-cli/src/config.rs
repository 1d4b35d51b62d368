//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! A missing file at the default path means "use defaults"; a missing file
//! the user named explicitly is an error.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use auth_client::{ClientOptions, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, RefreshPolicy};
use credential_store::BackendConfig;
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "recipe.toml";
const DEFAULT_SERVICE: &str = "recipe-app";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
}

/// Backend API settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Send `ngrok-skip-browser-warning` for development tunnels.
    pub tunnel_bypass: bool,
    pub refresh_policy: RefreshPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            tunnel_bypass: false,
            refresh_policy: RefreshPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Keyring,
    File,
    Memory,
}

impl FromStr for StorageKind {
    type Err = common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" => Ok(StorageKind::Keyring),
            "file" => Ok(StorageKind::File),
            "memory" => Ok(StorageKind::Memory),
            other => Err(common::Error::Config(format!(
                "storage backend must be keyring, file or memory, got: {other}"
            ))),
        }
    }
}

/// Credential storage settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageKind,
    /// Keyring service name.
    pub service: String,
    /// Credential file for the `file` backend.
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::default(),
            service: DEFAULT_SERVICE.to_owned(),
            path: None,
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub storage: Option<StorageKind>,
}

impl Config {
    /// Load configuration from a TOML file, overlay environment variables
    /// and CLI overrides, then validate.
    ///
    /// `required` is false for the default path, where a missing file falls
    /// back to defaults.
    pub fn load(path: &Path, required: bool, overrides: &Overrides) -> common::Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Config::default(),
            Err(e) => return Err(e.into()),
        };

        if let Ok(url) = std::env::var("RECIPE_BASE_URL") {
            config.api.base_url = url;
        }
        if let Ok(kind) = std::env::var("RECIPE_STORAGE") {
            config.storage.backend = kind.parse()?;
        }

        if let Some(url) = &overrides.base_url {
            config.api.base_url = url.clone();
        }
        if let Some(kind) = overrides.storage {
            config.storage.backend = kind;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.storage.backend == StorageKind::Keyring && self.storage.service.trim().is_empty() {
            return Err(common::Error::Config(
                "storage.service must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or RECIPE_CONFIG env var.
    /// The flag says whether the file must exist.
    pub fn resolve_path(cli_path: Option<&str>) -> (PathBuf, bool) {
        if let Some(p) = cli_path {
            return (PathBuf::from(p), true);
        }
        if let Ok(p) = std::env::var("RECIPE_CONFIG") {
            return (PathBuf::from(p), true);
        }
        (PathBuf::from(DEFAULT_CONFIG_FILE), false)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
            tunnel_bypass: self.api.tunnel_bypass,
            refresh_policy: self.api.refresh_policy,
        }
    }

    /// Backend selection. The file backend defaults to
    /// `<config dir>/recipe/credentials.json`.
    pub fn backend_config(&self) -> common::Result<BackendConfig> {
        match self.storage.backend {
            StorageKind::Keyring => Ok(BackendConfig::Keyring {
                service: self.storage.service.clone(),
            }),
            StorageKind::Memory => Ok(BackendConfig::Memory),
            StorageKind::File => {
                let path = match &self.storage.path {
                    Some(path) => path.clone(),
                    None => dirs::config_dir()
                        .ok_or_else(|| {
                            common::Error::Config(
                                "no config directory on this platform, set storage.path".into(),
                            )
                        })?
                        .join("recipe")
                        .join("credentials.json"),
                };
                Ok(BackendConfig::File { path })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_env() {
        unsafe {
            remove_env("RECIPE_BASE_URL");
            remove_env("RECIPE_STORAGE");
            remove_env("RECIPE_CONFIG");
        }
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("recipe.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_full_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
base_url = "https://abc.ngrok-free.app"
timeout_secs = 30
tunnel_bypass = true
refresh_policy = "single_flight"

[storage]
backend = "file"
path = "/tmp/recipe-creds.json"
"#,
        );

        let config = Config::load(&path, true, &Overrides::default()).unwrap();
        assert_eq!(config.api.base_url, "https://abc.ngrok-free.app");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.api.tunnel_bypass);
        assert_eq!(config.api.refresh_policy, RefreshPolicy::SingleFlight);
        assert_eq!(
            config.backend_config().unwrap(),
            BackendConfig::File {
                path: PathBuf::from("/tmp/recipe-creds.json")
            }
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\ntimeout_secs = 5\n");

        let config = Config::load(&path, true, &Overrides::default()).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.refresh_policy, RefreshPolicy::Independent);
        assert_eq!(config.storage.backend, StorageKind::Keyring);
        assert_eq!(
            config.backend_config().unwrap(),
            BackendConfig::Keyring {
                service: "recipe-app".into()
            }
        );
    }

    #[test]
    fn test_missing_default_file_means_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = Config::load(
            Path::new("/nonexistent/recipe.toml"),
            false,
            &Overrides::default(),
        )
        .unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = Config::load(
            Path::new("/nonexistent/recipe.toml"),
            true,
            &Overrides::default(),
        );
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        let result = Config::load(&path, true, &Overrides::default());
        assert!(matches!(result, Err(common::Error::Toml(_))));
    }

    #[test]
    fn test_unknown_refresh_policy_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\nrefresh_policy = \"sometimes\"\n");
        assert!(Config::load(&path, true, &Overrides::default()).is_err());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"ftp://example.com\"\n");
        let err = Config::load(&path, true, &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\ntimeout_secs = 0\n");
        let err = Config::load(&path, true, &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[api]\nbase_url = \"https://from-file.example\"\n[storage]\nbackend = \"keyring\"\n",
        );

        unsafe {
            set_env("RECIPE_BASE_URL", "http://localhost:8000");
            set_env("RECIPE_STORAGE", "memory");
        }
        let config = Config::load(&path, true, &Overrides::default()).unwrap();
        clear_env();

        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.storage.backend, StorageKind::Memory);
    }

    #[test]
    fn test_bad_storage_env_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe { set_env("RECIPE_STORAGE", "cloud") };
        let result = Config::load(
            Path::new("/nonexistent/recipe.toml"),
            false,
            &Overrides::default(),
        );
        clear_env();
        assert!(matches!(result, Err(common::Error::Config(_))));
    }

    #[test]
    fn test_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            set_env("RECIPE_BASE_URL", "http://env-should-lose.example");
            set_env("RECIPE_STORAGE", "keyring");
        }
        let overrides = Overrides {
            base_url: Some("https://cli-wins.example".into()),
            storage: Some(StorageKind::Memory),
        };
        let config = Config::load(Path::new("/nonexistent/recipe.toml"), false, &overrides).unwrap();
        clear_env();

        assert_eq!(
            config.api.base_url, "https://cli-wins.example",
            "CLI arg must take precedence over RECIPE_BASE_URL"
        );
        assert_eq!(config.backend_config().unwrap(), BackendConfig::Memory);
    }

    #[test]
    fn test_resolve_path_cli_arg() {
        let (path, required) = Config::resolve_path(Some("/custom/path.toml"));
        assert_eq!(path, PathBuf::from("/custom/path.toml"));
        assert!(required);
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("RECIPE_CONFIG", "/env/path.toml") };
        let (path, required) = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("/env/path.toml"));
        assert!(required);
        unsafe { remove_env("RECIPE_CONFIG") };
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("RECIPE_CONFIG") };
        let (path, required) = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("recipe.toml"));
        assert!(!required);
    }

    #[test]
    fn test_client_options_from_config() {
        let config = Config::default();
        let options = config.client_options();
        assert_eq!(options.base_url, DEFAULT_BASE_URL);
        assert_eq!(options.timeout, DEFAULT_TIMEOUT);
        assert!(!options.tunnel_bypass);
    }
}
