//! Configuration for the `stockroom` command.
//!
//! Loaded from a TOML file (explicit `--config`, else
//! `<config_dir>/stockroom/config.toml`), falling back to defaults when the
//! file is absent, then overridden by `STOCKROOM_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stockroom_client::EndpointPolicy;
use stockroom_session::{DEFAULT_LOGIN_ROUTE, DEFAULT_REFRESH_TIMEOUT_SECS, SessionConfig};

use crate::error::{Error, Result};

/// Project name, used for config and data directories.
pub const PROJECT_NAME: &str = "stockroom";

/// Overrides `api.base_url`.
pub const ENV_API_URL: &str = "STOCKROOM_API_URL";
/// Overrides `session.store_path`.
pub const ENV_STORE_PATH: &str = "STOCKROOM_STORE_PATH";
/// Overrides `logging.level`.
pub const ENV_LOG_LEVEL: &str = "STOCKROOM_LOG_LEVEL";

const SESSION_FILE: &str = "session.json";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockroomConfig {
    pub api: ApiConfig,
    pub session: SessionSection,
    pub logging: LoggingConfig,
}

/// `[api]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the REST API, e.g. `http://127.0.0.1:8000/api`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

/// `[session]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub refresh_timeout_secs: u64,
    pub login_route: String,
    /// Session file. Defaults to `<data_dir>/stockroom/session.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    /// Paths treated as public in addition to the built-in auth endpoints.
    pub extra_public_endpoints: Vec<String>,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            refresh_timeout_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            store_path: None,
            extra_public_endpoints: Vec::new(),
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl StockroomConfig {
    /// `<config_dir>/stockroom/config.toml`, when the platform has a config dir.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(PROJECT_NAME).join("config.toml"))
    }

    /// The explicit path if given, else the default one.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        explicit.map(PathBuf::from).or_else(Self::default_config_path)
    }

    /// Load from file, or defaults when the file does not exist.
    ///
    /// Environment overrides are not applied; see [`Self::load_with_env`].
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) if explicit.is_some() => Err(Error::config(format!(
                "Config file does not exist at {}",
                path.display()
            ))),
            _ => Ok(Self::default()),
        }
    }

    /// Load, then apply `STOCKROOM_*` overrides from the process environment.
    pub fn load_with_env(explicit: Option<&str>) -> Result<Self> {
        let mut config = Self::load(explicit)?;
        config.apply_env_overrides(std::env::vars());
        Ok(config)
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would disable a bound.
    pub fn validate(&self) -> Result<()> {
        if self.session.refresh_timeout_secs == 0 {
            return Err(Error::config(
                "session.refresh_timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }

    /// Apply overrides from `(name, value)` pairs. Unknown names are ignored.
    pub fn apply_env_overrides<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            match key.as_ref() {
                ENV_API_URL => self.api.base_url = value.into(),
                ENV_STORE_PATH => self.session.store_path = Some(PathBuf::from(value.into())),
                ENV_LOG_LEVEL => self.logging.level = value.into(),
                _ => {}
            }
        }
    }

    /// Serialize as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Where the session file lives.
    pub fn store_path(&self) -> PathBuf {
        self.session.store_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join(PROJECT_NAME).join(SESSION_FILE))
                .unwrap_or_else(|| PathBuf::from(format!(".{PROJECT_NAME}-{SESSION_FILE}")))
        })
    }

    /// Session manager settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            refresh_timeout_secs: self.session.refresh_timeout_secs,
            login_route: self.session.login_route.clone(),
        }
    }

    /// Public endpoint allow-list.
    pub fn endpoint_policy(&self) -> EndpointPolicy {
        EndpointPolicy::default().with_public(self.session.extra_public_endpoints.iter().cloned())
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
