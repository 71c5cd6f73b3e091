//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested sections:
//!
//! ```text
//! GATE__ALLOWED_EMAILS=ops@ignitus.network,finance@ignitus.network
//! OIDC__ISSUER_URL=https://accounts.google.com
//! DIRECTORY__PROJECT_ID=ignitus-crowdfunding
//! SESSION__IDLE_MINUTES=30
//! ```

use ignitus_platform_access::{GateConfig, OidcConfig};
use serde::Deserialize;
use std::time::Duration;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Allow-list and route guard settings.
    pub gate: GateConfig,

    /// OIDC authentication configuration.
    pub oidc: OidcConfig,

    /// Directory (Firestore) connection settings.
    pub directory: DirectoryConfig,

    /// Console session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Firestore REST settings for the user directory.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// REST API root.
    #[serde(default = "default_directory_base_url")]
    pub base_url: String,

    /// Project holding the `users` collection.
    pub project_id: String,

    #[serde(default = "default_database")]
    pub database: String,

    /// Collection of per-user documents keyed by subject id.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// API key appended as `?key=` when set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_directory_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_directory_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_collection() -> String {
    "users".to_string()
}

fn default_directory_timeout_seconds() -> u64 {
    10
}

impl DirectoryConfig {
    /// Creates settings for `project_id` with defaults elsewhere.
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: default_directory_base_url(),
            project_id: project_id.into(),
            database: default_database(),
            collection: default_collection(),
            api_key: None,
            timeout_seconds: default_directory_timeout_seconds(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Console session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Minutes of inactivity before a console session is discarded.
    #[serde(default = "default_idle_minutes")]
    pub idle_minutes: u64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_idle_minutes() -> u64 {
    30
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_minutes: default_idle_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_minutes.saturating_mul(60))
    }

    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks settings that only make sense together.
    ///
    /// A page load must be willing to wait longer than one directory read,
    /// or a slow but healthy directory never produces a verdict in time.
    ///
    /// # Errors
    ///
    /// Returns an error if the settle timeout does not exceed the directory
    /// request timeout.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.gate.settle_timeout() <= self.directory.timeout() {
            return Err(config::ConfigError::Message(format!(
                "gate settle timeout ({:?}) must exceed the directory timeout ({:?})",
                self.gate.settle_timeout(),
                self.directory.timeout()
            )));
        }
        Ok(())
    }
}
