//! Configuration types for throttlewatch
//!
//! The service is configured by a single JSON document:
//!
//! ```json
//! {
//!   "webhook_path": "/webhook/secret-0c68fb14-bb0d-41ca-a53f-a8ba0ea08fae",
//!   "port": 51000,
//!   "accounts": [
//!     { "loginname": "123456", "password": "webservice-password" }
//!   ]
//! }
//! ```
//!
//! Every field is optional. A missing or malformed document is never fatal:
//! [`ServiceConfig::load`] logs the problem and falls back to defaults, so the
//! service still starts with zero accounts and an always-empty cache.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{error, warn};

/// Default lookup path (an unguessable segment is the only caller check)
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook/secret-0c68fb14-bb0d-41ca-a53f-a8ba0ea08fae";

/// Default listen port
pub const DEFAULT_PORT: u16 = 51000;

/// Paths the lookup endpoint may not take over
const RESERVED_PATHS: &[&str] = &["/", "/health"];

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Path of the lookup endpoint
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Listen port for the HTTP surface
    #[serde(default = "default_port")]
    pub port: u16,

    /// Listen address for the HTTP surface
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Upstream accounts, polled in this order
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,

    /// Interval between two refresh cycles (in seconds)
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Shorter wait used after a failed refresh cycle (in seconds)
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    /// Upper bound for a single upstream call (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ServiceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            webhook_path: default_webhook_path(),
            port: default_port(),
            bind_address: default_bind_address(),
            accounts: Vec::new(),
            refresh_interval_secs: default_refresh_interval_secs(),
            retry_interval_secs: default_retry_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Parse a configuration document
    ///
    /// Unlike [`ServiceConfig::load`], this reports malformed input to the
    /// caller. The result is already normalized.
    pub fn from_json_str(document: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(document)?;
        Ok(config.normalized())
    }

    /// Load the configuration file at `path`
    ///
    /// Never fails: a missing, unreadable or malformed file is logged and
    /// replaced by the defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let document = match std::fs::read_to_string(path) {
            Ok(document) => document,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                error!(
                    "Configuration file {} does not exist, starting with defaults",
                    path.display()
                );
                return Self::new();
            }
            Err(e) => {
                error!(
                    "Failed to read configuration file {}: {}",
                    path.display(),
                    e
                );
                return Self::new();
            }
        };

        match Self::from_json_str(&document) {
            Ok(config) => config,
            Err(e) => {
                error!(
                    "Configuration file {} is malformed, starting with defaults: {}",
                    path.display(),
                    e
                );
                Self::new()
            }
        }
    }

    /// Repair values that parse but cannot be used as-is
    ///
    /// Each repair is logged as a warning.
    pub fn normalized(mut self) -> Self {
        if !self.webhook_path.starts_with('/') {
            warn!(
                "webhook_path '{}' has no leading '/', prefixing it",
                self.webhook_path
            );
            self.webhook_path = format!("/{}", self.webhook_path);
        }

        // Braces would be read as route captures
        if self.webhook_path.contains(['{', '}']) {
            warn!(
                "webhook_path '{}' contains '{{' or '}}', using the default path",
                self.webhook_path
            );
            self.webhook_path = default_webhook_path();
        }

        if RESERVED_PATHS.contains(&self.webhook_path.as_str()) {
            warn!(
                "webhook_path '{}' is reserved, using the default path",
                self.webhook_path
            );
            self.webhook_path = default_webhook_path();
        }

        if self.refresh_interval_secs == 0 {
            warn!("refresh_interval_secs must be > 0, using the default");
            self.refresh_interval_secs = default_refresh_interval_secs();
        }

        if self.retry_interval_secs == 0 {
            warn!("retry_interval_secs must be > 0, using the default");
            self.retry_interval_secs = default_retry_interval_secs();
        }

        if self.request_timeout_secs == 0 {
            warn!("request_timeout_secs must be > 0, using the default");
            self.request_timeout_secs = default_request_timeout_secs();
        }

        self
    }

    /// Interval between two refresh cycles
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Wait applied after a failed refresh cycle
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    /// Upper bound for a single upstream call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One configured upstream account
///
/// Both fields are optional here so that an incomplete entry survives
/// parsing and can be skipped (with a warning) at refresh time instead of
/// invalidating the whole document.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Customer login name
    #[serde(default)]
    pub loginname: Option<String>,

    /// Webservice password
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub password: Option<String>,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("loginname", &self.loginname)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl AccountConfig {
    /// Create a complete account entry
    pub fn new(loginname: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            loginname: Some(loginname.into()),
            password: Some(password.into()),
        }
    }

    /// Validated credentials, or `None` if a field is missing or empty
    pub fn credentials(&self) -> Option<Credentials> {
        match (self.loginname.as_deref(), self.password.as_deref()) {
            (Some(login), Some(password)) if !login.is_empty() && !password.is_empty() => {
                Some(Credentials {
                    loginname: login.to_string(),
                    password: password.to_string(),
                })
            }
            _ => None,
        }
    }

    /// Name used in log lines
    pub fn label(&self) -> &str {
        match self.loginname.as_deref() {
            Some(login) if !login.is_empty() => login,
            _ => "<unnamed>",
        }
    }
}

/// Complete credentials for one upstream account
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Customer login name
    pub loginname: String,
    /// Webservice password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("loginname", &self.loginname)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

fn default_webhook_path() -> String {
    DEFAULT_WEBHOOK_PATH.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    300
}

fn default_retry_interval_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}
