//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/platter/platter.toml`
//! 3. Environment variables: `PLATTER_*` prefix (`__` separates sections)
//! 4. Well-known server variables: `JENKINS_URL`, `JENKINS_USERNAME`, `JENKINS_API_KEY`
//!
//! `USERNAME` is only consulted when no other layer set a username.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

pub const ENV_URL: &str = "JENKINS_URL";
pub const ENV_USERNAME: &str = "JENKINS_USERNAME";
pub const ENV_USERNAME_FALLBACK: &str = "USERNAME";
pub const ENV_API_KEY: &str = "JENKINS_API_KEY";

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout; unset means no timeout
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Build wait poll settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollConfig {
    /// Interval between queue item polls while waiting for a build number
    pub queue_interval_ms: u64,
    /// Interval between build polls while the build is running
    pub build_interval_ms: u64,
    /// Upper bound for the whole wait; unset means wait forever
    pub wait_timeout_secs: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            queue_interval_ms: 1_000,
            build_interval_ms: 5_000,
            wait_timeout_secs: None,
        }
    }
}

impl PollConfig {
    pub fn queue_interval(&self) -> Duration {
        Duration::from_millis(self.queue_interval_ms)
    }

    pub fn build_interval(&self) -> Duration {
        Duration::from_millis(self.build_interval_ms)
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_secs.map(Duration::from_secs)
    }
}

/// Unified configuration for platter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Server base URL, e.g. `https://jenkins.example.com`
    pub url: Option<String>,
    /// Identity used for basic authentication
    pub username: Option<String>,
    /// API token used as the basic authentication password
    pub api_key: Option<String>,
    pub http: HttpConfig,
    pub poll: PollConfig,
}

/// Resolved connection credentials; all three parts are present.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Get the XDG config directory for platter.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "platter").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("platter.toml"))
}

impl Settings {
    /// Load settings from the global config file and the process environment.
    pub fn load() -> Result<Self, ApplicationError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(global_config_path().as_deref(), &env)
    }

    /// Load settings from an explicit config file and environment snapshot.
    pub fn load_from(
        config_file: Option<&Path>,
        env: &HashMap<String, String>,
    ) -> Result<Self, ApplicationError> {
        let defaults = PollConfig::default();
        let mut builder = Config::builder()
            .set_default("poll.queue_interval_ms", defaults.queue_interval_ms)
            .map_err(config_err)?
            .set_default("poll.build_interval_ms", defaults.build_interval_ms)
            .map_err(config_err)?;

        if let Some(path) = config_file {
            if path.exists() {
                builder = builder.add_source(File::from(path.to_path_buf()).required(false));
            }
        }

        let platter_env: config::Map<String, String> = env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        builder = builder.add_source(
            Environment::with_prefix("PLATTER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(platter_env)),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.apply_server_env(env);
        Ok(settings)
    }

    /// Apply the well-known `JENKINS_*` variables as explicit overrides.
    fn apply_server_env(&mut self, env: &HashMap<String, String>) {
        let non_empty = |key: &str| env.get(key).filter(|v| !v.is_empty()).cloned();

        if let Some(url) = non_empty(ENV_URL) {
            self.url = Some(url);
        }
        if let Some(username) = non_empty(ENV_USERNAME) {
            self.username = Some(username);
        } else if self.username.is_none() {
            self.username = non_empty(ENV_USERNAME_FALLBACK);
        }
        if let Some(api_key) = non_empty(ENV_API_KEY) {
            self.api_key = Some(api_key);
        }
    }

    /// Connection credentials, or a config error naming every missing variable.
    pub fn credentials(&self) -> Result<Credentials, ApplicationError> {
        let present = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        let url = present(&self.url);
        let username = present(&self.username);
        let api_key = present(&self.api_key);

        match (url, username, api_key) {
            (Some(url), Some(username), Some(api_key)) => Ok(Credentials {
                url: url.trim_end_matches('/').to_string(),
                username,
                api_key,
            }),
            (url, username, api_key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(ENV_URL);
                }
                if username.is_none() {
                    missing.push(ENV_USERNAME);
                }
                if api_key.is_none() {
                    missing.push(ENV_API_KEY);
                }
                Err(ApplicationError::MissingCredentials {
                    missing: missing.join(", "),
                })
            }
        }
    }

    /// Show the effective configuration as TOML, with the API key masked.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        let mut shown = self.clone();
        if shown.api_key.is_some() {
            shown.api_key = Some("<redacted>".to_string());
        }
        toml::to_string_pretty(&shown).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# platter configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/platter/platter.toml
#   Env:    PLATTER_* environment variables (PLATTER_POLL__BUILD_INTERVAL_MS=2000)
#   Env:    JENKINS_URL, JENKINS_USERNAME, JENKINS_API_KEY

# url = "https://jenkins.example.com"
# username = "automation"
# api_key = "11aa..."

[http]
# Per-request timeout in seconds (unset: no timeout)
# timeout_secs = 30

[poll]
# queue_interval_ms = 1000
# build_interval_ms = 5000
# Give up waiting for a build after this many seconds (unset: wait forever)
# wait_timeout_secs = 3600
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
