//! Process-wide CLI settings.
//!
//! Loaded once at startup from the environment and passed by value into the
//! collaborators that need them; nothing reads the environment afterwards.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Deserializer};
use url::Url;

pub const ENV_PREFIX: &str = "INFRACTL_";
pub const DEFAULT_API_URL: &str = "https://api.infractl.dev/";
pub const DEFAULT_SIGNIN_URL: &str = "https://infractl.dev/signin";
pub const DEFAULT_AUTH_PORT: u16 = 9191;
const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 300;

static DEFAULT_API: LazyLock<Url> =
    LazyLock::new(|| Url::parse(DEFAULT_API_URL).expect("default API URL is valid"));
static DEFAULT_SIGNIN: LazyLock<Url> =
    LazyLock::new(|| Url::parse(DEFAULT_SIGNIN_URL).expect("default sign-in URL is valid"));

/// Settings loaded via `envy`, each field from `INFRACTL_<FIELD>`:
///   - `INFRACTL_API_ENABLED`  (default `true`)
///   - `INFRACTL_API_URL`      (default [`DEFAULT_API_URL`])
///   - `INFRACTL_SIGNIN_URL`   (default [`DEFAULT_SIGNIN_URL`])
///   - `INFRACTL_AUTH_PORT`    (default [`DEFAULT_AUTH_PORT`])
///   - `INFRACTL_AUTH_TIMEOUT` (seconds, default 300)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CliSettings {
    /// When false, no request is sent to the API
    #[serde(default = "default_api_enabled")]
    pub api_enabled: bool,
    /// API base URL, always ending in `/`
    #[serde(default = "default_api_url", deserialize_with = "base_url")]
    pub api_url: Url,
    #[serde(default = "default_signin_url")]
    pub signin_url: Url,
    /// First port tried for the local sign-in callback listener
    #[serde(default = "default_auth_port")]
    pub auth_port: u16,
    /// How long to wait for the browser to deliver a token
    #[serde(default = "default_auth_timeout", deserialize_with = "seconds")]
    pub auth_timeout: Duration,
}

fn default_api_enabled() -> bool {
    true
}

fn default_api_url() -> Url {
    DEFAULT_API.clone()
}

fn default_signin_url() -> Url {
    DEFAULT_SIGNIN.clone()
}

fn default_auth_port() -> u16 {
    DEFAULT_AUTH_PORT
}

fn default_auth_timeout() -> Duration {
    Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS)
}

fn base_url<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Url, D::Error> {
    let raw = String::deserialize(deserializer)?;
    normalize_base_url(&raw).map_err(serde::de::Error::custom)
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            api_enabled: default_api_enabled(),
            api_url: default_api_url(),
            signin_url: default_signin_url(),
            auth_port: default_auth_port(),
            auth_timeout: default_auth_timeout(),
        }
    }
}

impl CliSettings {
    /// Read settings from `INFRACTL_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        envy::prefixed(ENV_PREFIX)
            .from_env()
            .context("Failed to load settings from INFRACTL_* environment variables")
    }

    /// Build settings from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .context("Failed to load settings from INFRACTL_* variables")
    }

    pub fn with_api_enabled(mut self, enabled: bool) -> Self {
        self.api_enabled = enabled;
        self
    }

    pub fn with_api_url(mut self, url: &str) -> anyhow::Result<Self> {
        self.api_url = normalize_base_url(url)?;
        Ok(self)
    }
}

/// Parse a base URL so that `Url::join` appends to its path.
fn normalize_base_url(value: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(value)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
