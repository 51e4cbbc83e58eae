//! Toolkit configuration.
//!
//! One [`GbpConfig`] is built at startup and handed to every component. It can
//! come from defaults, from a `config.toml` file (by default
//! `~/.config/gbp-toolkit/config.toml`), and from a few environment variables
//! that override the file:
//!
//! - `GBP_CREDENTIALS_FILE`: OAuth client-secret JSON
//! - `GBP_TOKEN_FILE`: persisted token set
//! - `GBP_REDIRECT_URI`: loopback redirect for the consent flow

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GbpError, GbpResult};

pub const ENV_CREDENTIALS_FILE: &str = "GBP_CREDENTIALS_FILE";
pub const ENV_TOKEN_FILE: &str = "GBP_TOKEN_FILE";
pub const ENV_REDIRECT_URI: &str = "GBP_REDIRECT_URI";

pub const DEFAULT_BUSINESS_API_URL: &str = "https://mybusiness.googleapis.com/v4";
pub const DEFAULT_PERFORMANCE_API_URL: &str = "https://businessprofileperformance.googleapis.com/v1";
pub const DEFAULT_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Configuration shared by the auth handler and the API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbpConfig {
    /// OAuth client secrets downloaded from the Cloud Console.
    pub credentials_file: PathBuf,

    /// Where the token set is persisted between runs.
    pub token_file: PathBuf,

    /// Loopback redirect registered for the OAuth client.
    pub redirect_uri: String,

    pub business_api_url: String,
    pub performance_api_url: String,
    pub revoke_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// How long to wait for the browser to hit the redirect URI.
    pub callback_timeout_secs: u64,

    pub user_agent: String,

    /// `pageSize` sent when listing locations.
    pub locations_page_size: u32,

    /// `pageSize` sent when listing reviews.
    pub reviews_page_size: u32,

    /// Open the consent page in a browser. The URL is printed either way.
    pub open_browser: bool,
}

impl Default for GbpConfig {
    fn default() -> Self {
        Self {
            credentials_file: PathBuf::from("credentials.json"),
            token_file: PathBuf::from("token.json"),
            redirect_uri: "http://localhost:8080/callback".to_string(),
            business_api_url: DEFAULT_BUSINESS_API_URL.to_string(),
            performance_api_url: DEFAULT_PERFORMANCE_API_URL.to_string(),
            revoke_url: DEFAULT_REVOKE_URL.to_string(),
            timeout_secs: 30,
            callback_timeout_secs: 300,
            user_agent: format!("gbp-toolkit/{}", env!("CARGO_PKG_VERSION")),
            locations_page_size: 100,
            reviews_page_size: 50,
            open_browser: true,
        }
    }
}

impl GbpConfig {
    /// Loads configuration from the default path, falling back to defaults
    /// when no file exists.
    pub fn load() -> GbpResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Loads configuration from a specific TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> GbpResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GbpError::config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> GbpResult<Self> {
        toml::from_str(content).map_err(|e| GbpError::config(format!("failed to parse config: {}", e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gbp-toolkit").join("config.toml"))
    }

    /// Applies `GBP_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Applies `GBP_*` overrides using `lookup` to resolve variables.
    ///
    /// Empty values are ignored.
    #[must_use]
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_CREDENTIALS_FILE) {
            self.credentials_file = PathBuf::from(path);
        }
        if let Some(path) = get(ENV_TOKEN_FILE) {
            self.token_file = PathBuf::from(path);
        }
        if let Some(uri) = get(ENV_REDIRECT_URI) {
            self.redirect_uri = uri;
        }
        self
    }

    #[must_use]
    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = path.into();
        self
    }

    #[must_use]
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = path.into();
        self
    }

    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    #[must_use]
    pub fn with_business_api_url(mut self, url: impl Into<String>) -> Self {
        self.business_api_url = url.into();
        self
    }

    #[must_use]
    pub fn with_performance_api_url(mut self, url: impl Into<String>) -> Self {
        self.performance_api_url = url.into();
        self
    }

    #[must_use]
    pub fn with_revoke_url(mut self, url: impl Into<String>) -> Self {
        self.revoke_url = url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    #[must_use]
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout_secs = timeout.as_secs();
        self
    }

    #[must_use]
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> GbpResult<()> {
        let redirect = url::Url::parse(&self.redirect_uri).map_err(|e| {
            GbpError::config(format!("invalid redirect_uri '{}': {}", self.redirect_uri, e))
        })?;
        if redirect.scheme() != "http" || redirect.host_str().is_none() {
            return Err(GbpError::config(format!(
                "redirect_uri must be an http loopback URL, got '{}'",
                self.redirect_uri
            )));
        }

        for (key, value) in [
            ("business_api_url", &self.business_api_url),
            ("performance_api_url", &self.performance_api_url),
            ("revoke_url", &self.revoke_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| GbpError::config(format!("invalid {key} '{value}': {e}")))?;
        }

        if self.timeout_secs == 0 {
            return Err(GbpError::config("timeout_secs must be greater than zero"));
        }
        if self.callback_timeout_secs == 0 {
            return Err(GbpError::config("callback_timeout_secs must be greater than zero"));
        }
        if self.locations_page_size == 0 || self.reviews_page_size == 0 {
            return Err(GbpError::config("page sizes must be greater than zero"));
        }
        Ok(())
    }

    /// Builds the HTTP client used for API and token requests.
    pub(crate) fn http_client(&self) -> GbpResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout())
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| GbpError::config(format!("failed to create HTTP client: {}", e)))
    }
}
