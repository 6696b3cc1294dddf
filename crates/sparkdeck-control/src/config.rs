//! Session and wait-helper configuration.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use sparkdeck_api::{Credentials, HttpConfig};

use crate::error::{Error, Family, Result};

/// Configuration for a [`Session`](crate::Session) talking to the platform over HTTP.
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    /// Workspace host, e.g. `example.cloud.databricks.com`.
    #[serde(default)]
    pub host: String,

    /// Personal access token. Takes priority over username/password.
    #[serde(default)]
    pub token: Option<String>,

    /// Username for basic auth.
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic auth.
    #[serde(default)]
    pub password: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "SessionConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Connect timeout in seconds.
    #[serde(default = "SessionConfig::default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl SessionConfig {
    const fn default_request_timeout() -> u64 {
        60
    }

    const fn default_connect_timeout() -> u64 {
        10
    }

    /// Create a config for `host` with no credentials and default timeouts.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: None,
            username: None,
            password: None,
            request_timeout_seconds: Self::default_request_timeout(),
            connect_timeout_seconds: Self::default_connect_timeout(),
        }
    }

    /// Authenticate with a personal access token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Authenticate with a username and password.
    #[must_use]
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `SPARKDECK_HOST`: workspace host
    /// - `SPARKDECK_TOKEN`: personal access token
    /// - `SPARKDECK_USERNAME`: basic auth username
    /// - `SPARKDECK_PASSWORD`: basic auth password
    /// - `SPARKDECK_REQUEST_TIMEOUT_SECONDS`: request timeout
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::new(std::env::var("SPARKDECK_HOST").unwrap_or_default());

        if let Ok(val) = std::env::var("SPARKDECK_TOKEN") {
            config.token = Some(val);
        }
        if let Ok(val) = std::env::var("SPARKDECK_USERNAME") {
            config.username = Some(val);
        }
        if let Ok(val) = std::env::var("SPARKDECK_PASSWORD") {
            config.password = Some(val);
        }
        if let Ok(val) = std::env::var("SPARKDECK_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(n) = val.parse() {
                config.request_timeout_seconds = n;
            }
        }

        config
    }

    /// Validate the credential fields and build [`Credentials`] from them.
    ///
    /// # Errors
    ///
    /// Returns a session configuration error if neither a token nor a
    /// username is set, or if a username comes without a password.
    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::from_parts(
            self.token.as_deref(),
            self.username.as_deref(),
            self.password.as_deref(),
        )
        .map_err(|e| Error::config(Family::Session, e.to_string()))
    }

    /// Validate the whole configuration and build the HTTP client settings.
    ///
    /// # Errors
    ///
    /// Returns a session configuration error if the host is empty or the
    /// credentials are incomplete.
    pub fn http_config(&self) -> Result<HttpConfig> {
        if self.host.trim().is_empty() {
            return Err(Error::config(Family::Session, "host is not set"));
        }
        let mut http = HttpConfig::new(self.host.clone(), self.credentials()?);
        http.request_timeout = self.request_timeout();
        http.connect_timeout = self.connect_timeout();
        Ok(http)
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the connect timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("token", &redacted(&self.token))
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .finish()
    }
}

/// Poll interval and timeout for the [`wait`](crate::wait) helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Delay between two reads.
    pub poll_interval: Duration,
    /// Give up after this long.
    pub timeout: Duration,
}

impl WaitOptions {
    /// Options with the given interval and timeout.
    #[must_use]
    pub const fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            timeout: Duration::from_secs(20 * 60),
        }
    }
}
