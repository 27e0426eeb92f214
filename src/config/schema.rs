//! Configuration schema for config.toml.

use crate::error::ConfigError;
use crate::runtime::Credentials;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest accepted poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 1_000;

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Deployment space used when none is configured.
pub const DEFAULT_DEPLOYMENT_SPACE: &str = "development";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the decision runtime API.
    pub url: String,

    /// Deployment spaces to discover decision services in.
    pub deployment_spaces: Vec<String>,

    /// Explicit decision service ids. Enumeration is skipped when set.
    pub decision_service_ids: Option<Vec<String>>,

    /// Interval between discovery passes, in milliseconds.
    pub poll_interval_ms: u64,

    /// API key (sent as a ZenApiKey header together with `username`).
    pub apikey: String,

    /// Username for API key or basic authentication.
    pub username: String,

    /// Password for basic authentication.
    pub password: String,

    /// Log level (debug, info, warn, error).
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            deployment_spaces: vec![DEFAULT_DEPLOYMENT_SPACE.into()],
            decision_service_ids: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            apikey: String::new(),
            username: String::new(),
            password: String::new(),
            log_level: "info".into(),
        }
    }
}

impl ServerConfig {
    /// Check the values the server cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        if self.deployment_spaces.is_empty() {
            return Err(ConfigError::NoDeploymentSpaces);
        }
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(ConfigError::PollIntervalTooShort {
                min: MIN_POLL_INTERVAL_MS,
                actual: self.poll_interval_ms,
            });
        }
        self.credentials().map(|_| ())
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Build outbound credentials. An API key wins over a password.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        if !self.apikey.is_empty() {
            Ok(Credentials::ApiKey {
                username: self.username.clone(),
                apikey: self.apikey.clone(),
            })
        } else if !self.password.is_empty() {
            Ok(Credentials::Basic {
                username: self.username.clone(),
                password: self.password.clone(),
            })
        } else {
            Err(ConfigError::MissingCredentials)
        }
    }
}
