//! Configuration types for vod-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use utoipa::ToSchema;

/// Top-level configuration
///
/// Every section and every field has a sensible default, so a partial (or
/// empty) config document deserializes cleanly. Call [`Config::validate`]
/// before handing the config to the manager.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Job execution settings
    #[serde(default)]
    pub jobs: JobConfig,

    /// Webhook delivery settings
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Shutdown behavior
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl Config {
    /// Check cross-field constraints the type system cannot express
    pub fn validate(&self) -> Result<()> {
        if self.jobs.max_concurrent == 0 {
            return Err(Error::Config {
                message: "max_concurrent must be at least 1".to_string(),
                key: Some("jobs.max_concurrent".to_string()),
            });
        }
        if self.webhook.timeout.is_zero() {
            return Err(Error::Config {
                message: "webhook timeout must be greater than zero".to_string(),
                key: Some("webhook.timeout".to_string()),
            });
        }
        Ok(())
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:58682)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Job execution configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobConfig {
    /// Maximum fetches running at once (default: 3)
    ///
    /// Admission is not capped; tasks beyond this limit wait in the running
    /// collection with zero progress until a worker permit frees up.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Webhook delivery configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookConfig {
    /// Timeout for one delivery attempt (default: 30 seconds)
    #[serde(default = "default_webhook_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout: default_webhook_timeout(),
        }
    }
}

/// Shutdown configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ShutdownConfig {
    /// How long to wait for running jobs to finish (default: 30 seconds)
    #[serde(default = "default_drain_timeout", with = "duration_serde")]
    pub drain_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: default_drain_timeout(),
        }
    }
}

fn default_bind_address() -> SocketAddr {
    "127.0.0.1:58682"
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 58682)))
}

fn default_max_concurrent() -> usize {
    3
}

fn default_webhook_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Serialize Durations as plain seconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
