//! Upstash Redis REST client.
//!
//! Each command is a single `POST` of a JSON array to the database URL with a
//! bearer token; the reply is an envelope of either `{"result": ...}` or
//! `{"error": "..."}`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use counter_core::BackendError;
use counter_core::ports::{Command, KvStore};

use super::KvConfigError;

/// Upstash connection configuration.
#[derive(Debug, Clone)]
pub struct UpstashConfig {
    /// REST endpoint (e.g., https://eu1-example.upstash.io)
    pub url: String,
    /// REST token sent as `Authorization: Bearer <token>`
    pub token: String,
}

impl UpstashConfig {
    /// Load configuration from environment variables. Both values are required.
    pub fn from_env() -> Result<Self, KvConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`UpstashConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, KvConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(KvConfigError::Missing(name))
        };

        Ok(Self {
            url: required("UPSTASH_REDIS_REST_URL")?,
            token: required("UPSTASH_REDIS_REST_TOKEN")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Turn a raw reply body into the command result.
fn decode_envelope(body: &[u8]) -> Result<Value, BackendError> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| BackendError::Decode(e.to_string()))?;

    match envelope.error {
        Some(message) => Err(BackendError::Store(message)),
        None => Ok(envelope.result.unwrap_or(Value::Null)),
    }
}

/// Upstash-backed store. One HTTP request per command, no retries.
pub struct UpstashKvStore {
    client: reqwest::Client,
    config: UpstashConfig,
}

impl UpstashKvStore {
    pub fn new(config: UpstashConfig) -> Self {
        tracing::info!(url = %config.url, "Using Upstash REST backend");
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create from environment configuration.
    pub fn from_env() -> Result<Self, KvConfigError> {
        Ok(Self::new(UpstashConfig::from_env()?))
    }
}

#[async_trait]
impl KvStore for UpstashKvStore {
    async fn execute(&self, command: &Command) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.token)
            .json(command)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        // Upstash reports command errors with a 4xx and an error envelope;
        // anything that is not an envelope is reported with its status.
        decode_envelope(&body).map_err(|e| match e {
            BackendError::Decode(detail) => {
                BackendError::Decode(format!("HTTP {status}: {detail}"))
            }
            other => other,
        })
    }

    fn backend_name(&self) -> &'static str {
        "upstash-redis"
    }
}
