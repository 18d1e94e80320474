//! Native Redis backend with connection management.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use serde_json::Value;

use counter_core::BackendError;
use counter_core::ports::{Command, KvStore};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Redis-backed store.
///
/// Uses connection manager for automatic reconnection; each command is still a
/// single round trip.
pub struct RedisKvStore {
    conn: ConnectionManager,
}

impl RedisKvStore {
    pub async fn new(config: RedisConfig) -> Result<Self, BackendError> {
        let client = Client::open(config.url.as_str()).map_err(map_redis_error)?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| BackendError::Transport("Connection timed out".to_string()))?
            .map_err(map_redis_error)?;

        tracing::info!(url = %config.url, "Connected to Redis backend");

        Ok(Self { conn })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, BackendError> {
        Self::new(RedisConfig::from_env()).await
    }
}

fn map_redis_error(e: RedisError) -> BackendError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_timeout() || e.is_connection_dropped()
    {
        BackendError::Transport(e.to_string())
    } else {
        BackendError::Store(e.to_string())
    }
}

/// Map a RESP reply onto the JSON shape the REST API would have returned.
fn to_json(value: redis::Value) -> Value {
    match value {
        redis::Value::Nil => Value::Null,
        redis::Value::Int(n) => Value::from(n),
        redis::Value::BulkString(bytes) => Value::String(String::from_utf8_lossy(&bytes).into()),
        redis::Value::SimpleString(s) => Value::String(s),
        redis::Value::Okay => Value::String("OK".to_string()),
        redis::Value::Array(items) => Value::Array(items.into_iter().map(to_json).collect()),
        redis::Value::Boolean(b) => Value::Bool(b),
        redis::Value::Double(d) => Value::from(d),
        other => Value::String(format!("{other:?}")),
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn execute(&self, command: &Command) -> Result<Value, BackendError> {
        let mut conn = self.conn.clone();

        let mut cmd = redis::cmd(&command.name());
        for arg in command.args() {
            cmd.arg(arg);
        }

        let reply: redis::Value = cmd.query_async(&mut conn).await.map_err(map_redis_error)?;
        Ok(to_json(reply))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
