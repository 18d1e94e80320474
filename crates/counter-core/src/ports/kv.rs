use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::BackendError;

/// A store command as an ordered list of strings, e.g. `["SET", "k", "v", "EX", "60"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Command(Vec<String>);

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.0.push(arg.to_string());
        self
    }

    pub fn get(key: &str) -> Self {
        Self::new("GET").arg(key)
    }

    pub fn incr(key: &str) -> Self {
        Self::new("INCR").arg(key)
    }

    /// `SET key value EX <seconds>`
    pub fn set_ex(key: &str, value: &str, ttl: Duration) -> Self {
        Self::new("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs())
    }

    /// `SET key value EX <seconds> NX` - only writes when the key is absent.
    pub fn set_nx_ex(key: &str, value: &str, ttl: Duration) -> Self {
        Self::set_ex(key, value, ttl).arg("NX")
    }

    pub fn ping() -> Self {
        Self::new("PING")
    }

    /// Upper-cased command name.
    pub fn name(&self) -> String {
        self.0[0].to_uppercase()
    }

    /// Arguments after the command name.
    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Key-value store trait - abstraction over the counter backends (Upstash REST, Redis, in-memory).
///
/// Implementations issue exactly one request per call and never retry.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Execute a single command and return the store's `result` value.
    async fn execute(&self, command: &Command) -> Result<Value, BackendError>;

    /// Label reported by the health endpoint.
    fn backend_name(&self) -> &'static str;
}
