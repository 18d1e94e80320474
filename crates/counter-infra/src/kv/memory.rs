//! In-memory key-value store - used for local development and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{Mutex, RwLock};

use counter_core::BackendError;
use counter_core::ports::{Command, KvStore};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() >= exp)
            .unwrap_or(false)
    }
}

/// In-memory store understanding the commands the counter issues
/// (`GET`, `INCR`, `SET [EX n] [NX]`, `DEL`, `PING`).
///
/// Note: Data is lost on process restart, and limits are per-process.
pub struct InMemoryKvStore {
    store: RwLock<HashMap<String, Entry>>,
    history: Mutex<Vec<Command>>,
    unavailable: AtomicBool,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate an outage: every command fails with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every command executed so far, in order.
    pub async fn history(&self) -> Vec<Command> {
        self.history.lock().await.clone()
    }

    /// Number of executed commands with the given name.
    pub async fn calls(&self, name: &str) -> usize {
        self.history
            .lock()
            .await
            .iter()
            .filter(|c| c.name() == name)
            .count()
    }

    async fn get(&self, key: &str) -> Value {
        let store = self.store.read().await;
        match store.get(key) {
            Some(entry) if !entry.is_expired() => Value::String(entry.value.clone()),
            _ => Value::Null,
        }
    }

    async fn incr(&self, key: &str) -> Result<Value, BackendError> {
        let mut store = self.store.write().await;

        let (current, expires_at) = match store.get(key) {
            Some(entry) if !entry.is_expired() => {
                let current = entry.value.parse::<i64>().map_err(|_| {
                    BackendError::Store("ERR value is not an integer or out of range".to_string())
                })?;
                (current, entry.expires_at)
            }
            _ => (0, None),
        };

        let next = current + 1;
        store.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );

        Ok(json!(next))
    }

    async fn set(&self, args: &[String]) -> Result<Value, BackendError> {
        let (key, value) = match args {
            [key, value, ..] => (key, value),
            _ => return Err(wrong_arity("set")),
        };

        let mut ttl = None;
        let mut only_if_absent = false;
        let mut options = args[2..].iter();
        while let Some(option) = options.next() {
            match option.to_uppercase().as_str() {
                "EX" => {
                    let secs = options
                        .next()
                        .and_then(|s| s.parse::<u64>().ok())
                        .filter(|s| *s > 0)
                        .ok_or_else(|| {
                            BackendError::Store("ERR invalid expire time in 'set' command".into())
                        })?;
                    ttl = Some(Duration::from_secs(secs));
                }
                "NX" => only_if_absent = true,
                _ => return Err(BackendError::Store("ERR syntax error".to_string())),
            }
        }

        let mut store = self.store.write().await;
        if only_if_absent && store.get(key).is_some_and(|e| !e.is_expired()) {
            return Ok(Value::Null);
        }

        store.insert(
            key.clone(),
            Entry {
                value: value.clone(),
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );

        Ok(json!("OK"))
    }

    async fn del(&self, keys: &[String]) -> Value {
        let mut store = self.store.write().await;
        let removed = keys
            .iter()
            .filter_map(|k| store.remove(k))
            .filter(|e| !e.is_expired())
            .count();
        json!(removed)
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

fn wrong_arity(name: &str) -> BackendError {
    BackendError::Store(format!(
        "ERR wrong number of arguments for '{name}' command"
    ))
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn execute(&self, command: &Command) -> Result<Value, BackendError> {
        self.history.lock().await.push(command.clone());

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("store unavailable".to_string()));
        }

        let args = command.args();
        match (command.name().as_str(), args) {
            ("PING", []) => Ok(json!("PONG")),
            ("GET", [key]) => Ok(self.get(key).await),
            ("INCR", [key]) => self.incr(key).await,
            ("SET", _) => self.set(args).await,
            ("DEL", keys) if !keys.is_empty() => Ok(self.del(keys).await),
            ("PING" | "GET" | "INCR" | "DEL", _) => Err(wrong_arity(&command.name().to_lowercase())),
            (other, _) => Err(BackendError::Store(format!(
                "ERR unknown command '{}'",
                other.to_lowercase()
            ))),
        }
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
