//! Key-value store implementations - Upstash REST, native Redis and in-memory.

mod memory;

pub use memory::InMemoryKvStore;

#[cfg(feature = "upstash")]
mod upstash;
#[cfg(feature = "upstash")]
pub use upstash::{UpstashConfig, UpstashKvStore};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisKvStore};

/// Backend configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum KvConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Unknown key-value backend: {0}")]
    UnknownBackend(String),

    #[error("Backend not compiled in: {0} (enable the `{0}` feature)")]
    Disabled(&'static str),
}
