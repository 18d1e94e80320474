//! # Counter Infrastructure
//!
//! Concrete implementations of the ports defined in `counter-core`.
//! This crate contains the key-value store clients and the event sinks.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All backends enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `upstash` - Upstash Redis REST backend via reqwest
//! - `redis` - Native Redis backend via the redis crate

pub mod events;
pub mod kv;

// Re-exports - In-Memory
pub use events::{RecordingEventSink, TracingEventSink};
pub use kv::{InMemoryKvStore, KvConfigError};

// Re-exports - Upstash
#[cfg(feature = "upstash")]
pub use kv::{UpstashConfig, UpstashKvStore};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use kv::{RedisConfig, RedisKvStore};
