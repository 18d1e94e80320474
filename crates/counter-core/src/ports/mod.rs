//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod events;
mod kv;

pub use events::{CounterEvent, EventLevel, EventSink, HEALTH_PATH, NoopEventSink, RequestSummary};
pub use kv::{Command, KvStore};
