//! Event sink implementations - structured logs and in-memory recording.

mod logging;
mod memory;

pub use logging::TracingEventSink;
pub use memory::RecordingEventSink;
