//! Observability port - structured lifecycle events.
//!
//! The service reports what happened through an injected [`EventSink`]; swapping in
//! [`NoopEventSink`] silences it without changing any response.

/// Severity attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// Per-request context captured at the HTTP edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    pub method: String,
    pub path: String,
    pub country: String,
    pub city: String,
    pub colo: String,
    pub user_agent: String,
    pub status: u16,
    pub duration_ms: u64,
    /// Internal failure detail; logged, never sent to the client.
    pub error: Option<String>,
}

/// Path of the health probe endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Lifecycle points of the counter service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterEvent {
    Request(RequestSummary),
    CountFetched { count: u64 },
    RateLimited { count: u64 },
    Incremented { count: u64 },
    /// The increment landed but the rate-limit record could not be written.
    MarkFailed { count: u64, error: String },
    HealthOk { latency_ms: u64 },
    HealthDegraded { error: String },
}

impl CounterEvent {
    /// Stable event name used in structured logs.
    pub fn name(&self) -> &'static str {
        match self {
            CounterEvent::Request(_) => "request",
            CounterEvent::CountFetched { .. } => "count.fetch",
            CounterEvent::RateLimited { .. } => "vote.rate_limited",
            CounterEvent::Incremented { .. } => "vote.new",
            CounterEvent::MarkFailed { .. } => "vote.mark_failed",
            CounterEvent::HealthOk { .. } => "health.ok",
            CounterEvent::HealthDegraded { .. } => "health.degraded",
        }
    }

    pub fn level(&self) -> EventLevel {
        match self {
            // A failing probe is reported by `health.degraded`; the request itself is routine.
            CounterEvent::Request(summary) if summary.path == HEALTH_PATH => EventLevel::Info,
            CounterEvent::Request(summary) if summary.status >= 500 => EventLevel::Error,
            CounterEvent::Request(summary) if summary.status == 405 => EventLevel::Warn,
            CounterEvent::MarkFailed { .. } => EventLevel::Warn,
            CounterEvent::HealthDegraded { .. } => EventLevel::Error,
            _ => EventLevel::Info,
        }
    }
}

/// Event sink trait - receives lifecycle events, must not fail or block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CounterEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: CounterEvent) {}
}
