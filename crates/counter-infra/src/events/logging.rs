//! Event sink writing structured `tracing` events.
//!
//! Every event carries an `event` field with its stable name, so JSON logs can be
//! filtered the same way regardless of level.

use counter_core::ports::{CounterEvent, EventLevel, EventSink};

/// Dispatch to the `tracing` macro matching a runtime [`EventLevel`].
macro_rules! log_at {
    ($level:expr, $($fields:tt)+) => {
        match $level {
            EventLevel::Info => tracing::info!(target: "counter::events", $($fields)+),
            EventLevel::Warn => tracing::warn!(target: "counter::events", $($fields)+),
            EventLevel::Error => tracing::error!(target: "counter::events", $($fields)+),
        }
    };
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: CounterEvent) {
        let level = event.level();
        let name = event.name();

        match event {
            CounterEvent::Request(req) => log_at!(
                level,
                event = name,
                method = %req.method,
                path = %req.path,
                country = %req.country,
                city = %req.city,
                colo = %req.colo,
                ua = %req.user_agent,
                status = req.status,
                duration_ms = req.duration_ms,
                error = req.error.as_deref(),
                "request"
            ),
            CounterEvent::CountFetched { count }
            | CounterEvent::RateLimited { count }
            | CounterEvent::Incremented { count } => log_at!(level, event = name, count, "{name}"),
            CounterEvent::MarkFailed { count, error } => {
                log_at!(level, event = name, count, error = %error, "{name}")
            }
            CounterEvent::HealthOk { latency_ms } => {
                log_at!(level, event = name, latency_ms, "{name}")
            }
            CounterEvent::HealthDegraded { error } => {
                log_at!(level, event = name, error = %error, "{name}")
            }
        }
    }
}
