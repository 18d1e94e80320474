use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// Outcome of a backend health probe.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Label of the key-value backend that was probed.
    pub backend: &'static str,
    pub checked_at: DateTime<Utc>,
    /// Round trip of the probe; only set when it succeeded.
    pub latency: Option<Duration>,
}

impl HealthReport {
    pub fn ok(backend: &'static str, latency: Duration) -> Self {
        Self {
            status: HealthStatus::Ok,
            backend,
            checked_at: Utc::now(),
            latency: Some(latency),
        }
    }

    pub fn degraded(backend: &'static str) -> Self {
        Self {
            status: HealthStatus::Degraded,
            backend,
            checked_at: Utc::now(),
            latency: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}
