//! Health check endpoint.

use actix_web::{HttpResponse, web};

use counter_core::domain::HealthReport;
use counter_core::service::HEALTH_FAILURE_MESSAGE;
use counter_shared::dto::{HealthResponse, SERVICE_NAME};

use crate::state::AppState;

/// Probes the store - 200 when it answers, 503 otherwise.
///
/// Any method on /health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let report = state.service.health().await;
    let body = health_body(&report, &state.hosting);

    if report.is_ok() {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

fn health_body(report: &HealthReport, hosting: &str) -> HealthResponse {
    let (status, error) = if report.is_ok() {
        ("ok", None)
    } else {
        ("degraded", Some(HEALTH_FAILURE_MESSAGE.to_string()))
    };

    HealthResponse {
        status: status.to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: report.checked_at.to_rfc3339(),
        backend: report.backend.to_string(),
        hosting: hosting.to_string(),
        latency_ms: report
            .latency
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        error,
    }
}
