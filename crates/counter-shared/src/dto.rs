//! Data Transfer Objects - request/response bodies of the counter API.

use serde::{Deserialize, Serialize};

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "1mb-counter";

fn is_false(value: &bool) -> bool {
    !*value
}

/// `GET /` body, also the shape of the offline fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
    /// Set only on the synthetic response served while offline.
    #[serde(default, skip_serializing_if = "is_false")]
    pub offline: bool,
}

impl CountResponse {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            offline: false,
        }
    }

    /// `{"count":0,"offline":true}`
    pub fn offline() -> Self {
        Self {
            count: 0,
            offline: true,
        }
    }
}

/// `POST /` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub count: u64,
    pub voted: bool,
    pub message: String,
}

/// `GET /health` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
    pub backend: String,
    pub hosting: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_response_omits_offline_when_false() {
        assert_eq!(
            serde_json::to_value(CountResponse::new(5)).unwrap(),
            json!({"count": 5})
        );
        assert_eq!(
            serde_json::to_value(CountResponse::offline()).unwrap(),
            json!({"count": 0, "offline": true})
        );
    }

    #[test]
    fn test_count_response_accepts_plain_body() {
        let parsed: CountResponse = serde_json::from_str(r#"{"count":12}"#).unwrap();
        assert_eq!(parsed, CountResponse::new(12));
    }

    #[test]
    fn test_degraded_health_has_no_latency() {
        let body = HealthResponse {
            status: "degraded".to_string(),
            service: SERVICE_NAME.to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            backend: "upstash-redis".to_string(),
            hosting: "cloudflare-workers".to_string(),
            latency_ms: None,
            error: Some("Redis connection failed".to_string()),
        };
        let value = serde_json::to_value(body).unwrap();
        assert!(value.get("latency_ms").is_none());
        assert_eq!(value["error"], "Redis connection failed");
    }
}
