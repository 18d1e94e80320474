//! Network port and the reqwest-backed implementation.

use async_trait::async_trait;
use reqwest::Method;

use super::request::{CachedResponse, FetchRequest};

/// Performs live fetches on behalf of the offline worker.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse, NetworkError>;
}

/// Network failures - the request never produced a response.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Live network access through reqwest.
#[derive(Clone, Default)]
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse, NetworkError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .request(method, request.url.clone())
            .send()
            .await
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;

        Ok(CachedResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
