//! How the widget reaches the counter service.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;

use counter_shared::dto::{CountResponse, VoteResponse};

use crate::offline::{CachedResponse, FetchRequest, OfflineWorker, ResponseSource};

/// Counter API as seen from the page.
#[async_trait]
pub trait CounterApi: Send + Sync {
    /// `GET /`
    async fn fetch_count(&self) -> Result<CountResponse, ApiError>;

    /// `POST /`
    async fn vote(&self) -> Result<VoteResponse, ApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Counter service answered HTTP {0}")]
    Status(u16),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// The cache layer answered in place of an unreachable service.
    #[error("Counter service is offline")]
    Offline,
}

/// Talks to the counter service directly over HTTP.
#[derive(Clone)]
pub struct HttpCounterApi {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpCounterApi {
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CounterApi for HttpCounterApi {
    async fn fetch_count(&self) -> Result<CountResponse, ApiError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Self::decode(response).await
    }

    async fn vote(&self) -> Result<VoteResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Self::decode(response).await
    }
}

/// Routes every call through the offline worker, the way a controlled page does.
#[derive(Clone)]
pub struct WorkerCounterApi {
    worker: Arc<OfflineWorker>,
    endpoint: Url,
}

impl WorkerCounterApi {
    pub fn new(worker: Arc<OfflineWorker>, endpoint: Url) -> Self {
        Self { worker, endpoint }
    }

    async fn send(&self, request: FetchRequest) -> Result<(CachedResponse, ResponseSource), ApiError> {
        let outcome = self
            .worker
            .handle_fetch(&request)
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !outcome.response.is_success() {
            return Err(ApiError::Status(outcome.response.status));
        }
        Ok((outcome.response, outcome.source))
    }
}

fn parse<T: DeserializeOwned>(response: &CachedResponse) -> Result<T, ApiError> {
    serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl CounterApi for WorkerCounterApi {
    /// Offline, this yields the synthetic zero count.
    async fn fetch_count(&self) -> Result<CountResponse, ApiError> {
        let (response, _) = self.send(FetchRequest::get(self.endpoint.clone())).await?;
        parse(&response)
    }

    /// Offline, the synthetic count is not a vote receipt, so it is an error.
    async fn vote(&self) -> Result<VoteResponse, ApiError> {
        let (response, source) = self.send(FetchRequest::post(self.endpoint.clone())).await?;
        if source == ResponseSource::OfflineFallback {
            return Err(ApiError::Offline);
        }
        parse(&response)
    }
}
