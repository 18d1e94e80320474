//! The offline worker: install, activate and per-request cache policies.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::try_join_all;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use counter_shared::dto::CountResponse;

use super::config::WorkerConfig;
use super::network::{Network, NetworkError};
use super::request::{CachedResponse, FetchRequest, RequestClass};
use super::storage::{CacheStorage, CacheStorageError};

/// Lifecycle of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installed,
    Activated,
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    OfflineFallback,
}

/// Result of an intercepted fetch.
#[derive(Debug)]
pub struct FetchOutcome {
    pub response: CachedResponse,
    pub source: ResponseSource,
    /// Background refresh started by stale-while-revalidate, if any.
    pub revalidation: Option<JoinHandle<()>>,
}

impl FetchOutcome {
    fn new(response: CachedResponse, source: ResponseSource) -> Self {
        Self {
            response,
            source,
            revalidation: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Invalid manifest path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Failed to fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: NetworkError,
    },

    #[error("Bad response for {path}: HTTP {status}")]
    BadStatus { path: String, status: u16 },

    #[error(transparent)]
    Storage(#[from] CacheStorageError),
}

/// Summary of an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Generations deleted because they are not the current one.
    pub removed: Vec<String>,
}

pub struct OfflineWorker {
    config: WorkerConfig,
    network: Arc<dyn Network>,
    storage: Arc<dyn CacheStorage>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    controls_clients: AtomicBool,
}

impl OfflineWorker {
    pub fn new(
        config: WorkerConfig,
        network: Arc<dyn Network>,
        storage: Arc<dyn CacheStorage>,
    ) -> Self {
        Self {
            config,
            network,
            storage,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            controls_clients: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Whether install asked to activate without waiting for open pages to close.
    pub fn skips_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Whether this worker has claimed the open pages.
    pub fn controls_clients(&self) -> bool {
        self.controls_clients.load(Ordering::SeqCst)
    }

    /// Precache the manifest into the current generation.
    ///
    /// All-or-nothing: every entry is fetched before anything is stored, a
    /// single failure or non-2xx response fails the install, and a storage
    /// failure drops the partly written generation.
    pub async fn install(&self) -> Result<(), InstallError> {
        let generation = self.config.generation.as_str();

        let fetches = self.config.manifest().map(|path| async move {
            let url = self
                .config
                .origin
                .join(path)
                .map_err(|e| InstallError::InvalidPath {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
            let request = FetchRequest::get(url);

            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|source| InstallError::Fetch {
                    path: path.to_string(),
                    source,
                })?;
            if !response.is_success() {
                return Err(InstallError::BadStatus {
                    path: path.to_string(),
                    status: response.status,
                });
            }

            Ok((request, response))
        });
        let fetched = try_join_all(fetches).await?;

        for (request, response) in fetched {
            if let Err(e) = self.storage.put(generation, &request, response).await {
                self.storage.delete(generation).await;
                return Err(e.into());
            }
        }

        *self.state.write().await = WorkerState::Installed;
        self.skip_waiting.store(true, Ordering::SeqCst);
        tracing::info!(generation, "Offline worker installed");

        Ok(())
    }

    /// Delete every other generation and take control of open pages.
    pub async fn activate(&self) -> Activation {
        let current = self.config.generation.as_str();

        let mut removed = Vec::new();
        for name in self.storage.keys().await {
            if name != current && self.storage.delete(&name).await {
                removed.push(name);
            }
        }

        *self.state.write().await = WorkerState::Activated;
        self.controls_clients.store(true, Ordering::SeqCst);
        tracing::info!(generation = current, removed = ?removed, "Offline worker activated");

        Activation { removed }
    }

    pub fn classify(&self, request: &FetchRequest) -> RequestClass {
        let host = request.url.host_str().unwrap_or_default();
        if host.contains(&self.config.api_host_marker) {
            RequestClass::Api
        } else if request.url.path().contains(&self.config.fonts_path) {
            RequestClass::Font
        } else {
            RequestClass::Static
        }
    }

    /// Answer an intercepted request according to its class.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, NetworkError> {
        match self.classify(request) {
            RequestClass::Api => Ok(self.network_first(request).await),
            RequestClass::Font => self.stale_while_revalidate(request).await,
            RequestClass::Static => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: &FetchRequest) -> FetchOutcome {
        match self.network.fetch(request).await {
            Ok(response) => FetchOutcome::new(response, ResponseSource::Network),
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "API unreachable, serving offline count");
                FetchOutcome::new(
                    CachedResponse::json(200, &CountResponse::offline()),
                    ResponseSource::OfflineFallback,
                )
            }
        }
    }

    async fn stale_while_revalidate(
        &self,
        request: &FetchRequest,
    ) -> Result<FetchOutcome, NetworkError> {
        if let Some(cached) = self.storage.match_request(request).await {
            let revalidation = tokio::spawn(refresh(
                self.network.clone(),
                self.storage.clone(),
                self.config.generation.as_str().to_string(),
                request.clone(),
            ));

            return Ok(FetchOutcome {
                response: cached,
                source: ResponseSource::Cache,
                revalidation: Some(revalidation),
            });
        }

        let response = self.network.fetch(request).await?;
        self.store(request, &response).await;
        Ok(FetchOutcome::new(response, ResponseSource::Network))
    }

    async fn cache_first(&self, request: &FetchRequest) -> Result<FetchOutcome, NetworkError> {
        if let Some(cached) = self.storage.match_request(request).await {
            return Ok(FetchOutcome::new(cached, ResponseSource::Cache));
        }

        let response = self.network.fetch(request).await?;
        self.store(request, &response).await;
        Ok(FetchOutcome::new(response, ResponseSource::Network))
    }

    /// Keep a copy of a cacheable GET response in the current generation.
    async fn store(&self, request: &FetchRequest, response: &CachedResponse) {
        if !request.is_get() || !response.is_cacheable() {
            return;
        }

        let generation = self.config.generation.as_str();
        if let Err(e) = self.storage.put(generation, request, response.clone()).await {
            tracing::warn!(url = %request.url, error = %e, "Failed to cache response");
        }
    }
}

/// Background half of stale-while-revalidate.
async fn refresh(
    network: Arc<dyn Network>,
    storage: Arc<dyn CacheStorage>,
    generation: String,
    request: FetchRequest,
) {
    match network.fetch(&request).await {
        Ok(response) if response.is_cacheable() => {
            if let Err(e) = storage.put(&generation, &request, response).await {
                tracing::warn!(url = %request.url, error = %e, "Failed to refresh cached font");
            }
        }
        Ok(response) => {
            tracing::debug!(url = %request.url, status = response.status, "Font refresh not cacheable");
        }
        Err(e) => {
            tracing::debug!(url = %request.url, error = %e, "Font refresh failed, keeping stale copy");
        }
    }
}
