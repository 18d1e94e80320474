//! Application state - shared across all handlers.

use std::sync::Arc;

use counter_core::CounterService;
use counter_core::ports::{EventSink, KvStore};
use counter_infra::InMemoryKvStore;

use crate::config::{AppConfig, KvBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CounterService>,
    /// Header the client address is read from.
    pub client_ip_header: String,
    pub hosting: String,
}

impl AppState {
    pub fn new(service: CounterService, config: &AppConfig) -> Self {
        Self {
            service: Arc::new(service),
            client_ip_header: config.client_ip_header.clone(),
            hosting: config.hosting.clone(),
        }
    }

    /// Build the application state with the configured backend.
    pub async fn from_config(
        config: &AppConfig,
        events: Arc<dyn EventSink>,
    ) -> anyhow::Result<Self> {
        let store = build_store(config.kv_backend).await?;
        tracing::info!(
            backend = store.backend_name(),
            ordering = ?config.vote_ordering,
            "Key-value store ready"
        );

        let service = CounterService::new(store)
            .with_events(events)
            .with_ordering(config.vote_ordering);

        Ok(Self::new(service, config))
    }
}

async fn build_store(backend: KvBackend) -> anyhow::Result<Arc<dyn KvStore>> {
    match backend {
        KvBackend::Upstash => {
            #[cfg(feature = "upstash")]
            {
                let store = counter_infra::UpstashKvStore::from_env()?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "upstash"))]
            {
                Err(counter_infra::KvConfigError::Disabled("upstash").into())
            }
        }
        KvBackend::Redis => {
            #[cfg(feature = "redis")]
            {
                let store = counter_infra::RedisKvStore::from_env().await?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "redis"))]
            {
                Err(counter_infra::KvConfigError::Disabled("redis").into())
            }
        }
        KvBackend::Memory => {
            tracing::warn!("Running with the in-memory store; counts are lost on restart");
            Ok(Arc::new(InMemoryKvStore::new()))
        }
    }
}
