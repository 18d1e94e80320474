//! Cache storage port and its in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::request::{CachedResponse, FetchRequest};

/// Named cache generations, each a map from request to response snapshot.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Look a request up across every generation, oldest first.
    async fn match_request(&self, request: &FetchRequest) -> Option<CachedResponse>;

    /// Store a response in a generation, creating the generation if needed.
    async fn put(
        &self,
        generation: &str,
        request: &FetchRequest,
        response: CachedResponse,
    ) -> Result<(), CacheStorageError>;

    /// Names of all generations, in creation order.
    async fn keys(&self) -> Vec<String>;

    /// Drop a whole generation. Returns whether it existed.
    async fn delete(&self, generation: &str) -> bool;

    /// Cache keys held by one generation.
    async fn entries(&self, generation: &str) -> Vec<String>;
}

/// Cache storage errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheStorageError {
    #[error("Quota exceeded while storing {0}")]
    QuotaExceeded(String),
}

/// In-memory cache storage.
///
/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryCacheStorage {
    generations: RwLock<Vec<(String, HashMap<String, CachedResponse>)>>,
    /// Maximum number of entries across all generations; unbounded when `None`.
    quota: Option<usize>,
}

impl InMemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that refuses new entries once `max_entries` are held.
    pub fn with_quota(max_entries: usize) -> Self {
        Self {
            generations: RwLock::default(),
            quota: Some(max_entries),
        }
    }
}

#[async_trait]
impl CacheStorage for InMemoryCacheStorage {
    async fn match_request(&self, request: &FetchRequest) -> Option<CachedResponse> {
        let key = request.cache_key();
        let generations = self.generations.read().await;
        generations
            .iter()
            .find_map(|(_, entries)| entries.get(&key).cloned())
    }

    async fn put(
        &self,
        generation: &str,
        request: &FetchRequest,
        response: CachedResponse,
    ) -> Result<(), CacheStorageError> {
        let mut generations = self.generations.write().await;

        let index = match generations.iter().position(|(name, _)| name == generation) {
            Some(index) => index,
            None => {
                generations.push((generation.to_string(), HashMap::new()));
                generations.len() - 1
            }
        };

        let key = request.cache_key();
        if let Some(quota) = self.quota {
            let held: usize = generations.iter().map(|(_, entries)| entries.len()).sum();
            if held >= quota && !generations[index].1.contains_key(&key) {
                return Err(CacheStorageError::QuotaExceeded(key));
            }
        }

        generations[index].1.insert(key, response);
        Ok(())
    }

    async fn keys(&self) -> Vec<String> {
        let generations = self.generations.read().await;
        generations.iter().map(|(name, _)| name.clone()).collect()
    }

    async fn delete(&self, generation: &str) -> bool {
        let mut generations = self.generations.write().await;
        let before = generations.len();
        generations.retain(|(name, _)| name != generation);
        generations.len() != before
    }

    async fn entries(&self, generation: &str) -> Vec<String> {
        let generations = self.generations.read().await;
        let mut keys: Vec<String> = generations
            .iter()
            .filter(|(name, _)| name == generation)
            .flat_map(|(_, entries)| entries.keys().cloned())
            .collect();
        keys.sort();
        keys
    }
}
