//! Offline cache layer.
//!
//! Sits between the page and the network: static assets are served
//! cache-first, fonts stale-while-revalidate, and counter API calls go
//! network-first with a synthetic `{"count":0,"offline":true}` answer when
//! the network is gone.

mod config;
mod network;
mod request;
mod storage;
mod worker;

pub use config::{CacheGeneration, FONT_ASSETS, STATIC_ASSETS, WorkerConfig};
pub use network::{HttpNetwork, Network, NetworkError};
pub use request::{CachedResponse, FetchRequest, RequestClass};
pub use storage::{CacheStorage, CacheStorageError, InMemoryCacheStorage};
pub use worker::{
    Activation, FetchOutcome, InstallError, OfflineWorker, ResponseSource, WorkerState,
};
