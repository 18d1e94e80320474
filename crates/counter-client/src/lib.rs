//! # Counter Client
//!
//! Browser-side pieces of the 1mb site, expressed against small traits so they
//! run the same under a real browser shim, a native HTTP client or tests:
//!
//! - [`offline`] - the offline cache layer that intercepts outbound requests
//! - [`widget`] - the vote button and count display
//! - [`api`] - how the widget reaches the counter service

pub mod api;
pub mod offline;
pub mod widget;

pub use api::{ApiError, CounterApi, HttpCounterApi, WorkerCounterApi};
pub use offline::{CacheGeneration, OfflineWorker, WorkerConfig};
pub use widget::{ButtonState, CounterWidget, InMemoryLocalStorage, LocalStorage};
