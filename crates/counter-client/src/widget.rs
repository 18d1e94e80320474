//! The vote button and count display.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use counter_shared::format_count;

use crate::api::CounterApi;

/// Local storage key marking that this browser has voted.
pub const VOTE_FLAG_KEY: &str = "1mb_voted";

/// The only value of [`VOTE_FLAG_KEY`] that counts as voted.
pub const VOTE_FLAG_VALUE: &str = "true";

/// Shown in place of the count when it cannot be fetched.
pub const COUNT_UNAVAILABLE: &str = "—";

/// Browser local storage, reduced to what the widget needs.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

#[derive(Default)]
pub struct InMemoryLocalStorage {
    items: Mutex<HashMap<String, String>>,
}

impl InMemoryLocalStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for InMemoryLocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
    }

    fn remove_item(&self, key: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.remove(key);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Ready,
    Pending,
    Voted,
    Error,
}

impl ButtonState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "count me",
            Self::Pending => "...",
            Self::Voted => "counted",
            Self::Error => "error",
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Pending | Self::Voted)
    }

    /// Whether the button carries the voted style.
    pub fn is_voted(&self) -> bool {
        matches!(self, Self::Voted)
    }
}

pub struct CounterWidget {
    api: Arc<dyn CounterApi>,
    storage: Arc<dyn LocalStorage>,
    count_text: String,
    button: ButtonState,
}

impl CounterWidget {
    pub fn new(api: Arc<dyn CounterApi>, storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            api,
            storage,
            count_text: String::new(),
            button: ButtonState::Ready,
        }
    }

    pub fn count_text(&self) -> &str {
        &self.count_text
    }

    pub fn button(&self) -> ButtonState {
        self.button
    }

    pub fn has_voted_locally(&self) -> bool {
        self.storage.get_item(VOTE_FLAG_KEY).as_deref() == Some(VOTE_FLAG_VALUE)
    }

    /// Page load: restore the voted state, then fetch the current count.
    pub async fn load(&mut self) {
        if self.has_voted_locally() {
            self.button = ButtonState::Voted;
        }

        self.count_text = match self.api.fetch_count().await {
            Ok(body) => format_count(body.count),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch count");
                COUNT_UNAVAILABLE.to_string()
            }
        };
    }

    /// Click on the button. Does nothing once voted or while a vote is in flight.
    pub async fn vote(&mut self) {
        if self.has_voted_locally() || self.button.is_disabled() {
            return;
        }

        self.button = ButtonState::Pending;

        match self.api.vote().await {
            Ok(receipt) => {
                self.count_text = format_count(receipt.count);
                self.storage.set_item(VOTE_FLAG_KEY, VOTE_FLAG_VALUE);
                self.button = ButtonState::Voted;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Vote failed");
                self.button = ButtonState::Error;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use counter_shared::dto::{CountResponse, VoteResponse};

    use crate::api::ApiError;

    /// Stands in for the service, including its 24h record for this client.
    #[derive(Default)]
    struct FakeApi {
        count: AtomicU64,
        server_record: AtomicBool,
        unreachable: AtomicBool,
        gets: AtomicUsize,
        posts: AtomicUsize,
    }

    impl FakeApi {
        fn with_count(count: u64) -> Arc<Self> {
            let api = Self::default();
            api.count.store(count, Ordering::SeqCst);
            Arc::new(api)
        }
    }

    #[async_trait]
    impl CounterApi for FakeApi {
        async fn fetch_count(&self) -> Result<CountResponse, ApiError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if self.unreachable.load(Ordering::SeqCst) {
                return Err(ApiError::Transport("connection refused".to_string()));
            }
            Ok(CountResponse::new(self.count.load(Ordering::SeqCst)))
        }

        async fn vote(&self) -> Result<VoteResponse, ApiError> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            if self.unreachable.load(Ordering::SeqCst) {
                return Err(ApiError::Offline);
            }

            let message = if self.server_record.swap(true, Ordering::SeqCst) {
                "Already counted"
            } else {
                self.count.fetch_add(1, Ordering::SeqCst);
                "Counted"
            };
            Ok(VoteResponse {
                count: self.count.load(Ordering::SeqCst),
                voted: true,
                message: message.to_string(),
            })
        }
    }

    fn widget(api: &Arc<FakeApi>, storage: &Arc<InMemoryLocalStorage>) -> CounterWidget {
        CounterWidget::new(api.clone(), storage.clone())
    }

    #[tokio::test]
    async fn test_fresh_load_renders_count() {
        let api = FakeApi::with_count(5);
        let storage = Arc::new(InMemoryLocalStorage::new());
        let mut widget = widget(&api, &storage);

        widget.load().await;

        assert_eq!(widget.count_text(), "5 others");
        assert_eq!(widget.button(), ButtonState::Ready);
        assert_eq!(widget.button().label(), "count me");
        assert!(!widget.button().is_disabled());
    }

    #[tokio::test]
    async fn test_vote_then_reload() {
        let api = FakeApi::with_count(5);
        let storage = Arc::new(InMemoryLocalStorage::new());
        let mut widget = widget(&api, &storage);
        widget.load().await;

        widget.vote().await;
        assert_eq!(widget.count_text(), "6 others");
        assert_eq!(widget.button().label(), "counted");
        assert!(widget.button().is_disabled());
        assert!(widget.button().is_voted());
        assert_eq!(storage.get_item(VOTE_FLAG_KEY).as_deref(), Some("true"));

        let mut reloaded = CounterWidget::new(api.clone(), storage.clone());
        reloaded.load().await;
        assert_eq!(reloaded.button(), ButtonState::Voted);
        assert_eq!(reloaded.count_text(), "6 others");
        assert_eq!(api.gets.load(Ordering::SeqCst), 2);
        assert_eq!(api.posts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_renders_dash() {
        let api = FakeApi::with_count(5);
        api.unreachable.store(true, Ordering::SeqCst);
        let storage = Arc::new(InMemoryLocalStorage::new());
        let mut widget = widget(&api, &storage);

        widget.load().await;
        assert_eq!(widget.count_text(), "—");
    }

    #[tokio::test]
    async fn test_vote_failure_allows_retry() {
        let api = FakeApi::with_count(5);
        let storage = Arc::new(InMemoryLocalStorage::new());
        let mut widget = widget(&api, &storage);
        widget.load().await;

        api.unreachable.store(true, Ordering::SeqCst);
        widget.vote().await;
        assert_eq!(widget.button().label(), "error");
        assert!(!widget.button().is_disabled());
        assert!(!widget.has_voted_locally());
        assert_eq!(widget.count_text(), "5 others");

        api.unreachable.store(false, Ordering::SeqCst);
        widget.vote().await;
        assert_eq!(widget.button(), ButtonState::Voted);
        assert_eq!(widget.count_text(), "6 others");
    }

    #[tokio::test]
    async fn test_cleared_flag_with_active_server_record() {
        let api = FakeApi::with_count(9);
        api.server_record.store(true, Ordering::SeqCst);
        let storage = Arc::new(InMemoryLocalStorage::new());
        let mut widget = widget(&api, &storage);
        widget.load().await;

        // The browser forgot, the server did not: no second increment.
        widget.vote().await;
        assert_eq!(widget.count_text(), "9 others");
        assert_eq!(widget.button(), ButtonState::Voted);
        assert!(widget.has_voted_locally());
        assert_eq!(api.count.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn test_flag_outlives_server_record() {
        let api = FakeApi::with_count(9);
        let storage = Arc::new(InMemoryLocalStorage::new());
        storage.set_item(VOTE_FLAG_KEY, "true");
        let mut widget = widget(&api, &storage);
        widget.load().await;

        // The server would accept a vote again, but the flag keeps the button off.
        widget.vote().await;
        assert_eq!(widget.button(), ButtonState::Voted);
        assert_eq!(api.posts.load(Ordering::SeqCst), 0);
        assert_eq!(api.count.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn test_only_true_flag_counts_as_voted() {
        let api = FakeApi::with_count(3);

        for stale in ["false", "", "1"] {
            let storage = Arc::new(InMemoryLocalStorage::new());
            storage.set_item(VOTE_FLAG_KEY, stale);
            let mut widget = widget(&api, &storage);

            widget.load().await;
            assert!(!widget.has_voted_locally(), "flag {stale:?}");
            assert_eq!(widget.button(), ButtonState::Ready);
        }
    }

    #[test]
    fn test_remove_item() {
        let storage = InMemoryLocalStorage::new();
        storage.set_item(VOTE_FLAG_KEY, "true");
        storage.remove_item(VOTE_FLAG_KEY);
        assert!(storage.get_item(VOTE_FLAG_KEY).is_none());
    }
}
