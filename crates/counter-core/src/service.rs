//! Counter service - read, vote and health operations over a [`KvStore`].
//!
//! The service holds no mutable state between calls; everything durable lives
//! in the store, and the store's atomic `INCR` is the only synchronisation.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::domain::{
    COUNT_KEY, HealthReport, IdentityHasher, RATE_LIMIT_SENTINEL, RATE_LIMIT_TTL, UNKNOWN_CLIENT,
    VoteOrdering, VoteOutcome, VoteStatus, parse_count,
};
use crate::error::BackendError;
use crate::ports::{Command, CounterEvent, EventSink, KvStore, NoopEventSink};

/// Error reported by a failed health probe.
pub const HEALTH_FAILURE_MESSAGE: &str = "Redis connection failed";

pub struct CounterService {
    store: Arc<dyn KvStore>,
    events: Arc<dyn EventSink>,
    hasher: IdentityHasher,
    ordering: VoteOrdering,
}

impl CounterService {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            events: Arc::new(NoopEventSink),
            hasher: IdentityHasher::default(),
            ordering: VoteOrdering::default(),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_ordering(mut self, ordering: VoteOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Current counter value; a missing key reads as zero.
    pub async fn read(&self) -> Result<u64, BackendError> {
        let count = self.current_count().await?;
        self.events.emit(CounterEvent::CountFetched { count });
        Ok(count)
    }

    /// Count a vote for `client`, at most once per rate-limit window.
    ///
    /// `client` is the raw network identifier from the trusted upstream header;
    /// a missing or empty one is treated as [`UNKNOWN_CLIENT`].
    pub async fn vote(&self, client: Option<&str>) -> Result<VoteOutcome, BackendError> {
        let client = client.filter(|c| !c.is_empty()).unwrap_or(UNKNOWN_CLIENT);
        let record_key = self.hasher.hash(client).rate_limit_key();

        match self.ordering {
            VoteOrdering::IncrementThenMark => self.increment_then_mark(&record_key).await,
            VoteOrdering::ClaimThenIncrement => self.claim_then_increment(&record_key).await,
        }
    }

    /// Ping the backend. Failures are reported, never propagated.
    pub async fn health(&self) -> HealthReport {
        let started = Instant::now();

        match self.store.execute(&Command::ping()).await {
            Ok(_) => {
                let latency = started.elapsed();
                self.events.emit(CounterEvent::HealthOk {
                    latency_ms: latency.as_millis() as u64,
                });
                HealthReport::ok(self.store.backend_name(), latency)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Health probe failed");
                self.events.emit(CounterEvent::HealthDegraded {
                    error: HEALTH_FAILURE_MESSAGE.to_string(),
                });
                HealthReport::degraded(self.store.backend_name())
            }
        }
    }

    async fn increment_then_mark(&self, record_key: &str) -> Result<VoteOutcome, BackendError> {
        let record = self.store.execute(&Command::get(record_key)).await?;
        if is_present(&record) {
            return self.already_counted().await;
        }

        let count = parse_count(&self.store.execute(&Command::incr(COUNT_KEY)).await?);

        // A lost mark means a possible over-count for this window, never a lost vote.
        let mark = Command::set_ex(record_key, RATE_LIMIT_SENTINEL, RATE_LIMIT_TTL);
        if let Err(e) = self.store.execute(&mark).await {
            tracing::warn!(count, error = %e, "Vote counted but rate-limit record not written");
            self.events.emit(CounterEvent::MarkFailed {
                count,
                error: e.to_string(),
            });
            return Err(e);
        }

        self.events.emit(CounterEvent::Incremented { count });
        Ok(VoteOutcome {
            count,
            status: VoteStatus::Counted,
        })
    }

    async fn claim_then_increment(&self, record_key: &str) -> Result<VoteOutcome, BackendError> {
        let claim = Command::set_nx_ex(record_key, RATE_LIMIT_SENTINEL, RATE_LIMIT_TTL);
        if !is_present(&self.store.execute(&claim).await?) {
            return self.already_counted().await;
        }

        let count = parse_count(&self.store.execute(&Command::incr(COUNT_KEY)).await?);
        self.events.emit(CounterEvent::Incremented { count });
        Ok(VoteOutcome {
            count,
            status: VoteStatus::Counted,
        })
    }

    async fn already_counted(&self) -> Result<VoteOutcome, BackendError> {
        let count = self.current_count().await?;
        self.events.emit(CounterEvent::RateLimited { count });
        Ok(VoteOutcome {
            count,
            status: VoteStatus::AlreadyCounted,
        })
    }

    async fn current_count(&self) -> Result<u64, BackendError> {
        let value = self.store.execute(&Command::get(COUNT_KEY)).await?;
        Ok(parse_count(&value))
    }
}

/// Store replies of `null` or `""` mean "no such key" / "not written".
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    /// Minimal store: string values, no TTL tracking, scripted failures.
    #[derive(Default)]
    struct FakeStore {
        data: Mutex<HashMap<String, String>>,
        log: Mutex<Vec<Command>>,
        failing: Mutex<HashSet<String>>,
    }

    impl FakeStore {
        fn with_count(count: u64) -> Self {
            let store = Self::default();
            store
                .data
                .lock()
                .unwrap()
                .insert(COUNT_KEY.to_string(), count.to_string());
            store
        }

        fn fail(&self, name: &str) {
            self.failing.lock().unwrap().insert(name.to_string());
        }

        fn heal(&self, name: &str) {
            self.failing.lock().unwrap().remove(name);
        }

        /// Drop every rate-limit record, as if the window elapsed.
        fn expire_records(&self) {
            self.data
                .lock()
                .unwrap()
                .retain(|key, _| !key.starts_with("voted:"));
        }

        fn calls(&self, name: &str) -> usize {
            self.log
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.name() == name)
                .count()
        }

        fn count(&self) -> Option<String> {
            self.data.lock().unwrap().get(COUNT_KEY).cloned()
        }
    }

    #[async_trait]
    impl KvStore for FakeStore {
        async fn execute(&self, command: &Command) -> Result<Value, BackendError> {
            self.log.lock().unwrap().push(command.clone());
            let name = command.name();
            if self.failing.lock().unwrap().contains(&name) {
                return Err(BackendError::Store(format!("{name} refused")));
            }

            let args = command.args();
            let mut data = self.data.lock().unwrap();
            match name.as_str() {
                "PING" => Ok(json!("PONG")),
                "GET" => Ok(data.get(&args[0]).cloned().map_or(Value::Null, Value::String)),
                "INCR" => {
                    let next = data.get(&args[0]).map_or(0, |v| v.parse::<i64>().unwrap()) + 1;
                    data.insert(args[0].clone(), next.to_string());
                    Ok(json!(next))
                }
                "SET" => {
                    let nx = args.iter().any(|a| a == "NX");
                    if nx && data.contains_key(&args[0]) {
                        return Ok(Value::Null);
                    }
                    data.insert(args[0].clone(), args[1].clone());
                    Ok(json!("OK"))
                }
                other => Err(BackendError::Store(format!("unknown command {other}"))),
            }
        }

        fn backend_name(&self) -> &'static str {
            "fake"
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<CounterEvent>>);

    impl EventSink for Recorder {
        fn emit(&self, event: CounterEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    impl Recorder {
        fn names(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().iter().map(|e| e.name()).collect()
        }
    }

    fn service(store: &Arc<FakeStore>) -> CounterService {
        CounterService::new(store.clone())
    }

    #[tokio::test]
    async fn test_read_missing_counter_is_zero() {
        let store = Arc::new(FakeStore::default());
        assert_eq!(service(&store).read().await.unwrap(), 0);
        assert_eq!(store.calls("INCR"), 0);
    }

    #[tokio::test]
    async fn test_read_unparseable_counter_is_zero() {
        let store = Arc::new(FakeStore::default());
        store
            .data
            .lock()
            .unwrap()
            .insert(COUNT_KEY.to_string(), "garbage".to_string());
        assert_eq!(service(&store).read().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_first_vote_increments_then_marks() {
        let store = Arc::new(FakeStore::with_count(5));
        let outcome = service(&store).vote(Some("203.0.113.9")).await.unwrap();

        assert_eq!(outcome.count, 6);
        assert_eq!(outcome.status, VoteStatus::Counted);

        let log = store.log.lock().unwrap();
        let names: Vec<_> = log.iter().map(Command::name).collect();
        assert_eq!(names, ["GET", "INCR", "SET"]);

        let key = IdentityHasher::default().hash("203.0.113.9").rate_limit_key();
        assert_eq!(log[0].args(), [key.clone()]);
        assert_eq!(log[2].as_slice(), [
            "SET".to_string(),
            key,
            "1".to_string(),
            "EX".to_string(),
            "86400".to_string()
        ]);
    }

    #[tokio::test]
    async fn test_repeat_vote_is_already_counted_without_incr() {
        let store = Arc::new(FakeStore::with_count(5));
        let svc = service(&store);

        let first = svc.vote(Some("198.51.100.4")).await.unwrap();
        for _ in 0..5 {
            let again = svc.vote(Some("198.51.100.4")).await.unwrap();
            assert_eq!(again.count, first.count);
            assert_eq!(again.status, VoteStatus::AlreadyCounted);
            assert_eq!(again.status.message(), "Already counted");
        }

        assert_eq!(store.calls("INCR"), 1);
        assert_eq!(store.count().as_deref(), Some("6"));
    }

    #[tokio::test]
    async fn test_distinct_identities_each_count_once() {
        let store = Arc::new(FakeStore::default());
        let svc = service(&store);

        for i in 0..20 {
            let ip = format!("10.1.0.{i}");
            svc.vote(Some(&ip)).await.unwrap();
            svc.vote(Some(&ip)).await.unwrap();
            svc.read().await.unwrap();
        }

        assert_eq!(svc.read().await.unwrap(), 20);
        assert_eq!(store.calls("INCR"), 20);
    }

    #[tokio::test]
    async fn test_missing_or_empty_client_shares_unknown_identity() {
        let store = Arc::new(FakeStore::default());
        let svc = service(&store);

        assert_eq!(svc.vote(None).await.unwrap().status, VoteStatus::Counted);
        assert_eq!(
            svc.vote(Some("")).await.unwrap().status,
            VoteStatus::AlreadyCounted
        );
        assert_eq!(
            svc.vote(Some(UNKNOWN_CLIENT)).await.unwrap().status,
            VoteStatus::AlreadyCounted
        );
    }

    #[tokio::test]
    async fn test_identity_counts_again_after_window() {
        let store = Arc::new(FakeStore::with_count(1));
        let svc = service(&store);

        svc.vote(Some("192.0.2.1")).await.unwrap();
        store.expire_records();

        let outcome = svc.vote(Some("192.0.2.1")).await.unwrap();
        assert_eq!(outcome.status, VoteStatus::Counted);
        assert_eq!(outcome.count, 3);
    }

    #[tokio::test]
    async fn test_failed_lookup_leaves_counter_untouched() {
        let store = Arc::new(FakeStore::with_count(9));
        store.fail("GET");

        assert!(service(&store).vote(Some("192.0.2.2")).await.is_err());
        assert_eq!(store.calls("INCR"), 0);
        assert_eq!(store.count().as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn test_failed_mark_keeps_increment_and_allows_recount() {
        let store = Arc::new(FakeStore::with_count(9));
        let events = Arc::new(Recorder::default());
        let svc = service(&store).with_events(events.clone());

        store.fail("SET");
        let err = svc.vote(Some("192.0.2.3")).await.unwrap_err();
        assert!(matches!(err, BackendError::Store(_)));
        assert_eq!(store.count().as_deref(), Some("10"));
        assert!(events.names().contains(&"vote.mark_failed"));

        // Identity is still unmarked, so the retry counts again.
        store.heal("SET");
        let retry = svc.vote(Some("192.0.2.3")).await.unwrap();
        assert_eq!(retry.status, VoteStatus::Counted);
        assert_eq!(retry.count, 11);
    }

    #[tokio::test]
    async fn test_claim_then_increment_ordering() {
        let store = Arc::new(FakeStore::with_count(2));
        let svc = service(&store).with_ordering(VoteOrdering::ClaimThenIncrement);

        let first = svc.vote(Some("192.0.2.4")).await.unwrap();
        assert_eq!(first.count, 3);
        assert_eq!(first.status, VoteStatus::Counted);

        let second = svc.vote(Some("192.0.2.4")).await.unwrap();
        assert_eq!(second.count, 3);
        assert_eq!(second.status, VoteStatus::AlreadyCounted);

        let names: Vec<_> = store.log.lock().unwrap().iter().map(Command::name).collect();
        assert_eq!(names, ["SET", "INCR", "SET", "GET"]);
    }

    #[tokio::test]
    async fn test_claim_then_increment_failed_incr_loses_vote_for_window() {
        let store = Arc::new(FakeStore::with_count(2));
        let svc = service(&store).with_ordering(VoteOrdering::ClaimThenIncrement);

        store.fail("INCR");
        assert!(svc.vote(Some("192.0.2.5")).await.is_err());
        store.heal("INCR");

        let retry = svc.vote(Some("192.0.2.5")).await.unwrap();
        assert_eq!(retry.status, VoteStatus::AlreadyCounted);
        assert_eq!(retry.count, 2);
    }

    #[tokio::test]
    async fn test_health_ok_reports_latency() {
        let store = Arc::new(FakeStore::default());
        let events = Arc::new(Recorder::default());
        let report = service(&store).with_events(events.clone()).health().await;

        assert!(report.is_ok());
        assert!(report.latency.is_some());
        assert_eq!(report.backend, "fake");
        assert_eq!(events.names(), ["health.ok"]);
        assert!(store.count().is_none());
    }

    #[tokio::test]
    async fn test_health_degraded_on_backend_failure() {
        let store = Arc::new(FakeStore::default());
        store.fail("PING");
        let events = Arc::new(Recorder::default());
        let report = service(&store).with_events(events.clone()).health().await;

        assert!(!report.is_ok());
        assert!(report.latency.is_none());
        assert_eq!(
            events.0.lock().unwrap().as_slice(),
            [CounterEvent::HealthDegraded {
                error: HEALTH_FAILURE_MESSAGE.to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_events_follow_vote_lifecycle() {
        let store = Arc::new(FakeStore::with_count(0));
        let events = Arc::new(Recorder::default());
        let svc = service(&store).with_events(events.clone());

        svc.read().await.unwrap();
        svc.vote(Some("192.0.2.6")).await.unwrap();
        svc.vote(Some("192.0.2.6")).await.unwrap();

        assert_eq!(
            events.names(),
            ["count.fetch", "vote.new", "vote.rate_limited"]
        );
    }
}
