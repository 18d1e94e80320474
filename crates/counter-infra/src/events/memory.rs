//! In-memory event sink.
//!
//! Keeps every event for later inspection; used by tests and local tooling.

use std::sync::Mutex;

use counter_core::ports::{CounterEvent, EventSink};

#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<CounterEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CounterEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Event names in emission order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(CounterEvent::name).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: CounterEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
