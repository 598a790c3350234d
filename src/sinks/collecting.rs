use std::sync::Mutex;

use crate::engine::events::NormalizedEvent;
use crate::engine::sink::EventSink;
use crate::error::SinkError;

/// An in-memory sink that keeps every emitted event.
///
/// Used by tests and by `replay` to build its summary.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<NormalizedEvent>>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Clone out all collected events.
    pub fn events(&self) -> Vec<NormalizedEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: &NormalizedEvent) -> Result<(), SinkError> {
        let mut guard = self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.push(event.clone());
        Ok(())
    }
}
