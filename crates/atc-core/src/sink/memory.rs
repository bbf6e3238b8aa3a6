use std::sync::{Mutex, PoisonError};

use atc_model::{AirportEvent, PlaneId};

use crate::sink::backend::EventSink;

/// Sink that keeps every event in emission order.
///
/// Used by tests and by tooling that wants to replay a run after it finished.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AirportEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<AirportEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Grant events only, in the order they were issued.
    pub fn grants(&self) -> Vec<AirportEvent> {
        self.events().into_iter().filter(|e| e.is_grant()).collect()
    }

    /// Planes in the order they were granted anything.
    pub fn grant_order(&self) -> Vec<PlaneId> {
        self.grants().iter().filter_map(AirportEvent::plane).collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &AirportEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
