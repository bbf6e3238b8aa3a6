use std::sync::Arc;

use atc_model::AirportEvent;

/// Receiver of airport events.
///
/// Called synchronously from the emitting task, sometimes while the controller
/// holds its state lock. Implementations must not block and must never call back
/// into the controller.
pub trait EventSink: Send + Sync + 'static {
    /// Record a single event.
    fn emit(&self, event: &AirportEvent);
}

/// Shared handle to an event sink.
///
/// Owned by the controller and cloned into each plane agent.
pub type EventHandle = Arc<dyn EventSink>;
