pub mod controller;
pub mod error;
pub mod queue;
pub mod resource;
pub mod sink;
pub mod stats;

pub use controller::{Controller, DispatchOutcome, RequestLedger};
pub use error::AtcError;
pub use queue::{Pending, RequestQueues, Selection};
pub use resource::{ExclusiveResource, GatePool};
pub use sink::{EventHandle, EventSink, MemorySink, NoOpSink, noop_sink};
pub use stats::{StatsSummary, WaitTimeStats};

pub mod prelude {
    pub use crate::controller::{Controller, DispatchOutcome};
    pub use crate::error::AtcError;
    pub use crate::sink::{EventHandle, EventSink};
    pub use crate::stats::StatsSummary;
}
