//! Event reporting seam for the controller and plane agents.
//!
//! Sinks receive every observable airport transition (grants, resource hand-overs,
//! completions). They are write-only observers: no control decision reads them.
mod backend;
pub use backend::{EventHandle, EventSink};

mod noop;
pub use noop::NoOpSink;

mod memory;
pub use memory::MemorySink;

use std::sync::Arc;

/// Create a no-op sink handle.
#[inline]
pub fn noop_sink() -> EventHandle {
    Arc::new(NoOpSink)
}
