use crate::{queue::RequestQueues, stats::WaitTimeStats};

/// Counters proving no request is silently lost.
///
/// `queued + granted <= submitted` holds at every observation; the difference is
/// requests the dispatch loop is currently granting. `abandoned` counts the subset
/// of `granted` whose plane had stopped listening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestLedger {
    pub submitted: usize,
    pub granted: usize,
    /// Grants whose plane stopped listening before delivery.
    pub abandoned: usize,
    pub queued: usize,
}

/// Everything guarded by the controller's state lock.
#[derive(Debug, Default)]
pub(super) struct DispatchState {
    pub queues: RequestQueues,
    pub stats: WaitTimeStats,
    pub served: usize,
    pub finished: bool,
    pub running: bool,
    pub submitted: usize,
    pub granted: usize,
    pub abandoned: usize,
}

impl DispatchState {
    pub fn ledger(&self) -> RequestLedger {
        RequestLedger {
            submitted: self.submitted,
            granted: self.granted,
            abandoned: self.abandoned,
            queued: self.queues.len(),
        }
    }
}
