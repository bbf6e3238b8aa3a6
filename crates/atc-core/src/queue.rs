//! Landing and departing request queues with the dispatch selection rule.
use std::collections::VecDeque;

use tokio::sync::oneshot;

use atc_model::{Grant, PlaneId, Request, RequestKind};

/// A queued request together with the rendezvous back to its plane.
#[derive(Debug)]
pub struct Pending {
    request: Request,
    reply: oneshot::Sender<Grant>,
}

impl Pending {
    pub(crate) fn new(request: Request, reply: oneshot::Sender<Grant>) -> Self {
        Self { request, reply }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub(crate) fn into_parts(self) -> (Request, oneshot::Sender<Grant>) {
        (self.request, self.reply)
    }
}

/// Outcome of one dispatch selection step.
#[derive(Debug)]
pub enum Selection {
    /// Grant this request next.
    Next(Pending),
    /// Nothing is eligible right now; wait for a change and retry.
    Idle,
    /// Everyone is served and both queues are empty.
    Drained,
}

/// Landing and departing queues.
///
/// Emergency landings go to the front of the landing queue, everything else to
/// the back. Departures are strict FIFO.
#[derive(Debug, Default)]
pub struct RequestQueues {
    landing: VecDeque<Pending>,
    departing: VecDeque<Pending>,
}

impl RequestQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue by request kind.
    pub fn push(&mut self, pending: Pending) {
        match pending.request.kind {
            RequestKind::Landing if pending.request.emergency => {
                self.landing.push_front(pending)
            }
            RequestKind::Landing => self.landing.push_back(pending),
            RequestKind::Departing => self.departing.push_back(pending),
        }
    }

    /// Put back a request the dispatch loop popped but could not grant.
    ///
    /// It returns to the head of its own queue, ahead of everything that was
    /// queued behind it.
    pub fn requeue_front(&mut self, pending: Pending) {
        match pending.request.kind {
            RequestKind::Landing => self.landing.push_front(pending),
            RequestKind::Departing => self.departing.push_front(pending),
        }
    }

    /// Pick the next request to grant.
    ///
    /// Departures always go first. A landing is only taken when a gate is free,
    /// otherwise it stays at the head so emergency order survives the retry.
    pub fn select_next(&mut self, gate_available: bool, finished: bool) -> Selection {
        if finished && self.is_empty() {
            return Selection::Drained;
        }
        if let Some(next) = self.departing.pop_front() {
            return Selection::Next(next);
        }
        if gate_available {
            if let Some(next) = self.landing.pop_front() {
                return Selection::Next(next);
            }
        }
        Selection::Idle
    }

    pub fn landing_len(&self) -> usize {
        self.landing.len()
    }

    pub fn departing_len(&self) -> usize {
        self.departing.len()
    }

    pub fn len(&self) -> usize {
        self.landing.len() + self.departing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landing.is_empty() && self.departing.is_empty()
    }

    /// Planes waiting to land, head first.
    pub fn landing_order(&self) -> Vec<PlaneId> {
        self.landing.iter().map(|p| p.request.plane).collect()
    }
}
