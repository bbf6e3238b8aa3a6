use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

use atc_model::{AirportEvent, GateId, Grant, PlaneId, Request, RequestKind};

use super::Controller;
use crate::{
    error::AtcError,
    queue::{Pending, Selection},
};

/// How the dispatch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every expected plane completed and both queues are empty.
    Drained { served: usize },
    /// The caller's cancellation token fired first.
    Cancelled { served: usize },
}

impl Controller {
    /// Dispatch loop: select the next eligible request, grant it, repeat.
    ///
    /// Runs until drained or cancelled; spawn it on its own task. Only one loop
    /// may run per controller. Fatal errors stop the loop and are returned.
    #[instrument(
        level = "debug",
        skip(self),
        fields(gates = self.config.gates, expected = self.config.expected_planes)
    )]
    pub async fn run(&self) -> Result<DispatchOutcome, AtcError> {
        {
            let mut st = self.lock_state();
            if st.running {
                return Err(AtcError::AlreadyRunning);
            }
            st.running = true;
        }

        info!("controller has started operating");
        self.emit(AirportEvent::ControllerStarted {
            gates: self.config.gates,
            expected_planes: self.config.expected_planes,
        });

        loop {
            let step = match self.next_pending().await {
                Ok(Some(pending)) => self.grant(pending).await,
                Ok(None) => break,
                Err(e) => Err(e),
            };
            match step {
                Ok(()) => {}
                Err(AtcError::Cancelled) => {
                    let served = self.served();
                    warn!(served, "dispatch loop cancelled");
                    return Ok(DispatchOutcome::Cancelled { served });
                }
                Err(e) => {
                    error!(error = %e, "dispatch loop stopped");
                    return Err(e);
                }
            }
        }

        let served = self.served();
        info!(served, "controller drained");
        self.emit(AirportEvent::Drained { served });
        Ok(DispatchOutcome::Drained { served })
    }

    /// Wait until a request is eligible, or the controller drains.
    ///
    /// Wakes on queue changes, gate releases and the halt token; never spins.
    async fn next_pending(&self) -> Result<Option<Pending>, AtcError> {
        loop {
            let queued = self.queued.notified();
            let gate_freed = self.gates.released();
            tokio::pin!(queued);
            tokio::pin!(gate_freed);
            queued.as_mut().enable();
            gate_freed.as_mut().enable();

            {
                let mut st = self.lock_state();
                let finished = st.finished;
                // Once cancelled nothing more is popped; a drain still empties out.
                if self.halt.is_cancelled() && !finished {
                    return Err(AtcError::Cancelled);
                }
                match st.queues.select_next(self.gates.has_free(), finished) {
                    Selection::Next(pending) => return Ok(Some(pending)),
                    Selection::Drained => return Ok(None),
                    Selection::Idle if finished => {
                        return Err(AtcError::Inconsistent(format!(
                            "{} landing requests still queued after drain",
                            st.queues.landing_len()
                        )));
                    }
                    Selection::Idle => {}
                }
            }

            tokio::select! {
                _ = queued.as_mut() => {}
                _ = gate_freed.as_mut() => {}
                _ = self.halt.cancelled() => {}
            }
        }
    }

    /// Clear the runway (and a gate for landings), then hand the grant over.
    ///
    /// A cancellation before the grant is sent puts the request back at the
    /// head of its queue, so nothing is granted once the halt token fired.
    async fn grant(&self, pending: Pending) -> Result<(), AtcError> {
        let (plane, kind) = (pending.request().plane, pending.request().kind);
        if self.is_finished() {
            return Err(AtcError::Inconsistent(format!(
                "{plane} still queued for {kind} after drain"
            )));
        }

        let cleared = match kind {
            RequestKind::Landing => self.clear_for_landing(plane).await.map(Some),
            RequestKind::Departing => self.await_runway_free().await.map(|()| None),
        };
        let gate = match cleared {
            Ok(gate) => gate,
            Err(e) => {
                if e == AtcError::Cancelled {
                    debug!(%plane, %kind, "grant interrupted, request stays queued");
                    self.lock_state().queues.requeue_front(pending);
                }
                return Err(e);
            }
        };

        let (request, reply) = pending.into_parts();
        match gate {
            Some(gate) => self.deliver_landing(request, reply, gate),
            None => {
                self.deliver_departure(request, reply);
                Ok(())
            }
        }
    }

    fn deliver_landing(
        &self,
        request: Request,
        reply: oneshot::Sender<Grant>,
        gate: GateId,
    ) -> Result<(), AtcError> {
        let plane = request.plane;
        self.lock_state().granted += 1;
        info!(
            %plane,
            %gate,
            emergency = request.emergency,
            waited_ms = request.enqueued_at.elapsed().as_millis() as u64,
            "landing permission granted"
        );
        self.emit(AirportEvent::LandingGranted { plane, gate });

        if reply.send(Grant::Landing { gate }).is_err() {
            warn!(%plane, %gate, "plane stopped waiting, returning its gate");
            self.lock_state().abandoned += 1;
            self.release_gate(plane, gate)?;
        }
        Ok(())
    }

    fn deliver_departure(&self, request: Request, reply: oneshot::Sender<Grant>) {
        let plane = request.plane;
        self.lock_state().granted += 1;
        info!(
            %plane,
            waited_ms = request.enqueued_at.elapsed().as_millis() as u64,
            "take-off permission granted"
        );
        self.emit(AirportEvent::DepartureGranted { plane });

        if reply.send(Grant::Departure).is_err() {
            warn!(%plane, "plane stopped waiting for take-off permission");
            self.lock_state().abandoned += 1;
        }
    }

    /// Wait until the runway is free and a gate can be reserved for `plane`.
    ///
    /// The runway is only checked here; the plane claims it for its landing roll.
    /// If the gate is taken between the check and the claim, start over.
    async fn clear_for_landing(&self, plane: PlaneId) -> Result<GateId, AtcError> {
        loop {
            let runway_freed = self.runway.released();
            let gate_freed = self.gates.released();
            tokio::pin!(runway_freed);
            tokio::pin!(gate_freed);
            runway_freed.as_mut().enable();
            gate_freed.as_mut().enable();

            if self.halt.is_cancelled() {
                return Err(self.grant_interrupted());
            }
            if self.runway.is_free() {
                match self.gates.try_acquire(plane)? {
                    Some(gate) => return Ok(gate),
                    None => debug!(%plane, "no free gate at grant time, re-checking"),
                }
            }

            tokio::select! {
                _ = runway_freed.as_mut() => {}
                _ = gate_freed.as_mut() => {}
                _ = self.halt.cancelled() => return Err(self.grant_interrupted()),
            }
        }
    }

    async fn await_runway_free(&self) -> Result<(), AtcError> {
        loop {
            let runway_freed = self.runway.released();
            tokio::pin!(runway_freed);
            runway_freed.as_mut().enable();

            if self.halt.is_cancelled() {
                return Err(self.grant_interrupted());
            }
            if self.runway.is_free() {
                return Ok(());
            }

            tokio::select! {
                _ = runway_freed.as_mut() => {}
                _ = self.halt.cancelled() => return Err(self.grant_interrupted()),
            }
        }
    }

    /// A grant in progress can only be cut short by cancellation; a drain while a
    /// request is outstanding means some plane completed without being granted.
    fn grant_interrupted(&self) -> AtcError {
        match self.interruption() {
            AtcError::Drained => {
                AtcError::Inconsistent("controller drained while a grant was pending".to_string())
            }
            other => other,
        }
    }
}
