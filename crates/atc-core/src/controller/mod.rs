//! Airport controller: request admission, grants, shared resources and drain.
//!
//! Locking: the controller state lock guards queues, counters and stats. It may be
//! held while briefly taking the gate pool lock (to ask whether a gate is free),
//! never the other way round. Runway and fuel truck locks are never taken under the
//! state lock. No lock is held across an await point.
mod dispatch;
pub use dispatch::DispatchOutcome;

mod state;
pub use state::RequestLedger;
use state::DispatchState;

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::sync::{Notify, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use atc_model::{
    AirportConfig, AirportEvent, FUEL_TRUCK, GateId, Grant, PlaneId, RUNWAY, Request,
};

use crate::{
    error::AtcError,
    queue::Pending,
    resource::{ExclusiveResource, GatePool, lock},
    sink::{EventHandle, noop_sink},
    stats::StatsSummary,
};

/// The single arbitration authority shared by all planes.
///
/// Planes submit landing/departure requests and block until the dispatch loop
/// ([`Controller::run`]) grants them. Once granted, planes use the runway, gates
/// and fuel truck through the controller's resource methods.
pub struct Controller {
    config: AirportConfig,
    state: Mutex<DispatchState>,
    /// Wakes the dispatch loop on queue changes and on drain.
    queued: Notify,
    runway: ExclusiveResource,
    fuel_truck: ExclusiveResource,
    gates: GatePool,
    sink: EventHandle,
    /// Child of the caller's token; also cancelled on drain.
    halt: CancellationToken,
}

impl Controller {
    /// Create a controller for `config`.
    ///
    /// `token` cancels every wait (dispatch and planes) when fired. With
    /// `expected_planes == 0` the controller starts out drained.
    pub fn new(
        config: AirportConfig,
        sink: EventHandle,
        token: &CancellationToken,
    ) -> Result<Arc<Self>, AtcError> {
        config.validate()?;

        let halt = token.child_token();
        let finished = config.expected_planes == 0;
        if finished {
            halt.cancel();
        }

        Ok(Arc::new(Self {
            config,
            state: Mutex::new(DispatchState {
                finished,
                ..Default::default()
            }),
            queued: Notify::new(),
            runway: ExclusiveResource::new(RUNWAY),
            fuel_truck: ExclusiveResource::new(FUEL_TRUCK),
            gates: GatePool::new(config.gates),
            sink,
            halt,
        }))
    }

    /// Controller with a no-op sink and its own cancellation token.
    pub fn with_defaults(gates: usize, expected_planes: usize) -> Result<Arc<Self>, AtcError> {
        Self::new(
            AirportConfig::new(gates, expected_planes),
            noop_sink(),
            &CancellationToken::new(),
        )
    }

    pub fn config(&self) -> &AirportConfig {
        &self.config
    }

    /// Handle to the event sink, shared with planes.
    pub fn sink(&self) -> &EventHandle {
        &self.sink
    }

    pub fn gates(&self) -> &GatePool {
        &self.gates
    }

    pub fn runway(&self) -> &ExclusiveResource {
        &self.runway
    }

    pub fn fuel_truck(&self) -> &ExclusiveResource {
        &self.fuel_truck
    }

    fn lock_state(&self) -> MutexGuard<'_, DispatchState> {
        lock(&self.state)
    }

    fn emit(&self, event: AirportEvent) {
        self.sink.emit(&event);
    }

    /// Ask to land and wait for the grant.
    ///
    /// Returns the gate reserved for the plane.
    #[instrument(level = "debug", skip(self))]
    pub async fn submit_landing(
        &self,
        plane: PlaneId,
        emergency: bool,
    ) -> Result<GateId, AtcError> {
        let rx = self.enqueue(
            Request::landing(plane, emergency),
            AirportEvent::LandingRequested { plane, emergency },
        )?;
        match self.await_grant(plane, rx).await? {
            Grant::Landing { gate } => Ok(gate),
            Grant::Departure => Err(AtcError::Inconsistent(format!(
                "{plane} asked to land but was cleared for departure"
            ))),
        }
    }

    /// Ask to depart and wait for the grant.
    ///
    /// The grant does not claim the runway; the plane acquires it itself.
    #[instrument(level = "debug", skip(self))]
    pub async fn submit_departure(&self, plane: PlaneId) -> Result<(), AtcError> {
        let rx = self.enqueue(
            Request::departing(plane),
            AirportEvent::DepartureRequested { plane },
        )?;
        match self.await_grant(plane, rx).await? {
            Grant::Departure => Ok(()),
            Grant::Landing { gate } => Err(AtcError::Inconsistent(format!(
                "{plane} asked to depart but was cleared to land at {gate}"
            ))),
        }
    }

    fn enqueue(
        &self,
        request: Request,
        event: AirportEvent,
    ) -> Result<oneshot::Receiver<Grant>, AtcError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut st = self.lock_state();
            if st.finished {
                return Err(AtcError::Drained);
            }
            debug!(
                plane = %request.plane,
                kind = %request.kind,
                emergency = request.emergency,
                "request queued"
            );
            self.emit(event);
            st.queues.push(Pending::new(request, tx));
            st.submitted += 1;
        }
        self.queued.notify_one();
        Ok(rx)
    }

    async fn await_grant(
        &self,
        plane: PlaneId,
        mut rx: oneshot::Receiver<Grant>,
    ) -> Result<Grant, AtcError> {
        tokio::select! {
            biased;
            grant = &mut rx => grant.map_err(|_| {
                if self.halt.is_cancelled() {
                    self.interruption()
                } else {
                    AtcError::GrantDropped(plane)
                }
            }),
            _ = self.halt.cancelled() => {
                self.refuse_grant(plane, &mut rx)?;
                Err(self.interruption())
            }
        }
    }

    /// Close the rendezvous of an interrupted wait.
    ///
    /// After `close` the dispatch loop can no longer deliver; a grant that
    /// slipped in before it is handed back as abandoned, gate included.
    fn refuse_grant(
        &self,
        plane: PlaneId,
        rx: &mut oneshot::Receiver<Grant>,
    ) -> Result<(), AtcError> {
        rx.close();
        let Ok(grant) = rx.try_recv() else {
            return Ok(());
        };
        debug!(%plane, ?grant, "grant arrived after interruption, handing it back");
        self.lock_state().abandoned += 1;
        match grant {
            Grant::Landing { gate } => self.release_gate(plane, gate),
            Grant::Departure => Ok(()),
        }
    }

    /// Error for a wait cut short by the halt token.
    fn interruption(&self) -> AtcError {
        if self.is_finished() {
            AtcError::Drained
        } else {
            AtcError::Cancelled
        }
    }

    pub async fn acquire_runway(&self, plane: PlaneId) -> Result<(), AtcError> {
        self.acquire_exclusive(&self.runway, plane).await
    }

    pub fn release_runway(&self, plane: PlaneId) -> Result<(), AtcError> {
        self.release_exclusive(&self.runway, plane)
    }

    pub async fn acquire_fuel_truck(&self, plane: PlaneId) -> Result<(), AtcError> {
        self.acquire_exclusive(&self.fuel_truck, plane).await
    }

    pub fn release_fuel_truck(&self, plane: PlaneId) -> Result<(), AtcError> {
        self.release_exclusive(&self.fuel_truck, plane)
    }

    async fn acquire_exclusive(
        &self,
        resource: &ExclusiveResource,
        plane: PlaneId,
    ) -> Result<(), AtcError> {
        match resource.acquire(plane, &self.halt).await {
            Ok(()) => {
                debug!(%plane, resource = resource.name(), "resource acquired");
                self.emit(AirportEvent::ResourceAcquired {
                    plane,
                    resource: resource.name(),
                });
                Ok(())
            }
            Err(AtcError::Cancelled) => Err(self.interruption()),
            Err(e) => Err(e),
        }
    }

    // Release events are emitted before the resource is actually freed so that in
    // the event stream a release always precedes the next holder's acquisition.
    // Only the holder can release, so the check cannot go stale in between.

    fn release_exclusive(
        &self,
        resource: &ExclusiveResource,
        plane: PlaneId,
    ) -> Result<(), AtcError> {
        if resource.holder() != Some(plane) {
            return Err(AtcError::ResourceNotHeld {
                plane,
                resource: resource.name(),
            });
        }
        self.emit(AirportEvent::ResourceReleased {
            plane,
            resource: resource.name(),
        });
        resource.release(plane)?;
        debug!(%plane, resource = resource.name(), "resource released");
        Ok(())
    }

    /// Return a gate assigned by a landing grant.
    pub fn release_gate(&self, plane: PlaneId, gate: GateId) -> Result<(), AtcError> {
        if self.gates.holder(gate) == Some(plane) {
            self.emit(AirportEvent::GateReleased { plane, gate });
        }
        self.gates.release(plane, gate)?;
        debug!(%plane, %gate, "gate released");
        Ok(())
    }

    /// Record one plane's combined landing and departure wait.
    pub fn report_wait_time(&self, wait: Duration) {
        self.lock_state().stats.record_wait(wait);
    }

    pub fn report_passengers(&self, count: u32) {
        self.lock_state().stats.record_passengers(count);
    }

    /// Count a plane as served; the last expected plane drains the controller.
    #[instrument(level = "debug", skip(self))]
    pub fn report_completion(&self, plane: PlaneId, wait: Duration) -> Result<(), AtcError> {
        let expected = self.config.expected_planes;
        let (served, drained) = {
            let mut st = self.lock_state();
            if st.served >= expected {
                return Err(AtcError::CompletionOverflow { expected });
            }
            st.served += 1;
            st.stats.record_served();
            if st.served == expected {
                st.finished = true;
            }
            // Emitted under the lock so it precedes the dispatch loop's drain event.
            self.emit(AirportEvent::PlaneCompleted {
                plane,
                wait,
                served: st.served,
                expected,
            });
            (st.served, st.finished)
        };

        info!(%plane, served, expected, "plane completed");

        if drained {
            info!(served, "all expected planes served, draining");
            self.halt.cancel();
            self.queued.notify_one();
        }
        Ok(())
    }

    pub fn served(&self) -> usize {
        self.lock_state().served
    }

    pub fn is_finished(&self) -> bool {
        self.lock_state().finished
    }

    /// Queue depths as `(landing, departing)`.
    pub fn queued(&self) -> (usize, usize) {
        let st = self.lock_state();
        (st.queues.landing_len(), st.queues.departing_len())
    }

    /// Planes waiting to land, head first.
    pub fn landing_order(&self) -> Vec<PlaneId> {
        self.lock_state().queues.landing_order()
    }

    pub fn ledger(&self) -> RequestLedger {
        self.lock_state().ledger()
    }

    pub fn stats(&self) -> StatsSummary {
        self.lock_state().stats.summary()
    }

    /// Verify nothing leaked once every plane is done.
    ///
    /// Fails with [`AtcError::Inconsistent`] listing every violation found.
    pub fn sanity_check(&self) -> Result<(), AtcError> {
        let mut problems = Vec::new();
        {
            let st = self.lock_state();
            if !st.finished {
                problems.push(format!(
                    "only {} of {} planes completed",
                    st.served, self.config.expected_planes
                ));
            }
            if !st.queues.is_empty() {
                problems.push(format!("{} requests still queued", st.queues.len()));
            }
        }

        let occupied = self.gates.occupied();
        if occupied > 0 {
            problems.push(format!("{occupied} gates still occupied"));
        }
        if let Some(holder) = self.runway.holder() {
            problems.push(format!("runway still held by {holder}"));
        }
        if let Some(holder) = self.fuel_truck.holder() {
            problems.push(format!("fuel truck still held by {holder}"));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AtcError::Inconsistent(problems.join("; ")))
        }
    }
}
