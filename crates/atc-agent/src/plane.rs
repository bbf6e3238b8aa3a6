use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, error, info, instrument, warn};

use atc_core::{AtcError, Controller, EventHandle};
use atc_model::{AirportEvent, GateId, PlaneId, PlaneStage};

use crate::delay::{DelayHandle, Service};

/// Static description of a plane handed over by the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneSpec {
    pub id: PlaneId,
    /// Passengers on board when the plane arrives.
    pub arriving_passengers: u32,
    /// Passengers boarded for the next flight.
    pub departing_passengers: u32,
    pub emergency: bool,
}

impl PlaneSpec {
    pub fn new(id: u32, arriving_passengers: u32, departing_passengers: u32) -> Self {
        Self {
            id: PlaneId(id),
            arriving_passengers,
            departing_passengers,
            emergency: false,
        }
    }

    pub fn with_emergency(mut self, emergency: bool) -> Self {
        self.emergency = emergency;
        self
    }
}

/// What a plane reports after a completed turnaround.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneReport {
    pub id: PlaneId,
    pub gate: GateId,
    pub emergency: bool,
    pub landing_wait: Duration,
    pub departing_wait: Duration,
    pub passengers_disembarked: u32,
    pub passengers_boarded: u32,
}

impl PlaneReport {
    /// Time spent waiting for both grants.
    pub fn wait(&self) -> Duration {
        self.landing_wait + self.departing_wait
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct WaitWindow {
    start: Option<Instant>,
    end: Option<Instant>,
}

impl WaitWindow {
    fn open(&mut self) {
        self.start = Some(Instant::now());
    }

    fn close(&mut self) {
        self.end = Some(Instant::now());
    }

    fn elapsed(&self) -> Duration {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }
}

/// A plane agent: one landing, one turnaround, one departure.
///
/// The plane only mutates its own fields; everything shared goes through the
/// [`Controller`].
pub struct Plane {
    spec: PlaneSpec,
    passengers: u32,
    landing: bool,
    stage: PlaneStage,
    gate: Option<GateId>,
    holds_runway: bool,
    holds_fuel_truck: bool,
    landing_wait: WaitWindow,
    departing_wait: WaitWindow,
    controller: Arc<Controller>,
    delay: DelayHandle,
    sink: EventHandle,
}

impl Plane {
    pub fn new(spec: PlaneSpec, controller: Arc<Controller>, delay: DelayHandle) -> Self {
        let sink = Arc::clone(controller.sink());
        Self {
            passengers: spec.arriving_passengers,
            spec,
            landing: true,
            stage: PlaneStage::RequestingLanding,
            gate: None,
            holds_runway: false,
            holds_fuel_truck: false,
            landing_wait: WaitWindow::default(),
            departing_wait: WaitWindow::default(),
            controller,
            delay,
            sink,
        }
    }

    pub fn id(&self) -> PlaneId {
        self.spec.id
    }

    pub fn stage(&self) -> PlaneStage {
        self.stage
    }

    /// `true` until the plane starts asking for departure.
    pub fn is_landing(&self) -> bool {
        self.landing
    }

    /// Run the whole turnaround.
    ///
    /// On error the plane gives back whatever it still holds, moves to
    /// [`PlaneStage::Aborted`] and returns the error.
    #[instrument(
        level = "debug",
        skip(self),
        fields(plane = %self.spec.id, emergency = self.spec.emergency)
    )]
    pub async fn run(mut self) -> Result<PlaneReport, AtcError> {
        match self.fly().await {
            Ok(report) => Ok(report),
            Err(e) => {
                if e.is_fatal() {
                    error!(
                        plane = %self.spec.id,
                        stage = %self.stage,
                        error = %e,
                        "plane stopped on protocol violation"
                    );
                } else {
                    warn!(
                        plane = %self.spec.id,
                        stage = %self.stage,
                        error = %e,
                        "plane wait aborted"
                    );
                }
                self.give_back();
                self.enter(PlaneStage::Aborted);
                Err(e)
            }
        }
    }

    async fn fly(&mut self) -> Result<PlaneReport, AtcError> {
        let id = self.spec.id;
        let ctl = Arc::clone(&self.controller);

        self.enter(PlaneStage::RequestingLanding);
        self.landing_wait.open();
        if self.spec.emergency {
            info!(plane = %id, "requesting EMERGENCY landing");
        } else {
            info!(plane = %id, "requesting landing");
        }

        self.enter(PlaneStage::AwaitingLandingGrant);
        let gate = ctl.submit_landing(id, self.spec.emergency).await?;
        self.landing_wait.close();
        self.gate = Some(gate);

        self.enter(PlaneStage::LandingRoll);
        ctl.acquire_runway(id).await?;
        self.holds_runway = true;
        info!(plane = %id, "landing on runway");
        self.delay.pause(id, Service::RunwayRoll).await;
        ctl.release_runway(id)?;
        self.holds_runway = false;

        self.enter(PlaneStage::Taxiing);
        self.delay.pause(id, Service::Taxi).await;
        info!(plane = %id, %gate, "docked");

        self.enter(PlaneStage::Disembarking);
        let disembarked = self.passengers;
        info!(plane = %id, passengers = disembarked, "passengers disembarking");
        self.delay.pause(id, Service::Disembark).await;
        self.move_passengers(0);

        self.enter(PlaneStage::AwaitingFuelTruck);
        ctl.acquire_fuel_truck(id).await?;
        self.holds_fuel_truck = true;

        self.enter(PlaneStage::Refueling);
        self.delay.pause(id, Service::Refuel).await;
        ctl.release_fuel_truck(id)?;
        self.holds_fuel_truck = false;
        debug!(plane = %id, "refuelling done");

        self.enter(PlaneStage::Boarding);
        self.delay.pause(id, Service::Board).await;
        self.move_passengers(self.spec.departing_passengers);

        self.landing = false;
        self.enter(PlaneStage::RequestingDeparture);
        self.departing_wait.open();

        self.enter(PlaneStage::AwaitingDepartureGrant);
        ctl.submit_departure(id).await?;
        self.departing_wait.close();

        self.enter(PlaneStage::TakeoffRoll);
        ctl.acquire_runway(id).await?;
        self.holds_runway = true;
        // The gate is only vacated once the plane is on the runway.
        ctl.release_gate(id, gate)?;
        self.gate = None;
        info!(plane = %id, "departing on runway");
        self.delay.pause(id, Service::RunwayRoll).await;
        ctl.release_runway(id)?;
        self.holds_runway = false;
        info!(plane = %id, "departed successfully");

        let report = PlaneReport {
            id,
            gate,
            emergency: self.spec.emergency,
            landing_wait: self.landing_wait.elapsed(),
            departing_wait: self.departing_wait.elapsed(),
            passengers_disembarked: disembarked,
            passengers_boarded: self.passengers,
        };
        ctl.report_wait_time(report.wait());
        ctl.report_passengers(self.passengers);
        self.enter(PlaneStage::Done);
        ctl.report_completion(id, report.wait())?;
        Ok(report)
    }

    fn enter(&mut self, stage: PlaneStage) {
        self.stage = stage;
        debug!(plane = %self.spec.id, %stage, "stage");
        self.sink.emit(&AirportEvent::StageChanged {
            plane: self.spec.id,
            stage,
        });
    }

    fn move_passengers(&mut self, count: u32) {
        self.passengers = count;
        self.sink.emit(&AirportEvent::PassengersMoved {
            plane: self.spec.id,
            stage: self.stage,
            count,
        });
    }

    /// Release every resource still held after an aborted turnaround.
    fn give_back(&mut self) {
        let id = self.spec.id;
        if self.holds_fuel_truck {
            if let Err(e) = self.controller.release_fuel_truck(id) {
                error!(plane = %id, error = %e, "failed to release fuel truck");
            }
            self.holds_fuel_truck = false;
        }
        if let Some(gate) = self.gate.take() {
            if let Err(e) = self.controller.release_gate(id, gate) {
                error!(plane = %id, %gate, error = %e, "failed to release gate");
            }
        }
        if self.holds_runway {
            if let Err(e) = self.controller.release_runway(id) {
                error!(plane = %id, error = %e, "failed to release runway");
            }
            self.holds_runway = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::NoDelay;
    use atc_core::MemorySink;
    use atc_model::AirportConfig;
    use tokio_util::sync::CancellationToken;

    fn setup(
        gates: usize,
        expected: usize,
    ) -> (Arc<Controller>, Arc<MemorySink>, CancellationToken) {
        let sink = Arc::new(MemorySink::new());
        let token = CancellationToken::new();
        let ctl =
            Controller::new(AirportConfig::new(gates, expected), sink.clone(), &token).unwrap();
        (ctl, sink, token)
    }

    fn stages_of(sink: &MemorySink, plane: PlaneId) -> Vec<PlaneStage> {
        sink.events()
            .into_iter()
            .filter_map(|e| match e {
                AirportEvent::StageChanged { plane: p, stage } if p == plane => Some(stage),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn spec_builder_sets_emergency() {
        let spec = PlaneSpec::new(5, 10, 20).with_emergency(true);
        assert_eq!(spec.id, PlaneId(5));
        assert!(spec.emergency);
    }

    #[tokio::test]
    async fn single_plane_walks_every_stage_in_order() {
        let (ctl, sink, _token) = setup(1, 1);
        let run = {
            let ctl = Arc::clone(&ctl);
            tokio::spawn(async move { ctl.run().await })
        };

        let plane = Plane::new(PlaneSpec::new(1, 30, 12), Arc::clone(&ctl), Arc::new(NoDelay));
        assert!(plane.is_landing());
        let report = plane.run().await.unwrap();

        assert_eq!(report.gate.get(), 1);
        assert_eq!(report.passengers_disembarked, 30);
        assert_eq!(report.passengers_boarded, 12);

        let stages = stages_of(&sink, PlaneId(1));
        let expected = vec![
            PlaneStage::RequestingLanding,
            PlaneStage::AwaitingLandingGrant,
            PlaneStage::LandingRoll,
            PlaneStage::Taxiing,
            PlaneStage::Disembarking,
            PlaneStage::AwaitingFuelTruck,
            PlaneStage::Refueling,
            PlaneStage::Boarding,
            PlaneStage::RequestingDeparture,
            PlaneStage::AwaitingDepartureGrant,
            PlaneStage::TakeoffRoll,
            PlaneStage::Done,
        ];
        assert_eq!(stages, expected);

        run.await.unwrap().unwrap();
        ctl.sanity_check().unwrap();
        assert_eq!(ctl.stats().passengers_boarded, 12);
    }

    #[tokio::test]
    async fn gate_is_released_only_after_runway_is_taken() {
        let (ctl, sink, _token) = setup(1, 1);
        let run = {
            let ctl = Arc::clone(&ctl);
            tokio::spawn(async move { ctl.run().await })
        };
        Plane::new(PlaneSpec::new(1, 0, 0), Arc::clone(&ctl), Arc::new(NoDelay))
            .run()
            .await
            .unwrap();
        run.await.unwrap().unwrap();

        let events = sink.events();
        let departure_grant = events
            .iter()
            .position(|e| matches!(e, AirportEvent::DepartureGranted { .. }))
            .unwrap();
        let takeoff_runway = events[departure_grant..]
            .iter()
            .position(|e| matches!(e, AirportEvent::ResourceAcquired { resource: "runway", .. }))
            .unwrap()
            + departure_grant;
        let gate_release = events
            .iter()
            .position(|e| matches!(e, AirportEvent::GateReleased { .. }))
            .unwrap();
        assert!(takeoff_runway < gate_release);
    }

    #[tokio::test]
    async fn cancelled_plane_aborts_while_waiting_to_land() {
        let (ctl, sink, token) = setup(1, 1);
        // No dispatch loop: the landing request is never granted.
        let plane = Plane::new(PlaneSpec::new(3, 5, 5), Arc::clone(&ctl), Arc::new(NoDelay));
        let handle = tokio::spawn(plane.run());

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), Err(AtcError::Cancelled));
        let stages = stages_of(&sink, PlaneId(3));
        assert_eq!(stages.last(), Some(&PlaneStage::Aborted));
        assert_eq!(ctl.gates().occupied(), 0);
        assert!(ctl.runway().is_free());
    }

    #[tokio::test]
    async fn cancelled_plane_returns_its_gate() {
        let (ctl, _sink, token) = setup(1, 2);
        let run = {
            let ctl = Arc::clone(&ctl);
            tokio::spawn(async move { ctl.run().await })
        };
        // Hold the fuel truck so the plane parks at its gate.
        ctl.acquire_fuel_truck(PlaneId(42)).await.unwrap();

        let plane = Plane::new(PlaneSpec::new(1, 5, 5), Arc::clone(&ctl), Arc::new(NoDelay));
        let handle = tokio::spawn(plane.run());
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while ctl.gates().occupied() == 0 || !ctl.runway().is_free() {
            assert!(tokio::time::Instant::now() < deadline, "plane never docked");
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        token.cancel();
        assert_eq!(handle.await.unwrap(), Err(AtcError::Cancelled));
        assert_eq!(ctl.gates().occupied(), 0);
        assert_eq!(ctl.fuel_truck().holder(), Some(PlaneId(42)));

        run.await.unwrap().unwrap();
    }
}
