use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use atc_agent::{FixedDelay, NoDelay, Plane, PlaneSpec};
use atc_core::{AtcError, Controller, DispatchOutcome, EventSink};
use atc_model::{AirportConfig, AirportEvent, GateId, PlaneId, PlaneStage};

/// Sink that replays holder changes from the event stream and records any
/// exclusivity or gate violation it sees.
#[derive(Default)]
struct InvariantSink {
    inner: Mutex<Tracker>,
}

#[derive(Default)]
struct Tracker {
    events: Vec<AirportEvent>,
    holders: HashMap<&'static str, PlaneId>,
    gates: HashMap<GateId, PlaneId>,
    max_gates_in_use: usize,
    drained: bool,
    violations: Vec<String>,
}

impl EventSink for InvariantSink {
    fn emit(&self, event: &AirportEvent) {
        let mut guard = self.inner.lock().unwrap();
        let t = &mut *guard;
        if t.drained {
            t.violations.push(format!("event after drain: {event:?}"));
        }
        match event {
            AirportEvent::ResourceAcquired { plane, resource } => {
                if let Some(other) = t.holders.insert(*resource, *plane) {
                    t.violations
                        .push(format!("{resource} taken by {plane} while held by {other}"));
                }
            }
            AirportEvent::ResourceReleased { plane, resource } => {
                if t.holders.remove(resource) != Some(*plane) {
                    t.violations.push(format!("{plane} released {resource} it did not hold"));
                }
            }
            AirportEvent::LandingGranted { plane, gate } => {
                if let Some(other) = t.gates.insert(*gate, *plane) {
                    t.violations
                        .push(format!("{gate} assigned to {plane} while held by {other}"));
                }
                t.max_gates_in_use = t.max_gates_in_use.max(t.gates.len());
            }
            AirportEvent::GateReleased { plane, gate } => {
                if t.gates.remove(gate) != Some(*plane) {
                    t.violations.push(format!("{plane} released {gate} it did not hold"));
                }
            }
            AirportEvent::Drained { .. } => t.drained = true,
            _ => {}
        }
        t.events.push(event.clone());
    }
}

impl InvariantSink {
    fn violations(&self) -> Vec<String> {
        self.inner.lock().unwrap().violations.clone()
    }

    fn events(&self) -> Vec<AirportEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    fn max_gates_in_use(&self) -> usize {
        self.inner.lock().unwrap().max_gates_in_use
    }
}

struct Harness {
    ctl: Arc<Controller>,
    sink: Arc<InvariantSink>,
    token: CancellationToken,
}

fn harness(gates: usize, planes: usize) -> Harness {
    let sink = Arc::new(InvariantSink::default());
    let token = CancellationToken::new();
    let ctl = Controller::new(AirportConfig::new(gates, planes), sink.clone(), &token).unwrap();
    Harness { ctl, sink, token }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn demo_airport_turns_every_plane_around() {
    let h = harness(3, 6);
    let dispatch = {
        let ctl = Arc::clone(&h.ctl);
        tokio::spawn(async move { ctl.run().await })
    };

    let mut fleet = JoinSet::new();
    for id in 1..=6u32 {
        let spec = PlaneSpec::new(id, id * 5, id * 3).with_emergency(id == 5);
        let plane = Plane::new(
            spec,
            Arc::clone(&h.ctl),
            Arc::new(FixedDelay(Duration::from_millis(2))),
        );
        fleet.spawn(plane.run());
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    let mut reports = Vec::new();
    while let Some(res) = fleet.join_next().await {
        reports.push(res.unwrap().unwrap());
    }
    assert_eq!(reports.len(), 6);
    assert!(reports.iter().all(|r| (1..=3).contains(&r.gate.get())));

    let outcome = dispatch.await.unwrap().unwrap();
    assert_eq!(outcome, DispatchOutcome::Drained { served: 6 });
    h.ctl.sanity_check().unwrap();

    let stats = h.ctl.stats();
    assert_eq!(stats.planes_served, 6);
    assert_eq!(stats.passengers_boarded, (1..=6u64).map(|i| i * 3).sum::<u64>());
    let longest = reports.iter().map(|r| r.wait()).max().unwrap();
    assert_eq!(stats.max_wait, Some(longest));

    assert!(h.sink.violations().is_empty(), "{:?}", h.sink.violations());
    assert!(h.sink.max_gates_in_use() <= 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scarce_gates_never_deadlock_or_double_assign() {
    let h = harness(2, 24);
    let dispatch = {
        let ctl = Arc::clone(&h.ctl);
        tokio::spawn(async move { ctl.run().await })
    };

    let mut fleet = JoinSet::new();
    for id in 1..=24u32 {
        let spec = PlaneSpec::new(id, 10, 10).with_emergency(id % 7 == 0);
        fleet.spawn(Plane::new(spec, Arc::clone(&h.ctl), Arc::new(NoDelay)).run());
    }

    let finished = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(res) = fleet.join_next().await {
            res.unwrap().unwrap();
        }
    })
    .await;
    assert!(finished.is_ok(), "fleet did not finish");

    assert_eq!(
        dispatch.await.unwrap().unwrap(),
        DispatchOutcome::Drained { served: 24 }
    );
    h.ctl.sanity_check().unwrap();

    let ledger = h.ctl.ledger();
    assert_eq!(ledger.submitted, 48);
    assert_eq!(ledger.granted, 48);
    assert_eq!(ledger.abandoned, 0);

    assert!(h.sink.violations().is_empty(), "{:?}", h.sink.violations());
    assert!(h.sink.max_gates_in_use() <= 2);
    assert!(matches!(
        h.sink.events().last(),
        Some(AirportEvent::Drained { served: 24 })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn each_plane_waits_for_its_own_grant() {
    let h = harness(1, 4);
    let dispatch = {
        let ctl = Arc::clone(&h.ctl);
        tokio::spawn(async move { ctl.run().await })
    };

    let mut fleet = JoinSet::new();
    for id in 1..=4u32 {
        let plane = Plane::new(
            PlaneSpec::new(id, 1, 1),
            Arc::clone(&h.ctl),
            Arc::new(FixedDelay(Duration::from_millis(1))),
        );
        fleet.spawn(plane.run());
    }
    while let Some(res) = fleet.join_next().await {
        res.unwrap().unwrap();
    }
    dispatch.await.unwrap().unwrap();

    // A plane only leaves AwaitingLandingGrant after a grant addressed to it.
    let events = h.sink.events();
    for id in 1..=4u32 {
        let plane = PlaneId(id);
        let granted = events
            .iter()
            .position(|e| matches!(e, AirportEvent::LandingGranted { plane: p, .. } if *p == plane))
            .unwrap();
        let rolled = events
            .iter()
            .position(|e| {
                matches!(
                    e,
                    AirportEvent::StageChanged { plane: p, stage: PlaneStage::LandingRoll }
                        if *p == plane
                )
            })
            .unwrap();
        assert!(granted < rolled, "{plane} rolled before its grant");
    }
}

#[tokio::test]
async fn cancellation_unwinds_the_whole_airport() {
    let h = harness(1, 3);
    let dispatch = {
        let ctl = Arc::clone(&h.ctl);
        tokio::spawn(async move { ctl.run().await })
    };

    let mut fleet = JoinSet::new();
    for id in 1..=3u32 {
        let plane = Plane::new(
            PlaneSpec::new(id, 1, 1),
            Arc::clone(&h.ctl),
            Arc::new(FixedDelay(Duration::from_millis(200))),
        );
        fleet.spawn(plane.run());
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.token.cancel();

    let mut aborted = 0;
    while let Some(res) = fleet.join_next().await {
        match res.unwrap() {
            Err(AtcError::Cancelled) => aborted += 1,
            Err(e) => panic!("unexpected fatal error: {e}"),
            Ok(_) => {}
        }
    }
    assert!(aborted >= 2, "only {aborted} planes saw the cancellation");
    assert!(matches!(
        dispatch.await.unwrap().unwrap(),
        DispatchOutcome::Cancelled { .. }
    ));
    assert!(h.ctl.sanity_check().is_err(), "not every plane completed");
}
