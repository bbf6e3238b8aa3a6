use std::{fmt, time::Duration};

use crate::domain::{GateId, PlaneId};

/// Lifecycle stage of a plane agent.
///
/// Stages advance strictly in declaration order; `Aborted` may replace any
/// later stage when a wait is interrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlaneStage {
    RequestingLanding,
    AwaitingLandingGrant,
    LandingRoll,
    Taxiing,
    Disembarking,
    AwaitingFuelTruck,
    Refueling,
    Boarding,
    RequestingDeparture,
    AwaitingDepartureGrant,
    TakeoffRoll,
    Done,
    Aborted,
}

impl PlaneStage {
    /// Canonical kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaneStage::RequestingLanding => "requesting-landing",
            PlaneStage::AwaitingLandingGrant => "awaiting-landing-grant",
            PlaneStage::LandingRoll => "landing-roll",
            PlaneStage::Taxiing => "taxiing",
            PlaneStage::Disembarking => "disembarking",
            PlaneStage::AwaitingFuelTruck => "awaiting-fuel-truck",
            PlaneStage::Refueling => "refueling",
            PlaneStage::Boarding => "boarding",
            PlaneStage::RequestingDeparture => "requesting-departure",
            PlaneStage::AwaitingDepartureGrant => "awaiting-departure-grant",
            PlaneStage::TakeoffRoll => "takeoff-roll",
            PlaneStage::Done => "done",
            PlaneStage::Aborted => "aborted",
        }
    }
}

impl fmt::Display for PlaneStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable airport event.
///
/// Emitted by the controller and the plane agents to an event sink.
/// Sinks are write-only: nothing in control flow reads events back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AirportEvent {
    /// Dispatch loop started.
    ControllerStarted { gates: usize, expected_planes: usize },
    LandingRequested { plane: PlaneId, emergency: bool },
    DepartureRequested { plane: PlaneId },
    LandingGranted { plane: PlaneId, gate: GateId },
    DepartureGranted { plane: PlaneId },
    /// Exclusive resource (runway or fuel truck) claimed.
    ResourceAcquired { plane: PlaneId, resource: &'static str },
    ResourceReleased { plane: PlaneId, resource: &'static str },
    GateReleased { plane: PlaneId, gate: GateId },
    StageChanged { plane: PlaneId, stage: PlaneStage },
    PassengersMoved { plane: PlaneId, stage: PlaneStage, count: u32 },
    PlaneCompleted { plane: PlaneId, wait: Duration, served: usize, expected: usize },
    /// All expected planes completed; the dispatch loop is unwinding.
    Drained { served: usize },
}

impl AirportEvent {
    /// Plane the event concerns, if any.
    pub fn plane(&self) -> Option<PlaneId> {
        match self {
            AirportEvent::ControllerStarted { .. } | AirportEvent::Drained { .. } => None,
            AirportEvent::LandingRequested { plane, .. }
            | AirportEvent::DepartureRequested { plane }
            | AirportEvent::LandingGranted { plane, .. }
            | AirportEvent::DepartureGranted { plane }
            | AirportEvent::ResourceAcquired { plane, .. }
            | AirportEvent::ResourceReleased { plane, .. }
            | AirportEvent::GateReleased { plane, .. }
            | AirportEvent::StageChanged { plane, .. }
            | AirportEvent::PassengersMoved { plane, .. }
            | AirportEvent::PlaneCompleted { plane, .. } => Some(*plane),
        }
    }

    /// Whether this event is a grant issued by the controller.
    pub fn is_grant(&self) -> bool {
        matches!(
            self,
            AirportEvent::LandingGranted { .. } | AirportEvent::DepartureGranted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered_along_the_lifecycle() {
        assert!(PlaneStage::RequestingLanding < PlaneStage::Taxiing);
        assert!(PlaneStage::Boarding < PlaneStage::TakeoffRoll);
        assert!(PlaneStage::TakeoffRoll < PlaneStage::Done);
    }

    #[test]
    fn stage_names_are_kebab_case() {
        assert_eq!(PlaneStage::AwaitingFuelTruck.to_string(), "awaiting-fuel-truck");
        assert_eq!(PlaneStage::TakeoffRoll.as_str(), "takeoff-roll");
        assert_eq!(PlaneStage::Aborted.to_string(), "aborted");
    }

    #[test]
    fn plane_accessor_and_grant_flag() {
        let g = AirportEvent::LandingGranted {
            plane: PlaneId(2),
            gate: GateId::from_index(0),
        };
        assert_eq!(g.plane(), Some(PlaneId(2)));
        assert!(g.is_grant());

        let d = AirportEvent::Drained { served: 3 };
        assert_eq!(d.plane(), None);
        assert!(!d.is_grant());
    }
}
