#![cfg(feature = "sink")]

//! Event sink that writes airport events to `tracing`.
//!
//! Grants, completions and lifecycle milestones go out at `info`, resource
//! hand-overs at `debug`, per-stage chatter at `trace`.

use atc_core::EventSink;
use atc_model::AirportEvent;
use tracing::{debug, info, trace};

/// Sink that logs every airport event with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    fn emit(&self, event: &AirportEvent) {
        log_event(event);
    }
}

/// Short message for an event, shared by every log level.
pub fn message_for(event: &AirportEvent) -> &'static str {
    match event {
        AirportEvent::ControllerStarted { .. } => "controller online",
        AirportEvent::LandingRequested { emergency: true, .. } => "emergency landing requested",
        AirportEvent::LandingRequested { .. } => "landing requested",
        AirportEvent::DepartureRequested { .. } => "departure requested",
        AirportEvent::LandingGranted { .. } => "landing permission granted",
        AirportEvent::DepartureGranted { .. } => "taking-off permission granted",
        AirportEvent::ResourceAcquired { .. } => "resource acquired",
        AirportEvent::ResourceReleased { .. } => "resource released",
        AirportEvent::GateReleased { .. } => "gate released",
        AirportEvent::StageChanged { .. } => "stage changed",
        AirportEvent::PassengersMoved { .. } => "passengers moved",
        AirportEvent::PlaneCompleted { .. } => "plane completed its turnaround",
        AirportEvent::Drained { .. } => "all planes served, controller draining",
    }
}

fn log_event(event: &AirportEvent) {
    let msg = message_for(event);

    match event {
        AirportEvent::ControllerStarted {
            gates,
            expected_planes,
        } => info!(gates, expected_planes, "{msg}"),
        AirportEvent::Drained { served } => info!(served, "{msg}"),

        AirportEvent::LandingRequested { plane, emergency } => {
            debug!(plane = %plane, emergency, "{msg}")
        }
        AirportEvent::DepartureRequested { plane } => debug!(plane = %plane, "{msg}"),

        AirportEvent::LandingGranted { plane, gate } => {
            info!(plane = %plane, gate = %gate, "{msg}")
        }
        AirportEvent::DepartureGranted { plane } => info!(plane = %plane, "{msg}"),

        AirportEvent::ResourceAcquired { plane, resource } => {
            debug!(plane = %plane, resource, "{msg}")
        }
        AirportEvent::ResourceReleased { plane, resource } => {
            debug!(plane = %plane, resource, "{msg}")
        }
        AirportEvent::GateReleased { plane, gate } => {
            debug!(plane = %plane, gate = %gate, "{msg}")
        }

        AirportEvent::StageChanged { plane, stage } => {
            trace!(plane = %plane, stage = %stage, "{msg}")
        }
        AirportEvent::PassengersMoved {
            plane,
            stage,
            count,
        } => debug!(plane = %plane, stage = %stage, count, "{msg}"),

        AirportEvent::PlaneCompleted {
            plane,
            wait,
            served,
            expected,
        } => info!(
            plane = %plane,
            wait_ms = wait.as_millis() as u64,
            served,
            expected,
            "{msg}"
        ),
    }
}
