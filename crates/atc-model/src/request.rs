use std::{fmt, time::Instant};

use serde::{Deserialize, Serialize};

use crate::domain::{GateId, PlaneId};

/// Which queue a request belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    /// Permission to land; may carry emergency priority.
    Landing,
    /// Permission to take off.
    Departing,
}

impl RequestKind {
    /// Short label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Landing => "landing",
            RequestKind::Departing => "departing",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plane's request for runway permission.
///
/// Lives in exactly one controller queue until dispatch consumes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub plane: PlaneId,
    pub kind: RequestKind,
    /// Only meaningful for landing requests; always `false` for departures.
    pub emergency: bool,
    pub enqueued_at: Instant,
}

impl Request {
    /// Landing request stamped with the current instant.
    pub fn landing(plane: PlaneId, emergency: bool) -> Self {
        Self {
            plane,
            kind: RequestKind::Landing,
            emergency,
            enqueued_at: Instant::now(),
        }
    }

    /// Departure request stamped with the current instant.
    pub fn departing(plane: PlaneId) -> Self {
        Self {
            plane,
            kind: RequestKind::Departing,
            emergency: false,
            enqueued_at: Instant::now(),
        }
    }

    #[inline]
    pub fn is_landing(&self) -> bool {
        matches!(self.kind, RequestKind::Landing)
    }
}

/// Permission delivered to exactly one waiting plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grant {
    /// Cleared to land; the gate is already reserved for the plane.
    Landing { gate: GateId },
    /// Cleared for departure; the plane still has to take the runway itself.
    Departure,
}
