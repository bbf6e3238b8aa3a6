use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Identifier of a simulated plane (the agent id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaneId(pub u32);

impl PlaneId {
    /// Raw numeric id.
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl From<u32> for PlaneId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plane-{}", self.0)
    }
}

/// 1-based identifier of a gate slot.
///
/// A `GateId` is never zero; the gate pool maps it to slot index `id - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct GateId(usize);

impl GateId {
    /// Create a gate id, rejecting zero.
    pub fn new(id: usize) -> ModelResult<Self> {
        if id == 0 {
            return Err(ModelError::InvalidGate(id));
        }
        Ok(Self(id))
    }

    /// Gate id for a zero-based slot index.
    pub const fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    /// 1-based number as shown to humans.
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Zero-based slot index.
    pub const fn index(&self) -> usize {
        self.0 - 1
    }
}

impl TryFrom<usize> for GateId {
    type Error = ModelError;
    fn try_from(id: usize) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<GateId> for usize {
    fn from(g: GateId) -> Self {
        g.0
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gate-{}", self.0)
    }
}
