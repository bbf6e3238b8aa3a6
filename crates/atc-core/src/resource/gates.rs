use std::sync::Mutex;

use tokio::sync::{Notify, futures::Notified};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use atc_model::{GateId, PlaneId};

use crate::{error::AtcError, resource::lock};

/// Fixed pool of numbered gates.
///
/// Slot `i` holds `Some(plane)` while occupied. Acquisition always hands out the
/// lowest-numbered free gate; release wakes every waiter.
#[derive(Debug)]
pub struct GatePool {
    slots: Mutex<Vec<Option<PlaneId>>>,
    released: Notify,
}

impl GatePool {
    /// Create a pool of `capacity` free gates numbered `1..=capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(vec![None; capacity]),
            released: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        lock(&self.slots).len()
    }

    /// Number of gates currently assigned to a plane.
    pub fn occupied(&self) -> usize {
        lock(&self.slots).iter().filter(|s| s.is_some()).count()
    }

    pub fn has_free(&self) -> bool {
        lock(&self.slots).iter().any(Option::is_none)
    }

    /// Plane parked at `gate`, if any.
    pub fn holder(&self, gate: GateId) -> Option<PlaneId> {
        lock(&self.slots).get(gate.index()).copied().flatten()
    }

    /// Occupancy of every slot, indexed by `GateId::index`.
    pub fn snapshot(&self) -> Vec<Option<PlaneId>> {
        lock(&self.slots).clone()
    }

    /// Future resolved by the next gate release.
    pub fn released(&self) -> Notified<'_> {
        self.released.notified()
    }

    /// Claim the lowest free gate without waiting.
    ///
    /// A plane may hold at most one gate; asking for a second is rejected.
    pub fn try_acquire(&self, plane: PlaneId) -> Result<Option<GateId>, AtcError> {
        let mut slots = lock(&self.slots);
        if slots.iter().any(|s| *s == Some(plane)) {
            return Err(AtcError::AlreadyHeld {
                plane,
                resource: "gate",
            });
        }
        let Some(index) = slots.iter().position(Option::is_none) else {
            return Ok(None);
        };
        slots[index] = Some(plane);
        let gate = GateId::from_index(index);
        trace!(%plane, %gate, "gate assigned");
        Ok(Some(gate))
    }

    /// Wait for a free gate and claim it.
    pub async fn acquire(
        &self,
        plane: PlaneId,
        halt: &CancellationToken,
    ) -> Result<GateId, AtcError> {
        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(gate) = self.try_acquire(plane)? {
                return Ok(gate);
            }

            tokio::select! {
                _ = notified.as_mut() => {}
                _ = halt.cancelled() => return Err(AtcError::Cancelled),
            }
        }
    }

    /// Return `gate` to the pool.
    ///
    /// Only the plane the gate was assigned to may release it.
    pub fn release(&self, plane: PlaneId, gate: GateId) -> Result<(), AtcError> {
        {
            let mut slots = lock(&self.slots);
            let capacity = slots.len();
            let slot = slots
                .get_mut(gate.index())
                .ok_or(AtcError::GateOutOfRange { gate, capacity })?;
            if *slot != Some(plane) {
                return Err(AtcError::GateNotHeld { plane, gate });
            }
            *slot = None;
        }
        trace!(%plane, %gate, "gate freed");
        self.released.notify_waiters();
        Ok(())
    }
}
