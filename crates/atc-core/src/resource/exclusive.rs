use std::sync::Mutex;

use tokio::sync::{Notify, futures::Notified};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use atc_model::PlaneId;

use crate::{error::AtcError, resource::lock};

/// Mutual-exclusion resource with a single holder (runway, fuel truck).
///
/// Waiters are woken all at once on release and race to re-claim; there is no
/// queue, so ordering among waiters is whatever the runtime wakes first.
#[derive(Debug)]
pub struct ExclusiveResource {
    name: &'static str,
    holder: Mutex<Option<PlaneId>>,
    released: Notify,
}

impl ExclusiveResource {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            holder: Mutex::new(None),
            released: Notify::new(),
        }
    }

    /// Resource label used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_free(&self) -> bool {
        lock(&self.holder).is_none()
    }

    /// Current holder, if any.
    pub fn holder(&self) -> Option<PlaneId> {
        *lock(&self.holder)
    }

    /// Future resolved by the next release.
    ///
    /// Call `enable()` on it before checking [`is_free`](Self::is_free) so a
    /// release in between is not missed.
    pub fn released(&self) -> Notified<'_> {
        self.released.notified()
    }

    /// Claim the resource if nobody holds it.
    pub fn try_acquire(&self, plane: PlaneId) -> Result<bool, AtcError> {
        let mut holder = lock(&self.holder);
        match *holder {
            None => {
                *holder = Some(plane);
                Ok(true)
            }
            Some(current) if current == plane => Err(AtcError::AlreadyHeld {
                plane,
                resource: self.name,
            }),
            Some(_) => Ok(false),
        }
    }

    /// Wait until the resource is free, then claim it.
    ///
    /// Returns [`AtcError::Cancelled`] if `halt` fires first.
    pub async fn acquire(&self, plane: PlaneId, halt: &CancellationToken) -> Result<(), AtcError> {
        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.try_acquire(plane)? {
                trace!(resource = self.name, %plane, "claimed");
                return Ok(());
            }

            tokio::select! {
                _ = notified.as_mut() => {}
                _ = halt.cancelled() => return Err(AtcError::Cancelled),
            }
        }
    }

    /// Free the resource and wake every waiter.
    pub fn release(&self, plane: PlaneId) -> Result<(), AtcError> {
        {
            let mut holder = lock(&self.holder);
            if *holder != Some(plane) {
                return Err(AtcError::ResourceNotHeld {
                    plane,
                    resource: self.name,
                });
            }
            *holder = None;
        }
        trace!(resource = self.name, %plane, "released");
        self.released.notify_waiters();
        Ok(())
    }
}
