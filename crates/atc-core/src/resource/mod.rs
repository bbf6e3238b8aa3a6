//! Shared airport resources.
//!
//! - [`ExclusiveResource`]: capacity one, used for the runway and the fuel truck.
//! - [`GatePool`]: N numbered slots handed out lowest-first.
//!
//! Each resource guards its state with its own short-lived mutex and wakes waiters
//! through a [`tokio::sync::Notify`] broadcast. No lock is held across an await.
mod exclusive;
pub use exclusive::ExclusiveResource;

mod gates;
pub use gates::GatePool;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a resource mutex.
///
/// Critical sections never panic half-way through an update, so a poisoned
/// lock still guards consistent data.
#[inline]
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
