//! Plane agents for the airport controller.
//!
//! Each [`Plane`] is an independent task that requests landing, uses the runway,
//! a gate and the fuel truck, then requests departure and reports back.
//! Service times come from a [`Delay`] implementation supplied by the launcher.
mod delay;
pub use delay::{Delay, DelayHandle, FixedDelay, NoDelay, Service};

mod plane;
pub use plane::{Plane, PlaneReport, PlaneSpec};
