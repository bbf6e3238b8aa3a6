//! Names of the exclusive resources.
//!
//! Used as resource labels in logs, events and error messages.

/// The single runway shared by landing and departing planes.
pub const RUNWAY: &str = "runway";

/// The single fuel truck serving docked planes.
pub const FUEL_TRUCK: &str = "fuel-truck";
