mod ids;
pub use ids::{GateId, PlaneId};

mod constants;
pub use constants::{FUEL_TRUCK, RUNWAY};
