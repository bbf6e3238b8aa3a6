mod domain;
pub use domain::{FUEL_TRUCK, GateId, PlaneId, RUNWAY};

mod error;
pub use error::{ModelError, ModelResult};

mod config;
pub use config::AirportConfig;

mod request;
pub use request::{Grant, Request, RequestKind};

mod event;
pub use event::{AirportEvent, PlaneStage};
