pub mod config;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod geo;
pub mod matching;
pub mod model;
pub mod pool;
pub mod sink;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use config::{DispatchConfig, EngineConfig, GeneratorConfig};
pub use dispatch::{DispatchCoordinator, MatchResult};
pub use error::{DispatchError, SinkError};
pub use geo::{distance_meters, Coordinate};
pub use model::{DriverRecord, RideRequest, VehicleCapability, VehicleClass};
pub use pool::{DriverPool, DriverSource};
