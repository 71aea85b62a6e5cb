//! Test helpers for common test setup and utilities.
//!
//! This module provides shared fixtures so unit tests, integration tests and benchmarks place
//! drivers around the same pickup point.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::geo::Coordinate;
use crate::model::{DriverRecord, VehicleCapability, VehicleClass};
use crate::pool::DriverSource;

/// Pickup point used across tests: Waterloo, Ontario.
pub const TEST_PICKUP: (f64, f64) = (43.461655, -80.521417);

/// Get the test pickup as a `Coordinate`.
///
/// # Panics
///
/// Panics if the constant is out of range (should never happen).
pub fn test_pickup() -> Coordinate {
    Coordinate::new(TEST_PICKUP.0, TEST_PICKUP.1).expect("TEST_PICKUP should be a valid coordinate")
}

/// A driver `meters` east of the test pickup.
pub fn driver_near_pickup(id: u32, capability: VehicleCapability, meters: f64) -> DriverRecord {
    DriverRecord::new(
        id,
        format!("Test Driver {id}"),
        capability,
        test_pickup().offset_by(90.0, meters),
    )
}

/// Driver source producing sequential ids that all carry `capability`, 1 km from the pickup.
///
/// Handy for exhausting the pool with drivers that can never satisfy a request.
pub fn fixed_capability_source(
    start_id: u32,
    capability: VehicleCapability,
) -> impl DriverSource {
    let next = AtomicU32::new(start_id);
    move || driver_near_pickup(next.fetch_add(1, Ordering::Relaxed), capability, 1_000.0)
}

pub fn regular() -> VehicleCapability {
    VehicleCapability::new(VehicleClass::Regular, false)
}

pub fn xl() -> VehicleCapability {
    VehicleCapability::new(VehicleClass::Xl, false)
}
