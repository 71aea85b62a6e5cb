#![allow(dead_code)]

use std::sync::Arc;

use dispatch_core::test_helpers::{fixed_capability_source, test_pickup};
use dispatch_core::{
    Coordinate, DispatchConfig, DispatchCoordinator, DriverRecord, RideRequest, VehicleCapability,
    VehicleClass,
};

/// Builder for driver fixtures placed relative to the shared test pickup.
#[derive(Clone, Debug)]
pub struct DriverBuilder {
    id: u32,
    class: VehicleClass,
    pet_friendly: bool,
    available: bool,
    meters_from_pickup: f64,
    bearing: f64,
}

impl DriverBuilder {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            class: VehicleClass::Regular,
            pet_friendly: false,
            available: true,
            meters_from_pickup: 100.0,
            bearing: 90.0,
        }
    }

    pub fn xl(mut self) -> Self {
        self.class = VehicleClass::Xl;
        self
    }

    pub fn pet_friendly(mut self) -> Self {
        self.pet_friendly = true;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn at_meters(mut self, meters: f64) -> Self {
        self.meters_from_pickup = meters;
        self
    }

    pub fn bearing(mut self, bearing: f64) -> Self {
        self.bearing = bearing;
        self
    }

    pub fn build(self) -> DriverRecord {
        let mut driver = DriverRecord::new(
            self.id,
            format!("Fixture {}", self.id),
            VehicleCapability::new(self.class, self.pet_friendly),
            test_pickup().offset_by(self.bearing, self.meters_from_pickup),
        );
        driver.available = self.available;
        driver
    }
}

pub fn request(id: u64, class: VehicleClass, pet_friendly: bool) -> RideRequest {
    RideRequest::new(id, test_pickup(), VehicleCapability::new(class, pet_friendly))
}

pub fn pickup() -> Coordinate {
    test_pickup()
}

/// Coordinator whose growth only ever produces XL drivers with ids from 10_000 up.
pub fn coordinator_growing_xl(config: DispatchConfig) -> Arc<DispatchCoordinator> {
    let source = fixed_capability_source(10_000, VehicleCapability::new(VehicleClass::Xl, false));
    Arc::new(DispatchCoordinator::new(config, Box::new(source)).expect("coordinator"))
}
