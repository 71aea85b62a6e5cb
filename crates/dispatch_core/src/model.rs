use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::geo::Coordinate;

/// Largest seat count that still counts as a regular vehicle.
pub const REGULAR_MAX_SEATS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Regular,
    Xl,
}

impl VehicleClass {
    /// Classify a vehicle by seat count: up to five seats is regular, anything larger is XL.
    pub fn from_seats(seats: u32) -> Self {
        if seats <= REGULAR_MAX_SEATS {
            VehicleClass::Regular
        } else {
            VehicleClass::Xl
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Regular => "regular",
            VehicleClass::Xl => "xl",
        }
    }
}

/// What a vehicle offers, or what a request demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleCapability {
    pub vehicle_class: VehicleClass,
    pub pet_friendly: bool,
}

impl VehicleCapability {
    pub fn new(vehicle_class: VehicleClass, pet_friendly: bool) -> Self {
        Self {
            vehicle_class,
            pet_friendly,
        }
    }

    /// Whether a vehicle with this capability can serve `required`.
    ///
    /// Classes must match exactly. A request without a pet requirement is served by any
    /// vehicle of the class; a request with one only by pet-friendly vehicles.
    pub fn satisfies(&self, required: &VehicleCapability) -> bool {
        self.vehicle_class == required.vehicle_class
            && (self.pet_friendly || !required.pet_friendly)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRecord {
    pub id: u32,
    pub display_name: String,
    pub capability: VehicleCapability,
    pub location: Coordinate,
    pub available: bool,
    #[serde(default)]
    pub license_plate: String,
    /// Human-readable vehicle, e.g. "2017 Honda Civic".
    #[serde(default)]
    pub vehicle_description: String,
}

impl DriverRecord {
    /// An available driver with no descriptive vehicle details.
    pub fn new(
        id: u32,
        display_name: impl Into<String>,
        capability: VehicleCapability,
        location: Coordinate,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            capability,
            location,
            available: true,
            license_plate: String::new(),
            vehicle_description: String::new(),
        }
    }
}

/// An incoming trip request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: u64,
    pub pickup: Coordinate,
    pub required_capability: VehicleCapability,
    /// Passed through to the assignment sink; matching never reads it.
    #[serde(default)]
    pub rider_id: Option<u64>,
    /// Passed through to the assignment sink; matching never reads it.
    #[serde(default)]
    pub drop_off: Option<Coordinate>,
}

impl RideRequest {
    pub fn new(id: u64, pickup: Coordinate, required_capability: VehicleCapability) -> Self {
        Self {
            id,
            pickup,
            required_capability,
            rider_id: None,
            drop_off: None,
        }
    }

    pub fn with_rider(mut self, rider_id: u64) -> Self {
        self.rider_id = Some(rider_id);
        self
    }

    pub fn with_drop_off(mut self, drop_off: Coordinate) -> Self {
        self.drop_off = Some(drop_off);
        self
    }

    /// Reject requests whose coordinates are out of range.
    pub fn validate(&self) -> Result<(), DispatchError> {
        self.pickup.validate()?;
        if let Some(drop_off) = &self.drop_off {
            drop_off.validate()?;
        }
        Ok(())
    }
}
