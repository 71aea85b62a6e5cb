use crate::model::{DriverRecord, VehicleCapability};

/// Keep the available drivers whose vehicle satisfies `required`, preserving order.
///
/// See [`VehicleCapability::satisfies`] for the matching rule.
pub fn filter_drivers(
    drivers: &[DriverRecord],
    required: &VehicleCapability,
) -> Vec<DriverRecord> {
    drivers
        .iter()
        .filter(|driver| driver.available && driver.capability.satisfies(required))
        .cloned()
        .collect()
}
