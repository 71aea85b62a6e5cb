use crate::geo::{distance_meters, Coordinate};
use crate::model::DriverRecord;

use super::selector::DriverSelector;

/// Nearest-driver selection by great-circle distance.
///
/// # Algorithm Behavior
///
/// 1. Iterates through `drivers` in order, computing the haversine distance to `pickup`
/// 2. Replaces the running best only on a strictly smaller distance, so the first driver
///    wins ties (including several drivers exactly at the pickup point)
/// 3. Skips drivers whose distance is not a number (malformed coordinates)
/// 4. Returns `None` for an empty slice
///
/// Time complexity: O(n).
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestSelector;

impl DriverSelector for NearestSelector {
    fn select<'a>(
        &self,
        drivers: &'a [DriverRecord],
        pickup: Coordinate,
    ) -> Option<&'a DriverRecord> {
        let mut best: Option<(&DriverRecord, f64)> = None;

        for driver in drivers {
            let distance = distance_meters(driver.location, pickup);
            if distance.is_nan() {
                continue;
            }
            match best {
                Some((_, shortest)) if distance < shortest => best = Some((driver, distance)),
                Some(_) => {}
                None => best = Some((driver, distance)),
            }
        }

        best.map(|(driver, _)| driver)
    }
}
