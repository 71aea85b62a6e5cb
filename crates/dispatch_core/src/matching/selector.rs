use crate::geo::Coordinate;
use crate::model::DriverRecord;

/// Strategy for choosing one driver out of an already-filtered candidate list.
///
/// The coordinator holds a boxed selector so alternative scoring rules can be swapped in
/// without touching the dispatch loop.
///
/// # Examples
///
/// ```rust
/// use dispatch_core::geo::Coordinate;
/// use dispatch_core::matching::{DriverSelector, NearestSelector};
/// use dispatch_core::model::{DriverRecord, VehicleCapability, VehicleClass};
///
/// let pickup = Coordinate::new(43.4617, -80.5214).unwrap();
/// let driver = DriverRecord::new(
///     1,
///     "Ada",
///     VehicleCapability::new(VehicleClass::Regular, false),
///     pickup.offset_by(90.0, 250.0),
/// );
/// let chosen = NearestSelector.select(std::slice::from_ref(&driver), pickup);
/// assert_eq!(chosen.map(|d| d.id), Some(1));
/// ```
pub trait DriverSelector: Send + Sync {
    /// Pick the best driver for a pickup at `pickup`.
    ///
    /// # Returns
    ///
    /// `None` when no candidate is usable, which for drivers taken from the pool means
    /// `drivers` is empty.
    fn select<'a>(
        &self,
        drivers: &'a [DriverRecord],
        pickup: Coordinate,
    ) -> Option<&'a DriverRecord>;
}
