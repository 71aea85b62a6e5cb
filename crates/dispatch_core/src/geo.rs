//! Geographic primitives: validated coordinates and great-circle distance.
//!
//! This module provides:
//!
//! - **Coordinate**: latitude/longitude pair validated on construction
//! - **Distance calculations**: haversine distance in meters between two coordinates
//! - **Offsets**: projecting a coordinate a given distance along a bearing
//!
//! Distances assume a spherical Earth with the mean radius below, which is accurate to well
//! under one percent at city scale.

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidRequest`] if latitude is outside `[-90, 90]` or
    /// longitude is outside `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DispatchError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Check the range of a coordinate that was built without going through [`Coordinate::new`]
    /// (for example one deserialized from a request body).
    pub fn validate(&self) -> Result<(), DispatchError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(DispatchError::InvalidRequest(format!(
                "latitude {} must be in [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DispatchError::InvalidRequest(format!(
                "longitude {} must be in [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Project this coordinate `distance_meters` along `bearing_degrees` (0 = north, 90 = east).
    ///
    /// Uses the spherical destination-point formula; longitude is wrapped into `[-180, 180]`.
    pub fn offset_by(&self, bearing_degrees: f64, distance_meters: f64) -> Coordinate {
        let angular = distance_meters / EARTH_RADIUS_METERS;
        let bearing = bearing_degrees.to_radians();
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();

        let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos())
            .clamp(-1.0, 1.0)
            .asin();
        let lon2 = lon1
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());

        let mut longitude = lon2.to_degrees();
        if longitude > 180.0 {
            longitude -= 360.0;
        } else if longitude < -180.0 {
            longitude += 360.0;
        }

        Coordinate {
            latitude: lat2.to_degrees(),
            longitude,
        }
    }

    /// Round both components to `places` decimal places.
    pub fn rounded(&self, places: i32) -> Coordinate {
        let factor = 10f64.powi(places);
        Coordinate {
            latitude: (self.latitude * factor).round() / factor,
            longitude: (self.longitude * factor).round() / factor,
        }
    }
}

/// Great-circle distance between two coordinates in meters (haversine).
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.latitude.to_radians(), a.longitude.to_radians());
    let (lat2, lon2) = (b.latitude.to_radians(), b.longitude.to_radians());
    let dlat = lat1 - lat2;
    let dlon = lon1 - lon2;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn toronto() -> Coordinate {
        Coordinate::new(43.6532, -79.3832).expect("valid")
    }

    fn ottawa() -> Coordinate {
        Coordinate::new(45.4215, -75.6972).expect("valid")
    }

    #[test]
    fn toronto_to_ottawa_is_within_expected_band() {
        let d = distance_meters(toronto(), ottawa());
        assert!((350_000.0..=400_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            Coordinate::new(90.5, 0.0),
            Err(DispatchError::InvalidRequest(_))
        ));
        assert!(Coordinate::new(0.0, -180.1).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn offset_lands_at_requested_distance() {
        let origin = toronto();
        for (bearing, meters) in [(0.0, 50.0), (90.0, 500.0), (225.0, 5_000.0)] {
            let moved = origin.offset_by(bearing, meters);
            let d = distance_meters(origin, moved);
            assert!((d - meters).abs() < 0.01, "bearing {bearing}: {d} vs {meters}");
        }
    }

    #[test]
    fn rounding_keeps_five_places() {
        let c = Coordinate::new(43.4616551234, -80.5214179876).expect("valid");
        assert_eq!(
            c.rounded(5),
            Coordinate {
                latitude: 43.46166,
                longitude: -80.52142,
            }
        );
    }

    fn coordinate() -> impl Strategy<Value = Coordinate> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(latitude, longitude)| Coordinate {
            latitude,
            longitude,
        })
    }

    proptest! {
        #[test]
        fn distance_to_self_is_zero(a in coordinate()) {
            prop_assert_eq!(distance_meters(a, a), 0.0);
        }

        #[test]
        fn distance_is_symmetric(a in coordinate(), b in coordinate()) {
            let ab = distance_meters(a, b);
            let ba = distance_meters(b, a);
            prop_assert!((ab - ba).abs() < 1e-6);
            prop_assert!(ab >= 0.0);
        }

        #[test]
        fn distance_grows_along_a_bearing(bearing in 0.0f64..360.0, near in 1.0f64..1_000.0) {
            let origin = Coordinate {
                latitude: 43.46,
                longitude: -80.52,
            };
            let close = distance_meters(origin, origin.offset_by(bearing, near));
            let far = distance_meters(origin, origin.offset_by(bearing, near * 2.0));
            prop_assert!(close < far);
        }
    }
}
