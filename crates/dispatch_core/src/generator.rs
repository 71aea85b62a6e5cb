//! Synthetic driver generator: fabricates plausible drivers to grow the pool on demand.
//!
//! Generated drivers get sequential ids, a random name and license plate, a car drawn from a
//! small built-in catalogue (its seat count decides the vehicle class), and a location drawn
//! uniformly from a disc around the configured centre.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::config::GeneratorConfig;
use crate::error::DispatchError;
use crate::geo::Coordinate;
use crate::model::{DriverRecord, VehicleCapability, VehicleClass};
use crate::pool::DriverSource;

const FIRST_NAMES: &[&str] = &[
    "Amara", "Ben", "Chloe", "Dev", "Elena", "Farid", "Grace", "Hiro", "Ines", "Jonah", "Kira",
    "Liam", "Maya", "Noah", "Olivia", "Priya", "Quinn", "Ravi", "Sofia", "Theo",
];

const LAST_NAMES: &[&str] = &[
    "Anderson", "Bauer", "Chen", "Diaz", "Evans", "Fischer", "Gupta", "Hughes", "Ivanova",
    "Jensen", "Kowalski", "Lee", "Martin", "Nguyen", "Okafor", "Patel", "Rossi", "Singh",
    "Tremblay", "Walker",
];

/// (make, model, seats)
const CAR_CATALOGUE: &[(&str, &str, u32)] = &[
    ("Honda", "Civic", 5),
    ("Honda", "Odyssey", 8),
    ("Toyota", "Corolla", 5),
    ("Toyota", "Sienna", 8),
    ("Toyota", "Highlander", 7),
    ("Hyundai", "Elantra", 5),
    ("Ford", "Escape", 5),
    ("Ford", "Expedition", 8),
    ("Chevrolet", "Suburban", 7),
    ("Kia", "Carnival", 8),
    ("Tesla", "Model 3", 5),
    ("Mazda", "CX-5", 5),
];

const PLATE_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Decimal places kept on generated coordinates (~1 m).
const COORDINATE_PLACES: i32 = 5;

/// Thread-safe, seeded source of synthetic drivers.
#[derive(Debug)]
pub struct SyntheticDriverGenerator {
    config: GeneratorConfig,
    rng: Mutex<StdRng>,
    next_id: AtomicU32,
}

impl SyntheticDriverGenerator {
    /// # Errors
    ///
    /// Returns [`DispatchError::Config`] if the generator config is invalid.
    pub fn new(config: GeneratorConfig) -> Result<Self, DispatchError> {
        config.validate()?;
        Ok(Self {
            rng: Mutex::new(StdRng::seed_from_u64(config.seed)),
            next_id: AtomicU32::new(config.start_id),
            config,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Build one driver. Ids are handed out in call order, from `start_id` up to
    /// `u32::MAX - 1`; after that the generator is exhausted and returns `None`.
    pub fn generate(&self) -> Option<DriverRecord> {
        let Ok(id) = self
            .next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
        else {
            warn!(start_id = self.config.start_id, "driver id range exhausted");
            return None;
        };
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        let (make, model, seats) = *CAR_CATALOGUE
            .choose(&mut *rng)
            .unwrap_or(&CAR_CATALOGUE[0]);
        let year = rng.gen_range(2000..2025);
        let pet_friendly = rng.gen_bool(self.config.pet_friendly_probability);
        let location =
            random_location_in_disc(&mut *rng, self.config.centre, self.config.radius_meters);

        Some(DriverRecord {
            id,
            display_name: random_name(&mut *rng),
            capability: VehicleCapability::new(VehicleClass::from_seats(seats), pet_friendly),
            location,
            available: true,
            license_plate: random_plate(&mut *rng),
            vehicle_description: format!("{year} {make} {model}"),
        })
    }
}

impl DriverSource for SyntheticDriverGenerator {
    fn next_driver(&self) -> Option<DriverRecord> {
        self.generate()
    }
}

pub fn random_name<R: Rng>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Alex");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Smith");
    format!("{first} {last}")
}

/// Plate in the form `ABC D123`.
pub fn random_plate<R: Rng>(rng: &mut R) -> String {
    let mut plate = String::with_capacity(8);
    for _ in 0..3 {
        plate.push(random_letter(rng));
    }
    plate.push(' ');
    plate.push(random_letter(rng));
    for _ in 0..3 {
        plate.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    plate
}

fn random_letter<R: Rng>(rng: &mut R) -> char {
    char::from(PLATE_LETTERS[rng.gen_range(0..PLATE_LETTERS.len())])
}

/// Sample a point uniformly from the disc of `radius_meters` around `centre`.
///
/// The square root on the radial draw keeps density uniform over area rather than clustering
/// points near the centre.
pub fn random_location_in_disc<R: Rng>(
    rng: &mut R,
    centre: Coordinate,
    radius_meters: f64,
) -> Coordinate {
    let distance = radius_meters * rng.gen::<f64>().sqrt();
    let bearing = rng.gen_range(0.0..360.0);
    centre
        .offset_by(bearing, distance)
        .rounded(COORDINATE_PLACES)
}
