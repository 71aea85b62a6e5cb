//! Engine configuration.
//!
//! Every struct deserializes with `#[serde(default)]`, so a config file only needs the fields
//! it overrides.

use std::path::Path;

use serde::Deserialize;

use crate::error::DispatchError;
use crate::geo::Coordinate;
use crate::pool::DEFAULT_POOL_CAP;

/// Default number of drivers synthesized per growth round.
pub const DEFAULT_GROWTH_BATCH_SIZE: usize = 10;

/// Default generator centre: Waterloo, Ontario.
const DEFAULT_CENTRE_LAT: f64 = 43.461655;
const DEFAULT_CENTRE_LNG: f64 = -80.521417;

/// Default generator radius around the centre (meters).
const DEFAULT_RADIUS_METERS: f64 = 7_500.0;

/// Growth policy for the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Growth never takes the pool beyond this many drivers.
    pub pool_cap: usize,
    /// Drivers synthesized per growth round.
    pub growth_batch_size: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pool_cap: DEFAULT_POOL_CAP,
            growth_batch_size: DEFAULT_GROWTH_BATCH_SIZE,
        }
    }
}

impl DispatchConfig {
    pub fn with_pool_cap(mut self, pool_cap: usize) -> Self {
        self.pool_cap = pool_cap;
        self
    }

    pub fn with_growth_batch_size(mut self, growth_batch_size: usize) -> Self {
        self.growth_batch_size = growth_batch_size;
        self
    }

    /// Upper bound on growth rounds a single dispatch can trigger starting from an empty pool.
    pub fn max_growth_rounds(&self) -> usize {
        self.pool_cap.div_ceil(self.growth_batch_size.max(1))
    }

    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.pool_cap == 0 {
            return Err(DispatchError::Config("pool_cap must be at least 1".into()));
        }
        if self.growth_batch_size == 0 {
            return Err(DispatchError::Config(
                "growth_batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parameters for the synthetic driver generator.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Seed for the RNG (for reproducibility).
    pub seed: u64,
    /// First driver id handed out; ids increase by one per driver.
    pub start_id: u32,
    /// Centre of the disc drivers are placed in.
    pub centre: Coordinate,
    /// Radius of that disc in meters.
    pub radius_meters: f64,
    /// Probability (0.0–1.0) that a generated vehicle is pet-friendly.
    pub pet_friendly_probability: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            start_id: 1,
            centre: Coordinate {
                latitude: DEFAULT_CENTRE_LAT,
                longitude: DEFAULT_CENTRE_LNG,
            },
            radius_meters: DEFAULT_RADIUS_METERS,
            pet_friendly_probability: 0.3,
        }
    }
}

impl GeneratorConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_start_id(mut self, start_id: u32) -> Self {
        self.start_id = start_id;
        self
    }

    pub fn with_centre(mut self, centre: Coordinate) -> Self {
        self.centre = centre;
        self
    }

    pub fn with_radius_meters(mut self, radius_meters: f64) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    pub fn validate(&self) -> Result<(), DispatchError> {
        self.centre
            .validate()
            .map_err(|e| DispatchError::Config(format!("generator centre: {e}")))?;
        if !self.radius_meters.is_finite() || self.radius_meters < 0.0 {
            return Err(DispatchError::Config(format!(
                "radius_meters {} must be a non-negative number",
                self.radius_meters
            )));
        }
        if !(0.0..=1.0).contains(&self.pet_friendly_probability) {
            return Err(DispatchError::Config(format!(
                "pet_friendly_probability {} must be in [0, 1]",
                self.pet_friendly_probability
            )));
        }
        Ok(())
    }
}

/// Everything needed to stand up a coordinator with a synthetic driver source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dispatch: DispatchConfig,
    pub generator: GeneratorConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, DispatchError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| DispatchError::Config(e.to_string()))?;
        config.dispatch.validate()?;
        config.generator.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, DispatchError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| DispatchError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }
}
