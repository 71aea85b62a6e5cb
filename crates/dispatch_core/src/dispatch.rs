//! Dispatch coordinator: resolves one ride request to a driver or to "none available".
//!
//! A dispatch walks the states
//! `Idle → Filtering → Selecting → (Found | Growing) → (Found | Exhausted)`:
//!
//! 1. **Filtering**: snapshot the pool and keep the available drivers that satisfy the request
//! 2. **Selecting**: hand the candidates to the selector (nearest driver by default)
//! 3. **Found**: claim the chosen driver with a compare-and-set on its availability; a lost
//!    claim means a concurrent dispatch took that driver, so the loop re-enters Filtering
//! 4. **Growing**: no candidate, so ask the pool to synthesize another batch and re-enter
//!    Filtering
//! 5. **Exhausted**: growth added nothing because the pool is at its cap
//!
//! Growth is bounded by the pool cap, so a dispatch always terminates even when the driver
//! source never produces an eligible driver.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::geo::Coordinate;
use crate::matching::{filter_drivers, DriverSelector, NearestSelector};
use crate::model::{DriverRecord, RideRequest};
use crate::pool::{DriverPool, DriverSource};
use crate::sink::{Assignment, AssignmentSink};

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// The driver was claimed for this request; the record reflects it as unavailable.
    Assigned { driver: DriverRecord },
    /// The pool reached its cap without producing an eligible driver.
    NoneAvailable,
    /// The caller abandoned the dispatch between rounds.
    Cancelled,
}

impl MatchResult {
    pub fn driver(&self) -> Option<&DriverRecord> {
        match self {
            MatchResult::Assigned { driver } => Some(driver),
            _ => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, MatchResult::Assigned { .. })
    }
}

/// States a dispatch moves through; carried on trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Filtering,
    Selecting,
    Growing,
    Found,
    Exhausted,
    Cancelled,
}

/// Hands a claimed driver back to the pool when dropped, unless disarmed first.
///
/// Covers both a failed sink write and a caller that abandons the report future mid-await.
struct ClaimGuard<'a> {
    pool: &'a DriverPool,
    driver_id: u32,
    armed: bool,
}

impl<'a> ClaimGuard<'a> {
    fn new(pool: &'a DriverPool, driver_id: u32) -> Self {
        Self {
            pool,
            driver_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(driver_id = self.driver_id, "releasing unreported claim");
            self.pool.set_availability(self.driver_id, true);
        }
    }
}

pub struct DispatchCoordinator {
    pool: Arc<DriverPool>,
    source: Box<dyn DriverSource>,
    selector: Box<dyn DriverSelector>,
    config: DispatchConfig,
}

impl std::fmt::Debug for DispatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchCoordinator")
            .field("pool", &self.pool)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DispatchCoordinator {
    /// Create a coordinator over a fresh pool capped at `config.pool_cap`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Config`] if the config is invalid.
    pub fn new(
        config: DispatchConfig,
        source: Box<dyn DriverSource>,
    ) -> Result<Self, DispatchError> {
        config.validate()?;
        Ok(Self {
            pool: Arc::new(DriverPool::with_cap(config.pool_cap)),
            source,
            selector: Box::new(NearestSelector),
            config,
        })
    }

    /// Create a coordinator over an existing, possibly shared, pool. The pool's own cap bounds
    /// growth; `config.pool_cap` is ignored.
    pub fn with_pool(
        pool: Arc<DriverPool>,
        config: DispatchConfig,
        source: Box<dyn DriverSource>,
    ) -> Result<Self, DispatchError> {
        config.validate()?;
        Ok(Self {
            pool,
            source,
            selector: Box::new(NearestSelector),
            config,
        })
    }

    /// Replace the default nearest-driver selector.
    pub fn with_selector(mut self, selector: Box<dyn DriverSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn pool(&self) -> &Arc<DriverPool> {
        &self.pool
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Resolve `request` to a driver, growing the pool as needed.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidRequest`] for out-of-range coordinates (checked before any
    /// filtering) and [`DispatchError::PoolCorruption`] if growth produced a duplicate id.
    /// Running out of drivers is [`MatchResult::NoneAvailable`], not an error.
    pub fn dispatch(&self, request: &RideRequest) -> Result<MatchResult, DispatchError> {
        self.run(request, || false)
    }

    /// Like [`DispatchCoordinator::dispatch`], but checks `cancel` before every filtering round
    /// and returns [`MatchResult::Cancelled`] once it reads `true`.
    pub fn dispatch_with_cancel(
        &self,
        request: &RideRequest,
        cancel: &watch::Receiver<bool>,
    ) -> Result<MatchResult, DispatchError> {
        self.run(request, || *cancel.borrow())
    }

    /// Dispatch, then record the assignment in `sink`.
    ///
    /// The sink runs after the claim with no pool lock held. If it fails, the driver is made
    /// available again and the sink error is returned as [`DispatchError::Sink`]. Dropping the
    /// returned future before the sink finishes (a caller timeout, say) also releases the
    /// driver.
    pub async fn dispatch_and_report(
        &self,
        request: &RideRequest,
        sink: &dyn AssignmentSink,
    ) -> Result<MatchResult, DispatchError> {
        let result = self.dispatch(request)?;
        let MatchResult::Assigned { driver } = &result else {
            return Ok(result);
        };

        let claim = ClaimGuard::new(self.pool.as_ref(), driver.id);
        match sink.record(Assignment::new(request, driver)).await {
            Ok(()) => {
                claim.disarm();
                Ok(result)
            }
            Err(e) => {
                warn!(
                    ride_id = request.id,
                    driver_id = driver.id,
                    error = %e,
                    "assignment not recorded; releasing driver"
                );
                Err(e.into())
            }
        }
    }

    fn run(
        &self,
        request: &RideRequest,
        is_cancelled: impl Fn() -> bool,
    ) -> Result<MatchResult, DispatchError> {
        request.validate()?;

        let mut growth_rounds = 0usize;
        loop {
            if is_cancelled() {
                info!(
                    ride_id = request.id,
                    phase = ?DispatchPhase::Cancelled,
                    growth_rounds,
                    "dispatch cancelled"
                );
                return Ok(MatchResult::Cancelled);
            }

            debug!(ride_id = request.id, phase = ?DispatchPhase::Filtering, "filtering pool");
            let snapshot = self.pool.snapshot();
            let candidates = filter_drivers(&snapshot, &request.required_capability);

            debug!(
                ride_id = request.id,
                phase = ?DispatchPhase::Selecting,
                candidates = candidates.len(),
                "selecting driver"
            );
            if let Some(chosen) = self.selector.select(&candidates, request.pickup) {
                match self.pool.try_claim(chosen.id) {
                    Some(driver) => {
                        info!(
                            ride_id = request.id,
                            driver_id = driver.id,
                            phase = ?DispatchPhase::Found,
                            growth_rounds,
                            "driver assigned"
                        );
                        return Ok(MatchResult::Assigned { driver });
                    }
                    None => {
                        warn!(
                            ride_id = request.id,
                            driver_id = chosen.id,
                            "driver claimed by another dispatch; retrying"
                        );
                        continue;
                    }
                }
            }

            debug!(
                ride_id = request.id,
                phase = ?DispatchPhase::Growing,
                pool_size = snapshot.len(),
                "no eligible driver; growing pool"
            );
            let added = self
                .pool
                .grow_by(self.config.growth_batch_size, self.source.as_ref())?;
            if added == 0 {
                warn!(
                    ride_id = request.id,
                    phase = ?DispatchPhase::Exhausted,
                    growth_rounds,
                    cap = self.pool.cap(),
                    "pool exhausted; no driver available"
                );
                return Ok(MatchResult::NoneAvailable);
            }
            growth_rounds += 1;
        }
    }

    pub fn seed_pool(
        &self,
        drivers: impl IntoIterator<Item = DriverRecord>,
    ) -> Result<(), DispatchError> {
        self.pool.seed(drivers)
    }

    pub fn clear_pool(&self) {
        self.pool.clear();
    }

    pub fn set_availability(&self, driver_id: u32, available: bool) -> bool {
        self.pool.set_availability(driver_id, available)
    }

    /// Trip finished: the driver is available again at the drop-off point.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidRequest`] if `drop_off` is out of range.
    pub fn complete_trip(
        &self,
        driver_id: u32,
        drop_off: Coordinate,
    ) -> Result<bool, DispatchError> {
        drop_off.validate()?;
        Ok(self.pool.release(driver_id, drop_off))
    }

    pub fn available_drivers(&self) -> Vec<DriverRecord> {
        self.pool.available_drivers()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use super::*;
    use crate::error::SinkError;
    use crate::model::{VehicleCapability, VehicleClass};

    fn pickup() -> Coordinate {
        Coordinate::new(43.461655, -80.521417).expect("valid")
    }

    fn regular(pet_friendly: bool) -> VehicleCapability {
        VehicleCapability::new(VehicleClass::Regular, pet_friendly)
    }

    fn driver(id: u32, capability: VehicleCapability, meters: f64) -> DriverRecord {
        DriverRecord::new(
            id,
            format!("Driver {id}"),
            capability,
            pickup().offset_by(90.0, meters),
        )
    }

    fn never_called() -> Box<dyn DriverSource> {
        Box::new(|| -> DriverRecord { panic!("pool should not grow") })
    }

    #[test]
    fn assigns_closest_eligible_driver_and_marks_it_unavailable() {
        let coordinator = DispatchCoordinator::new(DispatchConfig::default(), never_called())
            .expect("coordinator");
        coordinator
            .seed_pool([driver(1, regular(true), 500.0), driver(2, regular(false), 50.0)])
            .expect("seed");

        let request = RideRequest::new(10, pickup(), regular(false));
        let result = coordinator.dispatch(&request).expect("dispatch");

        let assigned = result.driver().expect("assigned");
        assert_eq!(assigned.id, 2);
        assert!(!assigned.available);
        assert!(!coordinator.pool().get(2).expect("driver").available);
    }

    #[test]
    fn grows_until_an_eligible_driver_appears() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let source = move || {
            let id = counter.fetch_add(1, Ordering::Relaxed);
            // only the 15th generated driver is XL
            let class = if id == 14 {
                VehicleClass::Xl
            } else {
                VehicleClass::Regular
            };
            driver(id, VehicleCapability::new(class, false), 100.0)
        };
        let coordinator = DispatchCoordinator::new(DispatchConfig::default(), Box::new(source))
            .expect("coordinator");

        let xl = VehicleCapability::new(VehicleClass::Xl, false);
        let request = RideRequest::new(1, pickup(), xl);
        let result = coordinator.dispatch(&request).expect("dispatch");

        assert_eq!(result.driver().map(|d| d.id), Some(14));
        assert_eq!(coordinator.pool().len(), 20);
        assert_eq!(calls.load(Ordering::Relaxed), 20);
    }

    #[test]
    fn rejects_invalid_pickup_before_touching_the_pool() {
        let coordinator = DispatchCoordinator::new(DispatchConfig::default(), never_called())
            .expect("coordinator");
        let request = RideRequest::new(
            1,
            Coordinate {
                latitude: -95.0,
                longitude: 0.0,
            },
            regular(false),
        );
        assert!(matches!(
            coordinator.dispatch(&request),
            Err(DispatchError::InvalidRequest(_))
        ));
        assert!(coordinator.pool().is_empty());
    }

    #[test]
    fn duplicate_ids_from_source_surface_as_corruption() {
        let source = || driver(7, regular(false), 10.0);
        let coordinator = DispatchCoordinator::new(DispatchConfig::default(), Box::new(source))
            .expect("coordinator");
        let xl = VehicleCapability::new(VehicleClass::Xl, false);
        let request = RideRequest::new(1, pickup(), xl);
        assert!(matches!(
            coordinator.dispatch(&request),
            Err(DispatchError::PoolCorruption { driver_id: 7 })
        ));
    }

    #[test]
    fn cancelled_before_first_round() {
        let coordinator = DispatchCoordinator::new(DispatchConfig::default(), never_called())
            .expect("coordinator");
        let (_tx, rx) = watch::channel(true);
        let request = RideRequest::new(1, pickup(), regular(false));
        assert_eq!(
            coordinator.dispatch_with_cancel(&request, &rx).expect("dispatch"),
            MatchResult::Cancelled
        );
    }

    #[test]
    fn custom_selector_is_used() {
        struct Farthest;
        impl DriverSelector for Farthest {
            fn select<'a>(
                &self,
                drivers: &'a [DriverRecord],
                _pickup: Coordinate,
            ) -> Option<&'a DriverRecord> {
                drivers.last()
            }
        }

        let coordinator = DispatchCoordinator::new(DispatchConfig::default(), never_called())
            .expect("coordinator")
            .with_selector(Box::new(Farthest));
        coordinator
            .seed_pool([driver(1, regular(false), 10.0), driver(2, regular(false), 900.0)])
            .expect("seed");

        let result = coordinator
            .dispatch(&RideRequest::new(1, pickup(), regular(false)))
            .expect("dispatch");
        assert_eq!(result.driver().map(|d| d.id), Some(2));
    }

    struct FailingSink {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AssignmentSink for FailingSink {
        async fn record(&self, assignment: Assignment) -> Result<(), SinkError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Err(SinkError::Rejected {
                ride_id: assignment.ride_id,
                driver_id: assignment.driver_id,
                message: "write refused".into(),
            })
        }
    }

    #[tokio::test]
    async fn sink_failure_is_reported_and_driver_released() {
        let coordinator = DispatchCoordinator::new(DispatchConfig::default(), never_called())
            .expect("coordinator");
        coordinator.seed_pool([driver(1, regular(false), 10.0)]).expect("seed");
        let sink = FailingSink {
            calls: AtomicUsize::new(0),
        };

        let err = coordinator
            .dispatch_and_report(&RideRequest::new(3, pickup(), regular(false)), &sink)
            .await
            .expect_err("sink failure");

        assert!(matches!(
            err,
            DispatchError::Sink(SinkError::Rejected {
                ride_id: 3,
                driver_id: 1,
                ..
            })
        ));
        assert_eq!(sink.calls.load(Ordering::Relaxed), 1);
        assert!(coordinator.pool().get(1).expect("driver").available);
    }
}
