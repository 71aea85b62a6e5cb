//! Driver pool: the single shared, lock-guarded set of known drivers.
//!
//! Every operation takes the pool mutex for a bounded critical section (no I/O is ever done
//! while it is held), so snapshots never observe a half-applied mutation and availability
//! changes are linearizable. The pool only grows, up to its cap, except through
//! [`DriverPool::clear`].

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error};

use crate::error::DispatchError;
use crate::geo::Coordinate;
use crate::model::DriverRecord;

/// Default maximum number of drivers growth may produce.
pub const DEFAULT_POOL_CAP: usize = 100;

/// Supplier of freshly generated driver records used for pool growth.
///
/// Implementations are responsible for handing out unique ids; the pool rejects duplicates.
/// Returning `None` means the source is exhausted and growth stops short.
pub trait DriverSource: Send + Sync {
    fn next_driver(&self) -> Option<DriverRecord>;
}

impl<F> DriverSource for F
where
    F: Fn() -> DriverRecord + Send + Sync,
{
    fn next_driver(&self) -> Option<DriverRecord> {
        Some(self())
    }
}

#[derive(Debug, Default)]
struct PoolState {
    drivers: Vec<DriverRecord>,
    ids: HashSet<u32>,
}

impl PoolState {
    fn find_mut(&mut self, id: u32) -> Option<&mut DriverRecord> {
        self.drivers.iter_mut().find(|driver| driver.id == id)
    }

    /// Append `batch` only if every location is valid and none of its ids are already taken
    /// (in the pool or in the batch).
    fn append_unique(&mut self, batch: Vec<DriverRecord>) -> Result<(), DispatchError> {
        let mut seen = HashSet::with_capacity(batch.len());
        for driver in &batch {
            if let Err(e) = driver.location.validate() {
                error!(driver_id = driver.id, error = %e, "driver with invalid location rejected");
                return Err(e);
            }
            if self.ids.contains(&driver.id) || !seen.insert(driver.id) {
                error!(driver_id = driver.id, "duplicate driver id rejected");
                return Err(DispatchError::PoolCorruption {
                    driver_id: driver.id,
                });
            }
        }
        self.ids.extend(seen);
        self.drivers.extend(batch);
        Ok(())
    }
}

#[derive(Debug)]
pub struct DriverPool {
    state: Mutex<PoolState>,
    cap: usize,
}

impl Default for DriverPool {
    fn default() -> Self {
        Self::with_cap(DEFAULT_POOL_CAP)
    }
}

impl DriverPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty pool whose growth stops at `cap` drivers.
    pub fn with_cap(cap: usize) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            cap,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // Records are plain values, so a panic elsewhere cannot leave one half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.lock().drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().drivers.is_empty()
    }

    /// Point-in-time copy of every driver, in insertion order.
    pub fn snapshot(&self) -> Vec<DriverRecord> {
        self.lock().drivers.clone()
    }

    /// Copy of the drivers currently marked available.
    pub fn available_drivers(&self) -> Vec<DriverRecord> {
        self.lock()
            .drivers
            .iter()
            .filter(|driver| driver.available)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u32) -> Option<DriverRecord> {
        self.lock().drivers.iter().find(|driver| driver.id == id).cloned()
    }

    /// Add known drivers directly. Seeding ignores the growth cap.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PoolCorruption`] if any id is already present and
    /// [`DispatchError::InvalidRequest`] if any location is out of range; nothing is added in
    /// either case.
    pub fn seed(
        &self,
        drivers: impl IntoIterator<Item = DriverRecord>,
    ) -> Result<(), DispatchError> {
        let batch: Vec<DriverRecord> = drivers.into_iter().collect();
        let count = batch.len();
        self.lock().append_unique(batch)?;
        debug!(count, "seeded driver pool");
        Ok(())
    }

    /// Append up to `n` drivers from `source`, never taking the pool past its cap.
    ///
    /// Returns the number of drivers added; `0` once the cap has been reached or the source
    /// is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PoolCorruption`] if the source produced an id that is already
    /// in use and [`DispatchError::InvalidRequest`] if it produced an out-of-range location.
    /// The whole batch is discarded.
    pub fn grow_by(&self, n: usize, source: &dyn DriverSource) -> Result<usize, DispatchError> {
        let mut state = self.lock();
        let size = state.drivers.len();
        if size >= self.cap {
            return Ok(0);
        }
        let room = n.min(self.cap - size);
        let batch: Vec<DriverRecord> = (0..room).map_while(|_| source.next_driver()).collect();
        let added = batch.len();
        state.append_unique(batch)?;
        debug!(added, size = size + added, cap = self.cap, "grew driver pool");
        Ok(added)
    }

    /// Set a driver's availability. Returns `false` if the id is unknown.
    pub fn set_availability(&self, id: u32, available: bool) -> bool {
        match self.lock().find_mut(id) {
            Some(driver) => {
                driver.available = available;
                true
            }
            None => false,
        }
    }

    /// Atomically mark an available driver as assigned, returning the record as stored.
    ///
    /// Returns `None` if the driver is unknown or was already unavailable, which is how a
    /// dispatch learns it lost a race for that driver.
    pub fn try_claim(&self, id: u32) -> Option<DriverRecord> {
        match self.lock().find_mut(id) {
            Some(driver) if driver.available => {
                driver.available = false;
                Some(driver.clone())
            }
            _ => None,
        }
    }

    /// Return a driver to service at `location` after a trip completes.
    pub fn release(&self, id: u32, location: Coordinate) -> bool {
        match self.lock().find_mut(id) {
            Some(driver) => {
                driver.available = true;
                driver.location = location;
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.drivers.clear();
        state.ids.clear();
    }
}
