//! Assignment sink: where the caller persists a driver-to-ride link after a match.
//!
//! The dispatch core never talks to storage itself. A sink is invoked only after the pool
//! lock has been released, so a slow store cannot stall other dispatches.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::SinkError;
use crate::model::{DriverRecord, RideRequest};

/// One persisted driver-to-ride link.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub ride_id: u64,
    pub rider_id: Option<u64>,
    pub driver_id: u32,
}

impl Assignment {
    pub fn new(request: &RideRequest, driver: &DriverRecord) -> Self {
        Self {
            ride_id: request.id,
            rider_id: request.rider_id,
            driver_id: driver.id,
        }
    }
}

#[async_trait]
pub trait AssignmentSink: Send + Sync {
    /// Persist the assignment. Errors are reported to the dispatch caller unchanged.
    async fn record(&self, assignment: Assignment) -> Result<(), SinkError>;
}

/// Sink that keeps assignments in memory; used by the CLI and tests.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentSink {
    assignments: Mutex<Vec<Assignment>>,
}

impl InMemoryAssignmentSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assignments(&self) -> Vec<Assignment> {
        self.assignments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AssignmentSink for InMemoryAssignmentSink {
    async fn record(&self, assignment: Assignment) -> Result<(), SinkError> {
        self.assignments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(assignment);
        Ok(())
    }
}
