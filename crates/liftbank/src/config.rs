//! Runtime parameters of an elevator bank.
//!
//! The defaults reproduce the classic three-car, ten-floor simulation: each
//! single-floor step takes half a second and idle workers re-check the
//! dispatch channel every half second.

use crate::{Error, FloorIndex, Result};
use core::time::Duration;

/// Number of cars in the default bank.
pub const DEFAULT_NUM_CARS: usize = 3;

/// Number of floors in the default building.
pub const DEFAULT_NUM_FLOORS: FloorIndex = 10;

/// Time for a car to travel one floor.
pub const DEFAULT_FLOOR_TICK: Duration = Duration::from_millis(500);

/// Bounded wait of an idle worker on the dispatch channel. This is also the
/// worst-case latency for an idle worker to observe cancellation.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// How long shutdown waits for each worker to stop.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Configuration shared by every car and worker in a [`CarPool`].
///
/// [`CarPool`]: crate::CarPool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankConfig {
    pub num_cars: usize,
    pub num_floors: FloorIndex,
    pub floor_tick: Duration,
    pub poll_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            num_cars: DEFAULT_NUM_CARS,
            num_floors: DEFAULT_NUM_FLOORS,
            floor_tick: DEFAULT_FLOOR_TICK,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl BankConfig {
    /// Checks that the bank can run with these values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if there are no cars, fewer than two
    /// floors, or a zero floor tick or poll timeout.
    pub fn validate(&self) -> Result<()> {
        if self.num_cars == 0 {
            return Err(invalid("num_cars must be greater than 0"));
        }
        if self.num_floors < 2 {
            return Err(invalid(format!(
                "num_floors must be at least 2 (got {})",
                self.num_floors
            )));
        }
        if self.floor_tick.is_zero() {
            return Err(invalid("floor_tick must be greater than 0"));
        }
        if self.poll_timeout.is_zero() {
            return Err(invalid("poll_timeout must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        reason: reason.into(),
    }
}
