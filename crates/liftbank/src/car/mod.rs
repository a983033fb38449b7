//! A single elevator car.
//!
//! A [`Car`] owns its position and its [`PendingQueue`]. All movement happens
//! inside [`Car::accept_and_service`], which is the car's one critical
//! section: at most one pickup-to-dropoff cycle runs at a time, and calls that
//! arrive while a cycle is in progress only join the pending queue.
//!
//! Cars share nothing with each other. Two cars never contend on a lock.
//!
//! ## Movement
//!
//! The car moves one floor per tick. Each step sleeps for the configured
//! floor tick and only then commits the new floor and emits
//! [`CarEvent::Arrived`]. Cancellation during a tick abandons that step, so
//! the observable floor is always the last one actually reached.

mod pending;

pub use pending::PendingQueue;

use crate::{
    BankConfig, CallRequest, CarEvent, CarId, Error, EventSink, FloorIndex, Result,
};
use core::{cmp::Ordering, time::Duration};
use parking_lot::Mutex;
use portable_atomic::{AtomicU32, AtomicU64};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Point-in-time view of a car, taken without waiting for its current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarSnapshot {
    pub id: CarId,
    pub floor: FloorIndex,
    pub pending: usize,
    pub serviced: u64,
}

/// One elevator car: a position, a queue of accepted calls, and the movement
/// state machine that services them.
pub struct Car {
    id: CarId,
    num_floors: FloorIndex,
    floor_tick: Duration,
    // Written only while `cycle` is held; readable at any time for snapshots.
    floor: AtomicU32,
    serviced: AtomicU64,
    pending: Mutex<PendingQueue>,
    cycle: tokio::sync::Mutex<()>,
    sink: Arc<dyn EventSink>,
}

impl Car {
    /// Creates a car parked at floor 1.
    pub fn new(id: CarId, config: &BankConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            id,
            num_floors: config.num_floors,
            floor_tick: config.floor_tick,
            floor: AtomicU32::new(1),
            serviced: AtomicU64::new(0),
            pending: Mutex::new(PendingQueue::new()),
            cycle: tokio::sync::Mutex::new(()),
            sink,
        }
    }

    /// Creates a car parked at `floor`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `floor` is outside
    /// `[1, config.num_floors]`.
    pub fn starting_at(
        id: CarId,
        floor: FloorIndex,
        config: &BankConfig,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        if !(1..=config.num_floors).contains(&floor) {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "car {id} cannot start at floor {floor} of a {}-floor building",
                    config.num_floors
                ),
            });
        }
        let car = Self::new(id, config, sink);
        car.floor.store(floor, portable_atomic::Ordering::Relaxed);
        Ok(car)
    }

    pub const fn id(&self) -> CarId {
        self.id
    }

    pub fn current_floor(&self) -> FloorIndex {
        self.floor.load(portable_atomic::Ordering::Acquire)
    }

    /// Number of calls accepted but not yet started.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of completed pickup-to-dropoff cycles.
    pub fn serviced(&self) -> u64 {
        self.serviced.load(portable_atomic::Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CarSnapshot {
        CarSnapshot {
            id: self.id,
            floor: self.current_floor(),
            pending: self.pending_len(),
            serviced: self.serviced(),
        }
    }

    /// Accepts `request` (if any) and services at most one pending call.
    ///
    /// 1. `request` joins the pending queue immediately, even if another
    ///    caller is mid-cycle on this car.
    /// 2. The car's servicing lock is taken. Concurrent callers queue up here.
    /// 3. The pending call with the nearest pickup to the car's *current*
    ///    floor is removed and serviced: move to its origin, emit
    ///    [`CarEvent::PickedUp`], move to its destination, emit
    ///    [`CarEvent::DroppedOff`].
    ///
    /// Returns the call that was completed, or `None` if nothing was pending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `cancel` fires while waiting for the
    /// lock or while moving. A call whose cycle was cut short is not
    /// re-queued.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all, fields(car = self.id)))]
    pub async fn accept_and_service(
        &self,
        request: Option<CallRequest>,
        cancel: &CancellationToken,
    ) -> Result<Option<CallRequest>> {
        if let Some(request) = request {
            self.pending.lock().push(request);
        }

        let _cycle = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            guard = self.cycle.lock() => guard,
        };

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let Some(task) = self.pending.lock().take_nearest(self.current_floor()) else {
            return Ok(None);
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(car = self.id, from = self.current_floor(), %task, "starting cycle");

        match self.service(task, cancel).await {
            Ok(()) => Ok(Some(task)),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    car = self.id,
                    floor = self.current_floor(),
                    %task,
                    "cycle abandoned: {e}"
                );
                Err(e)
            }
        }
    }

    async fn service(&self, task: CallRequest, cancel: &CancellationToken) -> Result<()> {
        self.move_to_floor(task.origin(), cancel).await?;
        self.sink.emit(CarEvent::PickedUp {
            car: self.id,
            floor: task.origin(),
        });

        self.move_to_floor(task.destination(), cancel).await?;
        self.sink.emit(CarEvent::DroppedOff {
            car: self.id,
            floor: task.destination(),
        });

        self.serviced.fetch_add(1, portable_atomic::Ordering::Relaxed);
        Ok(())
    }

    /// Steps one floor at a time towards `target`. Must only run while the
    /// cycle lock is held.
    async fn move_to_floor(&self, target: FloorIndex, cancel: &CancellationToken) -> Result<()> {
        debug_assert!((1..=self.num_floors).contains(&target));

        loop {
            let floor = self.current_floor();
            let next = match target.cmp(&floor) {
                Ordering::Equal => return Ok(()),
                Ordering::Greater => floor + 1,
                Ordering::Less => floor - 1,
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(self.floor_tick) => {}
            }

            self.floor.store(next, portable_atomic::Ordering::Release);
            self.sink.emit(CarEvent::Arrived {
                car: self.id,
                floor: next,
            });
        }
    }
}
