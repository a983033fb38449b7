//! The fixed set of cars and their worker tasks.
//!
//! [`CarPool`] builds one [`Car`] per configured slot and spawns one
//! [`car_loop`] per car. All workers consume from the same
//! [`DispatchChannel`] and all of them watch the same [`CancellationToken`].
//!
//! Shutdown is phased:
//!
//! 1. Cancel the shared token. Every suspension point (channel poll, floor
//!    tick) returns promptly.
//! 2. Wait, bounded per worker, for each task to finish.
//! 3. Close the channel and collect the calls no car ever received.

use super::worker::car_loop;
use crate::{
    BankConfig, CallRequest, Car, CarId, CarSnapshot, DispatchChannel, Error, EventSink, Result,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::{task::JoinHandle, time::timeout};
use tokio_util::sync::CancellationToken;

/// Outcome of [`CarPool::shutdown`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Calls still in the channel when it was closed.
    pub undelivered: Vec<CallRequest>,
    /// Workers that ended with an error instead of observing cancellation.
    pub failures: Vec<(CarId, Error)>,
    /// Workers that did not stop within the shutdown timeout and were
    /// aborted.
    pub timed_out: Vec<CarId>,
}

impl ShutdownReport {
    /// `true` when every worker observed cancellation and stopped in time.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.timed_out.is_empty()
    }
}

/// A bank of cars, each driven by its own worker task.
///
/// Membership is fixed at construction. Cars are numbered from `1`.
pub struct CarPool {
    config: BankConfig,
    cars: Vec<Arc<Car>>,
    channel: Arc<DispatchChannel>,
    shutdown_token: CancellationToken,
    workers: Mutex<Vec<(CarId, JoinHandle<Result<()>>)>>,
}

impl CarPool {
    /// Validates `config`, builds the cars, and spawns one worker per car on
    /// the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` does not validate.
    pub fn spawn(
        config: BankConfig,
        channel: Arc<DispatchChannel>,
        sink: Arc<dyn EventSink>,
        shutdown_token: CancellationToken,
    ) -> Result<Self> {
        config.validate()?;

        let cars: Vec<_> = (1..=config.num_cars)
            .map(|id| Arc::new(Car::new(id, &config, Arc::clone(&sink))))
            .collect();

        let workers = cars
            .iter()
            .map(|car| {
                let handle = tokio::spawn(car_loop(
                    Arc::clone(car),
                    Arc::clone(&channel),
                    config.poll_timeout,
                    shutdown_token.clone(),
                ));
                (car.id(), handle)
            })
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Spawned {} car workers for a {}-floor building",
            config.num_cars,
            config.num_floors
        );

        Ok(Self {
            config,
            cars,
            channel,
            shutdown_token,
            workers: Mutex::new(workers),
        })
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    pub fn cars(&self) -> &[Arc<Car>] {
        &self.cars
    }

    pub fn channel(&self) -> &Arc<DispatchChannel> {
        &self.channel
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// Position, queue length, and completed cycles of every car.
    pub fn snapshot(&self) -> Vec<CarSnapshot> {
        self.cars.iter().map(|car| car.snapshot()).collect()
    }

    /// Stops every worker and closes the channel.
    ///
    /// Calling this more than once is harmless: later calls find no workers
    /// and an already-closed channel.
    pub async fn shutdown(&self) -> ShutdownReport {
        // === Phase 1: Signal every suspension point ===
        #[cfg(feature = "tracing")]
        tracing::debug!("Cancelling car workers via shutdown token");
        self.shutdown_token.cancel();

        // === Phase 2: Wait for workers, bounded per worker ===
        let workers = core::mem::take(&mut *self.workers.lock());
        let wait_for = self.config.shutdown_timeout;

        let outcomes = workers.into_iter().map(|(car, handle)| async move {
            let abort = handle.abort_handle();
            match timeout(wait_for, handle).await {
                Ok(Ok(Ok(()))) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("Car {car} worker shutdown acknowledged");
                    WorkerExit::Stopped
                }
                Ok(Ok(Err(e))) => WorkerExit::Failed(car, e),
                Ok(Err(join)) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Car {car} worker panicked: {join}");
                    WorkerExit::Failed(
                        car,
                        Error::WorkerFailed {
                            context: format!("car {car} worker: {join}"),
                        },
                    )
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Car {car} worker shutdown timed out");
                    abort.abort();
                    WorkerExit::TimedOut(car)
                }
            }
        });

        let mut report = ShutdownReport::default();
        for outcome in futures::future::join_all(outcomes).await {
            match outcome {
                WorkerExit::Stopped => {}
                WorkerExit::Failed(car, e) => report.failures.push((car, e)),
                WorkerExit::TimedOut(car) => report.timed_out.push(car),
            }
        }

        // === Phase 3: Close the channel ===
        report.undelivered = self.channel.close();

        #[cfg(feature = "tracing")]
        {
            if !report.undelivered.is_empty() {
                tracing::warn!(
                    "{} calls were never dispatched to a car",
                    report.undelivered.len()
                );
            }
            tracing::info!("Car pool shutdown complete");
        }

        report
    }
}

enum WorkerExit {
    Stopped,
    Failed(CarId, Error),
    TimedOut(CarId),
}
