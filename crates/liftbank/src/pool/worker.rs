use crate::{Car, DispatchChannel, Error, Result};
use core::time::Duration;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Pump loop driving one [`Car`].
///
/// Each iteration waits up to `poll_timeout` on the shared
/// [`DispatchChannel`] and passes whatever comes back (a call or nothing) to
/// [`Car::accept_and_service`]. Whichever car's worker polls first wins a
/// call; there is no nearest-car or least-loaded preference.
///
/// Designed to be spawned as a Tokio task. It runs until `cancel` fires, at
/// which point it returns `Ok(())`.
///
/// # Errors
///
/// Any error other than cancellation ends the loop and is returned. In
/// practice this is [`Error::ChannelClosed`], meaning the channel was torn
/// down while the worker was still running.
pub async fn car_loop(
    car: Arc<Car>,
    channel: Arc<DispatchChannel>,
    poll_timeout: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    #[cfg(feature = "tracing")]
    tracing::trace!("Car {} worker started", car.id());

    let stopped_by = loop {
        let next = match channel.poll_with_timeout(poll_timeout, &cancel).await {
            Ok(next) => next,
            Err(e) => break e,
        };

        if let Err(e) = car.accept_and_service(next, &cancel).await {
            break e;
        }
    };

    match stopped_by {
        Error::Cancelled => {
            #[cfg(feature = "tracing")]
            tracing::trace!("Car {} worker stopped at floor {}", car.id(), car.current_floor());
            Ok(())
        }
        e => {
            #[cfg(feature = "tracing")]
            tracing::error!("Car {} worker failed: {e}", car.id());
            Err(e)
        }
    }
}
