//! Synthetic passenger traffic.
//!
//! [`RequestGenerator`] produces random calls at random intervals and pushes
//! them onto the [`DispatchChannel`]. It stands in for real hall buttons and
//! knows nothing about the cars.

use crate::{CallRequest, CarEvent, DispatchChannel, Error, EventSink, FloorIndex, Result};
use core::{ops::Range, time::Duration};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio_util::sync::CancellationToken;

/// Default pause between generated calls, `[1s, 4s)`.
pub const DEFAULT_CALL_INTERVAL: Range<Duration> =
    Duration::from_millis(1000)..Duration::from_millis(4000);

/// Pushes `request` onto `channel` and reports it to `sink`.
///
/// # Errors
///
/// Returns [`Error::ChannelClosed`] if the channel has been torn down. Nothing
/// is reported in that case.
pub fn dispatch_call(
    channel: &DispatchChannel,
    sink: &dyn EventSink,
    request: CallRequest,
) -> Result<()> {
    channel.push(request)?;
    sink.emit(CarEvent::CallRequested { request });
    Ok(())
}

/// Random call source.
///
/// Origins are uniform over all floors; destinations are uniform over the
/// remaining floors, so every call is valid by construction. Pauses are
/// uniform in whole milliseconds over the configured interval.
#[derive(Debug, Clone)]
pub struct RequestGenerator {
    num_floors: FloorIndex,
    interval_ms: Range<u64>,
    rng: StdRng,
}

impl RequestGenerator {
    /// Creates a generator. With a `seed`, the sequence of calls and pauses is
    /// reproducible; without one the generator is seeded from the OS.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `num_floors < 2` or `interval` is
    /// empty at millisecond resolution.
    pub fn new(num_floors: FloorIndex, interval: Range<Duration>, seed: Option<u64>) -> Result<Self> {
        if num_floors < 2 {
            return Err(Error::InvalidConfig {
                reason: format!("cannot generate calls for {num_floors} floor(s)"),
            });
        }

        let interval_ms = interval.start.as_millis() as u64..interval.end.as_millis() as u64;
        if interval_ms.is_empty() {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "call interval {}ms..{}ms is empty",
                    interval_ms.start, interval_ms.end
                ),
            });
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            num_floors,
            interval_ms,
            rng,
        })
    }

    /// Draws the next call.
    pub fn next_request(&mut self) -> CallRequest {
        let origin = self.rng.random_range(1..=self.num_floors);
        // Draw from the other `num_floors - 1` floors by skipping the origin.
        let mut destination = self.rng.random_range(1..self.num_floors);
        if destination >= origin {
            destination += 1;
        }
        CallRequest::new_unchecked(origin, destination)
    }

    /// Draws the next pause.
    pub fn next_interval(&mut self) -> Duration {
        Duration::from_millis(self.rng.random_range(self.interval_ms.clone()))
    }

    /// Sleeps a random interval, dispatches a random call, and repeats until
    /// `cancel` fires.
    ///
    /// Returns `Ok(())` on cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the channel is torn down while the
    /// generator is still running.
    pub async fn run(
        mut self,
        channel: &DispatchChannel,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::debug!("Generating calls every {:?}ms", self.interval_ms);

        loop {
            let pause = self.next_interval();
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(pause) => {}
            }

            dispatch_call(channel, sink, self.next_request())?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Call generator stopped");
        Ok(())
    }
}
