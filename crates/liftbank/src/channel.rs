//! The shared hand-off point between call generation and the car pool.
//!
//! [`DispatchChannel`] is an unbounded multi-producer, multi-consumer queue.
//! Producers never wait. Consumers wait with a bounded timeout so that an idle
//! worker comes back to its loop (and to its cancellation check) at least once
//! per poll interval.
//!
//! Each pushed request is handed to exactly one consumer. Arrival order is
//! FIFO, but which consumer wins a given request is unspecified.

use crate::{CallRequest, Error, Result};
use core::time::Duration;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::{
    sync::Notify,
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Inner {
    queue: VecDeque<CallRequest>,
    closed: bool,
}

/// Unbounded MPMC queue of [`CallRequest`]s with a cancellable, bounded-wait
/// receive.
///
/// Share it behind an [`Arc`](std::sync::Arc). Once [`close`](Self::close)d,
/// every further push or poll fails with [`Error::ChannelClosed`].
#[derive(Debug, Default)]
pub struct DispatchChannel {
    inner: Mutex<Inner>,
    available: Notify,
}

impl DispatchChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a request and wakes one waiting consumer. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the channel has been closed.
    pub fn push(&self, request: CallRequest) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(Error::ChannelClosed);
            }
            inner.queue.push_back(request);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Dequeues the oldest request without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the channel has been closed.
    pub fn try_pop(&self) -> Result<Option<CallRequest>> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(Error::ChannelClosed);
        }
        Ok(inner.queue.pop_front())
    }

    /// Waits up to `timeout` for a request.
    ///
    /// Returns `Ok(None)` when the timeout elapses with nothing to hand out.
    /// Requests still queued when `cancel` fires are left in the channel for
    /// whoever tears it down.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] as soon as `cancel` is (or already was)
    ///   cancelled.
    /// - [`Error::ChannelClosed`] if the channel is closed before or during the
    ///   wait.
    pub async fn poll_with_timeout(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Option<CallRequest>> {
        let deadline = Instant::now() + timeout;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            // Register interest before looking at the queue so a push that
            // lands in between still wakes us.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(request) = self.try_pop()? {
                return Ok(Some(request));
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = &mut notified => {}
                () = sleep_until(deadline) => return Ok(None),
            }
        }
    }

    /// Closes the channel and returns the requests that were never delivered.
    ///
    /// Consumers blocked in [`poll_with_timeout`](Self::poll_with_timeout) are
    /// woken and observe [`Error::ChannelClosed`]. Closing twice returns an
    /// empty list the second time.
    pub fn close(&self) -> Vec<CallRequest> {
        let undelivered = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            inner.queue.drain(..).collect()
        };
        self.available.notify_waiters();
        undelivered
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Number of requests waiting for a car.
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
