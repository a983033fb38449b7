//! Error types for the elevator bank.
//!
//! This module defines the central `Error` enum shared by every component of
//! the dispatch subsystem. The taxonomy is deliberately narrow:
//!
//! ## Error Cases
//! - `InvalidRequest`: A call had `origin == destination` or named a floor
//!   outside `[1, num_floors]`. Rejected at construction, never enqueued.
//! - `InvalidConfig`: The bank was configured with values it cannot run with
//!   (no cars, fewer than two floors, zero-length timings).
//! - `Cancelled`: The shared cancellation token fired while a worker, the
//!   generator, or a moving car was suspended. This is a control signal rather
//!   than a failure; callers treat it as "stop now".
//! - `ChannelClosed`: A push or poll was attempted on a [`DispatchChannel`]
//!   after the pool tore it down. This is a programming error and is surfaced
//!   all the way to the process boundary.
//! - `WorkerFailed`: A car's worker task died without observing cancellation
//!   (it panicked).
//!
//! [`DispatchChannel`]: crate::DispatchChannel

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the elevator bank.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The call request was malformed.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The bank configuration cannot be used.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A suspension point observed the cancellation signal.
    #[error("Operation cancelled")]
    Cancelled,

    /// The dispatch channel was used after shutdown.
    #[error("Dispatch channel is closed")]
    ChannelClosed,

    /// A worker task terminated abnormally.
    #[error("Worker error: {context}")]
    WorkerFailed { context: String },
}

impl Error {
    /// Returns `true` if this is the cancellation control signal rather than a
    /// genuine failure.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
