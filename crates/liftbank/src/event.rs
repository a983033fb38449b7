//! Observable events emitted by the bank.
//!
//! Components never print. They hand [`CarEvent`]s to an [`EventSink`], which
//! decides what to do with them (log them, record them for a test, forward
//! them to a UI). Only the occurrence and the ordering of events relative to
//! state transitions is meaningful; the `Display` text is presentation.

use crate::{CallRequest, CarId, FloorIndex};
use core::fmt;
use tokio::sync::mpsc;

/// A state transition worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum CarEvent {
    /// A call was pushed onto the dispatch channel.
    CallRequested { request: CallRequest },
    /// A car reached the pickup floor of the call it is servicing.
    PickedUp { car: CarId, floor: FloorIndex },
    /// A car completed one single-floor step.
    Arrived { car: CarId, floor: FloorIndex },
    /// A car reached the destination floor of the call it is servicing.
    DroppedOff { car: CarId, floor: FloorIndex },
}

impl CarEvent {
    /// The car involved, if any. `CallRequested` happens before any car is
    /// involved.
    pub const fn car(&self) -> Option<CarId> {
        match self {
            Self::CallRequested { .. } => None,
            Self::PickedUp { car, .. } | Self::Arrived { car, .. } | Self::DroppedOff { car, .. } => {
                Some(*car)
            }
        }
    }
}

impl fmt::Display for CarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallRequested { request } => write!(f, "call requested: {request}"),
            Self::PickedUp { car, floor } => {
                write!(f, "car {car} picked up passenger at floor {floor}")
            }
            Self::Arrived { car, floor } => write!(f, "car {car} arrived at floor {floor}"),
            Self::DroppedOff { car, floor } => {
                write!(f, "car {car} dropped off passenger at floor {floor}")
            }
        }
    }
}

/// Destination for [`CarEvent`]s.
///
/// `emit` is called from inside a car's servicing region, so implementations
/// must not block.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: CarEvent);
}

/// Forwards events to a channel. A dropped receiver silently discards them.
impl EventSink for mpsc::UnboundedSender<CarEvent> {
    fn emit(&self, event: CarEvent) {
        let _ = self.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: CarEvent) {}
}
