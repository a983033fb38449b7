use liftbank::{CarEvent, EventSink};

/// Writes every [`CarEvent`] as an `info` log line.
///
/// The line is the event's `Display` text, with the car id attached as a
/// structured field so it can be filtered on.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: CarEvent) {
        match event.car() {
            Some(car) => tracing::info!(car, "{event}"),
            None => tracing::info!("{event}"),
        }
    }
}
