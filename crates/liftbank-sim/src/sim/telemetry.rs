//! Console logging for the simulator.
//!
//! Everything goes through `tracing`. The library's spans and records (behind
//! its `tracing` feature) and the [`LogSink`](super::sink::LogSink) event
//! lines share one `fmt` layer.
//!
//! The level is taken from `RUST_LOG` and defaults to `info`, which shows car
//! events and lifecycle messages. Use `RUST_LOG=liftbank=debug` to also see
//! pool and generator internals, or `trace` for per-cycle spans.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .compact(),
        )
        .try_init()?;
    Ok(())
}
