//! Car workers and their coordination.
//!
//! ## Structure
//!
//! - [`manager`] - [`CarPool`]: owns the cars, spawns the workers, and runs the
//!   phased shutdown.
//! - [`worker`] - [`car_loop`]: the per-car pump between the dispatch channel
//!   and [`Car::accept_and_service`](crate::Car::accept_and_service).

pub mod manager;
pub mod worker;
#[cfg(test)]
mod tests;

pub use manager::{CarPool, ShutdownReport};
pub use worker::car_loop;
