#![doc = include_str!("../README.md")]

mod call;
mod car;
mod channel;
mod config;
mod error;
mod event;
mod generator;
mod pool;

pub use crate::call::*;
pub use crate::car::*;
pub use crate::channel::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::event::*;
pub use crate::generator::*;
pub use crate::pool::*;
