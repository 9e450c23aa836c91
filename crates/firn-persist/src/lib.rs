#![doc = include_str!("../README.md")]

mod error;
mod hook;
mod registry;

pub use crate::error::*;
pub use crate::hook::*;
pub use crate::registry::*;
// Public re-export so downstream crates can access `firn` via
// `firn_persist::firn`
pub use firn;
