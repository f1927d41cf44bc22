//! Incremental property synchronization.
//!
//! A client-side mirror of remote object attributes kept consistent with the
//! remote system through a versioned, diff-based change feed:
//!
//! ```text
//! Selector -> ChangeFeed -> CacheEngine -> PropertyCollector -> caller
//! ```
//!
//! The crate does not speak any wire protocol; plug one in by implementing
//! [`ChangeFeed`].

mod cache;
mod collector;
mod config;
mod constants;
mod errors;
mod feed;
mod model;
mod selector;

pub mod metrics;

pub use cache::*;
pub use collector::*;
pub use config::*;
pub use errors::*;
pub use feed::*;
pub use model::*;
pub use selector::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
