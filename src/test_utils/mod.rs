//! the test_utils folder here will share utils or test components between
//! unit tests of the cache engine and the collector
mod fixtures;
mod scripted_feed;
mod simulated_server;

pub use fixtures::*;
pub use scripted_feed::*;
pub use simulated_server::*;
