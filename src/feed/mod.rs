//! Change-feed boundary
//!
//! The cache engine never talks to the wire. It asks a [`ChangeFeed`] for the
//! changes since a [`Version`], and owns exactly one server-side watch created
//! through it. Transport, session handling and serialization of the
//! [`Selector`] all live behind this trait.

mod update;

pub use update::*;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;

use crate::model::Version;
use crate::selector::Selector;
use crate::FeedResult;

/// Handle of a server-side watch (property collector + filter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WatchId(pub u64);

impl fmt::Display for WatchId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChangeFeed: Send + Sync + 'static {
    /// Create the server-side watch resource scoped by `selector`
    async fn create_watch(
        &self,
        selector: &Selector,
    ) -> FeedResult<WatchId>;

    /// Ask for changes on `watch` since `version`.
    ///
    /// Blocks up to `max_wait` (zero: check now, do not block).
    /// - `Ok(None)` - nothing changed within the wait window
    /// - `Ok(Some(update))` - a change batch
    /// - `Err(FeedError::InvalidVersion)` - the server rejected `version`
    async fn poll(
        &self,
        watch: WatchId,
        version: &Version,
        max_wait: Duration,
    ) -> FeedResult<Option<UpdateSet>>;

    /// Release the server-side watch resource.
    ///
    /// Implementations report [`crate::FeedError::SessionEnded`] when the remote
    /// session is already gone; the engine treats that as released.
    async fn destroy_watch(
        &self,
        watch: WatchId,
    ) -> FeedResult<()>;
}
