//! Synchronized accessor over a [`CacheEngine`]
//!
//! # Basic Usage
//! ```ignore
//! use propsync::PropertyCollector;
//!
//! let collector = PropertyCollector::virtual_machines(feed, ["name", "runtime.powerState"])?;
//!
//! // Pull pending changes, then read the mirror
//! let vms = collector.get_properties().await?;
//! for (vm, properties) in vms.iter() {
//!     println!("{vm}: {:?}", properties.get("name"));
//! }
//!
//! // Cheap check, does not merge anything
//! if collector.check_for_updates().await? {
//!     let vms = collector.get_properties().await?;
//! }
//!
//! collector.close().await?;
//! ```

mod builder;

pub use builder::*;


use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;

use crate::cache::CacheEngine;
use crate::config::CollectorConfig;
use crate::constants::TASK_STATE_PATH;
use crate::feed::ChangeFeed;
use crate::model::ManagedObjectKind;
use crate::model::Mirror;
use crate::model::ObjectRef;
use crate::model::PropertyValue;
use crate::selector::Selector;
use crate::Result;

/// Shareable, concurrency-safe property collector.
///
/// One lock serializes every operation that polls the change feed, since
/// they all share the collector state on the remote side. Cloning is cheap
/// and every clone drives the same engine.
pub struct PropertyCollector<F: ChangeFeed> {
    inner: Arc<CollectorInner<F>>,
}

struct CollectorInner<F: ChangeFeed> {
    engine: Mutex<CacheEngine<F>>,
    /// Last snapshot handed out, readable without the lock
    published: ArcSwap<Mirror>,
    config: CollectorConfig,
}

impl<F: ChangeFeed> Clone for PropertyCollector<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ChangeFeed> PropertyCollector<F> {
    pub fn new(
        feed: Arc<F>,
        selector: Selector,
    ) -> Self {
        Self::with_config(feed, selector, CollectorConfig::default())
    }

    pub fn with_config(
        feed: Arc<F>,
        selector: Selector,
        config: CollectorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CollectorInner {
                engine: Mutex::new(CacheEngine::new(feed, selector, config.clone())),
                published: ArcSwap::from_pointee(Mirror::new()),
                config,
            }),
        }
    }

    pub fn builder(
        feed: Arc<F>,
        selector: Selector,
    ) -> CollectorBuilder<F> {
        CollectorBuilder::new(feed, selector)
    }

    /// Observe `kind` anywhere in the inventory
    pub fn for_kind<S: Into<String>>(
        feed: Arc<F>,
        kind: ManagedObjectKind,
        paths: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        Ok(Self::new(feed, Selector::full_hierarchy(kind, paths)?))
    }

    pub fn host_systems<S: Into<String>>(
        feed: Arc<F>,
        paths: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        Ok(Self::new(feed, Selector::host_systems(paths)?))
    }

    pub fn virtual_machines<S: Into<String>>(
        feed: Arc<F>,
        paths: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        Ok(Self::new(feed, Selector::virtual_machines(paths)?))
    }

    /// Track `info.state` of a fixed set of tasks
    pub fn tasks(
        feed: Arc<F>,
        tasks: Vec<ObjectRef>,
    ) -> Result<Self> {
        Ok(Self::new(feed, Selector::tasks(tasks)?))
    }

    /// Track `paths` of a fixed set of tasks
    pub fn tasks_with_paths<S: Into<String>>(
        feed: Arc<F>,
        tasks: Vec<ObjectRef>,
        paths: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        Ok(Self::new(feed, Selector::tasks_with_paths(tasks, paths)?))
    }

    /// Merge pending changes, then return the mirror.
    ///
    /// The snapshot reflects every batch merged up to this call's poll and
    /// never a partially merged one. Later merges do not alter it.
    ///
    /// # Errors
    /// - [`crate::Error::Feed`] on transient poll failures
    pub async fn get_properties(&self) -> Result<Arc<Mirror>> {
        let mut engine = self.inner.engine.lock().await;
        engine.refresh().await?;
        let snapshot = engine.snapshot();
        self.inner.published.store(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Last snapshot returned by [`get_properties`](Self::get_properties),
    /// without contacting the remote system or waiting for the lock
    pub fn get_properties_from_cache(&self) -> Arc<Mirror> {
        self.inner.published.load_full()
    }

    /// `true` if the cached data is not up to date. Does not block.
    pub async fn check_for_updates(&self) -> Result<bool> {
        self.wait_for_updates(Duration::ZERO).await
    }

    /// Block up to `max_wait` for a change; does not merge it
    pub async fn wait_for_updates(
        &self,
        max_wait: Duration,
    ) -> Result<bool> {
        let mut engine = self.inner.engine.lock().await;
        engine.wait_for_change(max_wait).await
    }

    /// `(task, info.state)` pairs of the pending change batch, waiting up to
    /// `max_wait` for one.
    ///
    /// The batch is not merged, so the mirror and its version stay where
    /// they are and the same changes are reported until the next
    /// [`get_properties`](Self::get_properties).
    pub async fn task_state_changes(
        &self,
        max_wait: Duration,
    ) -> Result<Vec<(ObjectRef, PropertyValue)>> {
        let mut engine = self.inner.engine.lock().await;
        let Some(update) = engine.peek_changes(max_wait).await? else {
            return Ok(Vec::new());
        };

        Ok(update
            .object_updates()
            .flat_map(|object| {
                object
                    .change_set
                    .iter()
                    .filter(|change| change.name == TASK_STATE_PATH)
                    .map(move |change| (object.obj.clone(), change.val.clone().unwrap_or(PropertyValue::Null)))
            })
            .collect())
    }

    pub async fn wait_for_updates_default(&self) -> Result<bool> {
        self.wait_for_updates(self.inner.config.default_wait()).await
    }

    /// Release the server-side watch and forget the cached objects
    pub async fn close(&self) -> Result<()> {
        let mut engine = self.inner.engine.lock().await;
        let result = engine.close().await;
        self.inner.published.store(Arc::new(Mirror::new()));
        result
    }
}

impl<F: ChangeFeed> fmt::Debug for PropertyCollector<F> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.inner.engine.try_lock() {
            Ok(engine) => f.debug_tuple("PropertyCollector").field(&*engine).finish(),
            Err(_) => f.debug_struct("PropertyCollector").finish_non_exhaustive(),
        }
    }
}
