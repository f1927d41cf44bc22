use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::merge::merge_update_set;
use crate::config::CollectorConfig;
use crate::feed::ChangeFeed;
use crate::feed::UpdateSet;
use crate::feed::WatchId;
use crate::metrics::register_custom_metrics;
use crate::metrics::MERGED_BATCHES;
use crate::metrics::MERGE_FAILURES;
use crate::metrics::MIRROR_OBJECTS;
use crate::metrics::RESYNCS;
use crate::metrics::TRUNCATED_FOLLOWUPS;
use crate::model::Mirror;
use crate::model::Version;
use crate::selector::Selector;
use crate::Error;
use crate::FeedError;
use crate::FeedResult;
use crate::MergeError;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResyncReason {
    InvalidVersion,
    MergeFailure,
    Stale,
}

/// Outcome of one non-merging poll
enum Pending {
    Nothing,
    Batch(UpdateSet),
    /// The version was invalidated; only a resync can tell what changed
    Stale,
}

impl ResyncReason {
    fn as_str(&self) -> &'static str {
        match self {
            ResyncReason::InvalidVersion => "invalid_version",
            ResyncReason::MergeFailure => "merge_failure",
            ResyncReason::Stale => "stale",
        }
    }
}

/// Owns the local mirror of one selector's objects and keeps it in step
/// with the change feed.
///
/// The version token only advances once a whole logical update (including
/// every truncated continuation) has been merged. Batches are merged into a
/// staged copy and committed at once, so the mirror always reflects some
/// version the server actually reported. Any merge failure or version
/// invalidation resets the mirror and resynchronizes from the initial version.
///
/// Not synchronized; see [`crate::PropertyCollector`] for the shared facade.
pub struct CacheEngine<F: ChangeFeed> {
    feed: Arc<F>,
    selector: Selector,
    config: CollectorConfig,
    /// Server-side watch, created on first use
    watch: Option<WatchId>,
    version: Version,
    mirror: Arc<Mirror>,
    /// A change check saw the version invalidated; the next refresh must resync
    stale: bool,
    /// This engine's share of the per-kind mirror size gauge
    published_size: i64,
}

impl<F: ChangeFeed> CacheEngine<F> {
    pub fn new(
        feed: Arc<F>,
        selector: Selector,
        config: CollectorConfig,
    ) -> Self {
        register_custom_metrics();
        Self {
            feed,
            selector,
            config,
            watch: None,
            version: Version::initial(),
            mirror: Arc::new(Mirror::new()),
            stale: false,
            published_size: 0,
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn watch(&self) -> Option<WatchId> {
        self.watch
    }

    /// Current mirror contents, without contacting the remote system
    pub fn snapshot(&self) -> Arc<Mirror> {
        Arc::clone(&self.mirror)
    }

    /// Merge whatever changed since the stored version.
    ///
    /// # Returns
    /// - `Ok(true)` if the mirror was replaced by a newer version
    /// - `Ok(false)` if nothing changed
    ///
    /// # Errors
    /// - [`Error::Feed`] on transient poll failures; the mirror is left untouched
    pub async fn refresh(&mut self) -> Result<bool> {
        if self.stale {
            return self.resync(ResyncReason::Stale).await;
        }

        let watch = self.ensure_watch().await?;
        let update = match self.poll(watch, &self.version, Duration::ZERO).await {
            Ok(Some(update)) => update,
            Ok(None) => return Ok(false),
            Err(e) => return self.recover(e.into()).await,
        };

        match self.drain(watch, &self.mirror, update).await {
            Ok((mirror, version)) => {
                self.commit(mirror, version);
                Ok(true)
            }
            Err(e) => self.recover(e).await,
        }
    }

    /// Report whether a change is pending, blocking up to `max_wait`.
    ///
    /// Never touches the mirror. Returns no later than `max_wait` after entry.
    pub async fn wait_for_change(
        &mut self,
        max_wait: Duration,
    ) -> Result<bool> {
        Ok(!matches!(self.peek(max_wait).await?, Pending::Nothing))
    }

    /// Fetch the pending change batch, blocking up to `max_wait`, without
    /// merging it or advancing the version.
    ///
    /// Returns `Ok(None)` when nothing changed, and also when the server
    /// rejected the version: the engine is then stale and the next
    /// [`refresh`](Self::refresh) resynchronizes.
    pub async fn peek_changes(
        &mut self,
        max_wait: Duration,
    ) -> Result<Option<UpdateSet>> {
        match self.peek(max_wait).await? {
            Pending::Batch(update) => Ok(Some(update)),
            Pending::Nothing | Pending::Stale => Ok(None),
        }
    }

    /// Release the server-side watch and discard the mirror.
    ///
    /// A release failure caused by an already-ended session is ignored.
    /// The engine stays usable: a later refresh creates a new watch.
    pub async fn close(&mut self) -> Result<()> {
        self.version = Version::initial();
        self.mirror = Arc::new(Mirror::new());
        self.stale = false;
        self.publish_size();

        match self.watch.take() {
            Some(watch) => release(self.feed.as_ref(), watch).await,
            None => Ok(()),
        }
    }

    /// Poll once at the stored version; the deadline covers watch creation too
    async fn peek(
        &mut self,
        max_wait: Duration,
    ) -> Result<Pending> {
        if self.stale {
            return Ok(Pending::Stale);
        }
        debug!(?max_wait, "Checking for updates on {:?}", self);

        let polled = if max_wait.is_zero() {
            self.poll_current(max_wait).await
        } else {
            match timeout(max_wait, self.poll_current(max_wait)).await {
                Ok(polled) => polled,
                Err(_) => {
                    debug!(?max_wait, "No change within the wait window");
                    return Ok(Pending::Nothing);
                }
            }
        };

        match polled {
            Ok(Some(update)) => Ok(Pending::Batch(update)),
            Ok(None) => Ok(Pending::Nothing),
            Err(Error::Feed(e)) if e.is_invalid_version() => {
                error!(version = %self.version, "Collector version is out of date or invalid");
                self.stale = true;
                Ok(Pending::Stale)
            }
            Err(e) => Err(e),
        }
    }

    async fn poll_current(
        &mut self,
        max_wait: Duration,
    ) -> Result<Option<UpdateSet>> {
        let watch = self.ensure_watch().await?;
        Ok(self.poll(watch, &self.version, max_wait).await?)
    }

    async fn ensure_watch(&mut self) -> Result<WatchId> {
        if let Some(watch) = self.watch {
            return Ok(watch);
        }
        let watch = self.feed.create_watch(&self.selector).await?;
        info!(%watch, kind = %self.selector.kind(), "Created watch");
        self.watch = Some(watch);
        Ok(watch)
    }

    async fn poll(
        &self,
        watch: WatchId,
        version: &Version,
        max_wait: Duration,
    ) -> FeedResult<Option<UpdateSet>> {
        debug!(%watch, %version, ?max_wait, "Polling change feed");
        let update = self.feed.poll(watch, version, max_wait).await?;
        debug!("There is {} pending update", if update.is_none() { "no" } else { "an" });
        Ok(update)
    }

    /// Merge `update` and every truncated continuation on top of `base`
    async fn drain(
        &self,
        watch: WatchId,
        base: &Mirror,
        mut update: UpdateSet,
    ) -> Result<(Mirror, Version)> {
        let mut staged = base.clone();
        let mut followups = 0;

        loop {
            trace!(?update, "Merging change batch");
            merge_update_set(&mut staged, &update)?;

            if !update.truncated {
                return Ok((staged, update.version));
            }

            followups += 1;
            if followups > self.config.max_truncated_followups {
                return Err(MergeError::TruncationLimit {
                    limit: self.config.max_truncated_followups,
                }
                .into());
            }
            TRUNCATED_FOLLOWUPS.inc();
            debug!(version = %update.version, followups, "Change batch is truncated, polling for the remainder");

            let version = update.version;
            update = self
                .poll(watch, &version, Duration::ZERO)
                .await?
                .ok_or_else(|| MergeError::MissingContinuation {
                    version: version.as_str().to_string(),
                })?;
        }
    }

    async fn recover(
        &mut self,
        e: Error,
    ) -> Result<bool> {
        match e {
            Error::Merge(e) => {
                MERGE_FAILURES.inc();
                warn!(error = %e, "Could not merge change batch, resynchronizing");
                self.resync(ResyncReason::MergeFailure).await
            }
            Error::Feed(e) if e.is_invalid_version() => {
                error!(version = %self.version, "Collector version is out of date or invalid");
                self.resync(ResyncReason::InvalidVersion).await
            }
            e => Err(e),
        }
    }

    /// Drop the mirror and rebuild it from a full batch at the initial version
    async fn resync(
        &mut self,
        reason: ResyncReason,
    ) -> Result<bool> {
        RESYNCS.with_label_values(&[reason.as_str()]).inc();
        warn!(reason = reason.as_str(), "Resetting cache of {:?}", self);

        self.version = Version::initial();
        self.mirror = Arc::new(Mirror::new());
        self.stale = false;
        self.publish_size();

        let watch = self.ensure_watch().await?;
        let empty = Mirror::new();
        let initial = Version::initial();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match self.poll(watch, &initial, Duration::ZERO).await {
                Ok(Some(update)) => self.drain(watch, &empty, update).await,
                Ok(None) => {
                    debug!("No object matches the selector");
                    return Ok(true);
                }
                Err(e) => Err(e.into()),
            };

            let e = match result {
                Ok((mirror, version)) => {
                    self.commit(mirror, version);
                    return Ok(true);
                }
                Err(e) => e,
            };

            let recoverable = match &e {
                Error::Merge(_) => {
                    MERGE_FAILURES.inc();
                    true
                }
                Error::Feed(f) => f.is_invalid_version(),
                _ => false,
            };
            if !recoverable || attempt >= self.config.max_resync_attempts {
                error!(attempt, error = %e, "Resynchronization failed");
                self.stale = true;
                return Err(e);
            }
            warn!(attempt, error = %e, "Resynchronization failed, retrying");
        }
    }

    fn commit(
        &mut self,
        mirror: Mirror,
        version: Version,
    ) {
        MERGED_BATCHES.inc();
        self.mirror = Arc::new(mirror);
        self.version = version;
        self.publish_size();
        debug!(objects = self.mirror.len(), "Cache of {:?} is updated", self);
        trace!(mirror = ?self.mirror, "Updated cache after merge");
    }

    /// Engines of the same kind add up in the gauge
    fn publish_size(&mut self) {
        let size = self.mirror.len() as i64;
        MIRROR_OBJECTS
            .with_label_values(&[self.selector.kind().as_str()])
            .add(size - self.published_size);
        self.published_size = size;
    }
}

async fn release<F: ChangeFeed>(
    feed: &F,
    watch: WatchId,
) -> Result<()> {
    match feed.destroy_watch(watch).await {
        Ok(()) => {
            debug!(%watch, "Released watch");
            Ok(())
        }
        Err(FeedError::SessionEnded) => {
            debug!(%watch, "Remote session already ended, watch presumed released");
            Ok(())
        }
        Err(source) => {
            error!(%watch, error = %source, "Failed to release watch");
            Err(Error::Release { watch, source })
        }
    }
}

impl<F: ChangeFeed> fmt::Debug for CacheEngine<F> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("CacheEngine")
            .field("object_type", self.selector.kind())
            .field("properties", &self.selector.paths())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl<F: ChangeFeed> Drop for CacheEngine<F> {
    fn drop(&mut self) {
        MIRROR_OBJECTS
            .with_label_values(&[self.selector.kind().as_str()])
            .sub(self.published_size);

        let Some(watch) = self.watch.take() else {
            return;
        };
        if !self.config.release_on_drop {
            warn!(%watch, "Engine dropped without close, watch left on the server");
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let feed = Arc::clone(&self.feed);
                handle.spawn(async move {
                    if let Err(e) = release(feed.as_ref(), watch).await {
                        error!(error = %e, "Releasing watch of dropped engine failed");
                    }
                });
            }
            Err(_) => warn!(%watch, "Engine dropped outside a runtime, watch left on the server"),
        }
    }
}
