use std::sync::Arc;
use std::time::Duration;

use super::PropertyCollector;
use crate::config::CollectorConfig;
use crate::feed::ChangeFeed;
use crate::selector::Selector;
use crate::Result;

pub struct CollectorBuilder<F: ChangeFeed> {
    feed: Arc<F>,
    selector: Selector,
    config: CollectorConfig,
}

impl<F: ChangeFeed> CollectorBuilder<F> {
    /// Create a new builder with default config
    pub fn new(
        feed: Arc<F>,
        selector: Selector,
    ) -> Self {
        Self {
            feed,
            selector,
            config: CollectorConfig::default(),
        }
    }

    /// Set resync attempts before a merge failure surfaces (default: 3)
    pub fn max_resync_attempts(
        mut self,
        attempts: usize,
    ) -> Self {
        self.config.max_resync_attempts = attempts;
        self
    }

    /// Set the bound on truncated continuations (default: 64)
    pub fn max_truncated_followups(
        mut self,
        followups: usize,
    ) -> Self {
        self.config.max_truncated_followups = followups;
        self
    }

    /// Set the wait of [`PropertyCollector::wait_for_updates_default`] (default: 0)
    pub fn default_wait(
        mut self,
        wait: Duration,
    ) -> Self {
        self.config.default_wait_ms = wait.as_millis() as u64;
        self
    }

    /// Completely replaces the default configuration
    ///
    /// # Warning: Configuration Override
    /// This will discard all previous settings configured through individual
    /// methods like [`max_resync_attempts`](CollectorBuilder::max_resync_attempts).
    pub fn set_config(
        mut self,
        config: CollectorConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Build the collector with current configuration
    pub fn build(self) -> Result<PropertyCollector<F>> {
        self.config.validate()?;
        Ok(PropertyCollector::with_config(self.feed, self.selector, self.config))
    }
}
