use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Tunables of one property collector
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Consecutive reset-and-resync attempts before a merge failure is surfaced
    #[serde(default = "default_max_resync_attempts")]
    pub max_resync_attempts: usize,

    /// Upper bound on follow-up polls for one truncated update
    #[serde(default = "default_max_truncated_followups")]
    pub max_truncated_followups: usize,

    /// Wait used by `wait_for_updates_default` (unit: milliseconds)
    #[serde(default)]
    pub default_wait_ms: u64,

    /// Release the server-side watch on the ambient runtime when the
    /// engine is dropped without being closed
    #[serde(default = "default_release_on_drop")]
    pub release_on_drop: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_resync_attempts: default_max_resync_attempts(),
            max_truncated_followups: default_max_truncated_followups(),
            default_wait_ms: 0,
            release_on_drop: default_release_on_drop(),
        }
    }
}

impl CollectorConfig {
    /// # Errors
    /// Returns `Error::InvalidConfig` if any rule is violated
    pub fn validate(&self) -> Result<()> {
        if self.max_resync_attempts == 0 {
            return Err(Error::InvalidConfig(
                "max_resync_attempts must be at least 1".into(),
            ));
        }
        if self.max_truncated_followups == 0 {
            return Err(Error::InvalidConfig(
                "max_truncated_followups must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_wait_ms)
    }
}

fn default_max_resync_attempts() -> usize {
    3
}
fn default_max_truncated_followups() -> usize {
    64
}
fn default_release_on_drop() -> bool {
    true
}
