use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::INITIAL_VERSION;

/// Opaque cursor handed out by the change feed.
///
/// The only comparisons the engine makes are "is this the initial version"
/// and equality with the last token it stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// The sentinel asking the feed for a full snapshot
    pub fn initial() -> Self {
        Self(INITIAL_VERSION.to_string())
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn is_initial(&self) -> bool {
        self.0 == INITIAL_VERSION
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for Version {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<&str> for Version {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}
