//! Property Synchronization Error Hierarchy
//!
//! Callers of the collector only ever observe [`Error::Feed`] (a transient
//! poll failure), [`Error::Release`] on teardown, or configuration problems.
//! Cache-consistency problems ([`FeedError::InvalidVersion`], [`MergeError`])
//! are healed internally by resetting and resynchronizing the mirror.

use std::time::Duration;

use config::ConfigError;

use crate::feed::WatchId;
use crate::model::ObjectRef;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by [`crate::ChangeFeed`] implementations
pub type FeedResult<T> = std::result::Result<T, FeedError>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Change feed failures that the engine does not retry
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Batch could not be merged and every resynchronization attempt failed too
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Releasing the server-side watch failed for a reason other than an ended session
    #[error("Failed to release watch {watch}: {source}")]
    Release {
        watch: WatchId,
        #[source]
        source: FeedError,
    },

    /// Traversal graph validation failures
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// Malformed dotted/bracketed property path
    #[error(transparent)]
    Path(#[from] PathError),

    /// Collector settings loading/validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Settings loaded fine but violate a collector rule
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Errors reported by the remote change feed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// Server no longer recognises the version token
    #[error("Collector version {version:?} is out of date or invalid")]
    InvalidVersion { version: String },

    /// Poll did not complete in time
    #[error("Poll timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Remote session is gone (logged out, expired)
    #[error("Remote session has ended")]
    SessionEnded,

    /// Any other network/transport failure
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl FeedError {
    pub fn is_invalid_version(&self) -> bool {
        matches!(self, FeedError::InvalidVersion { .. })
    }
}

/// A change batch that cannot be applied to the mirror
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    #[error("Modify update for {0} which is not in the cache")]
    UnknownObject(ObjectRef),

    #[error("No cached property is a prefix of {path}")]
    UnknownProperty { path: String },

    #[error("Segment {segment} of {path} does not resolve")]
    UnresolvedSegment { path: String, segment: String },

    #[error("Segment {segment} of {path} expects a {expected}")]
    TypeMismatch {
        path: String,
        segment: String,
        expected: &'static str,
    },

    #[error("{op} on {path} carries no value")]
    MissingValue { op: &'static str, path: String },

    #[error("{op} on {path} must address an element below a cached property")]
    InvalidTarget { op: &'static str, path: String },

    #[error("Truncated update at version {version:?} has no continuation")]
    MissingContinuation { version: String },

    #[error("Truncated update exceeded {limit} follow-up polls")]
    TruncationLimit { limit: usize },

    #[error(transparent)]
    Path(#[from] PathError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("Property path is empty")]
    Empty,

    #[error("Unexpected {found:?} at offset {offset} in {path}")]
    UnexpectedChar {
        path: String,
        offset: usize,
        found: char,
    },

    #[error("Unterminated element key starting at offset {offset} in {path}")]
    UnterminatedKey { path: String, offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("Traversal step {0} is declared more than once")]
    DuplicateStep(String),

    #[error("Traversal step {from} selects unknown step {to}")]
    UnknownStep { from: String, to: String },

    #[error("Selector observes no objects")]
    EmptyObjectSet,
}
