//! Cache merge engine
//!
//! - [`CacheEngine`] - owns the mirror, the version token and the watch
//! - `merge` - applies one change batch (enter / leave / modify) to a mirror
//! - `apply` - resolves dotted/bracketed paths and edits nested values

mod apply;
mod engine;
mod merge;

pub use engine::*;
#[cfg(test)]
pub(crate) use merge::merge_update_set;
