//! Data model of the local mirror
//!
//! - [`ObjectRef`] - stable identity of one remote object, the mirror key
//! - [`Version`] - opaque change-feed cursor
//! - [`PropertyValue`] / [`PropertyBag`] - the cached attributes of one object
//! - [`Mirror`] - every observed object and its property bag

mod object_ref;
mod path;
mod value;
mod version;

pub use object_ref::*;
pub use path::*;
pub use value::*;
pub use version::*;


use std::collections::BTreeMap;
use std::sync::Arc;

/// Local mirror of the observed remote objects.
///
/// Bags are shared behind [`Arc`] so a snapshot handed to a caller is never
/// mutated by a later merge: the engine copies a bag before editing it
/// whenever a snapshot still holds it.
pub type Mirror = BTreeMap<ObjectRef, Arc<PropertyBag>>;
