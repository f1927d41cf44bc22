//! Path-scoped edits of one property bag
//!
//! A change path is resolved in two parts: the longest cached top-level path
//! that prefixes it picks the bag entry, and the remaining segments are walked
//! inside that entry's value. Edits are structural replacements on the
//! resolved container.

use tracing::debug;
use tracing::warn;

use crate::feed::ChangeOp;
use crate::feed::PropertyChange;
use crate::model::PathSegment;
use crate::model::PropertyBag;
use crate::model::PropertyPath;
use crate::model::PropertyValue;
use crate::MergeError;

pub(crate) fn apply_change(
    bag: &mut PropertyBag,
    change: &PropertyChange,
) -> Result<(), MergeError> {
    match change.op {
        ChangeOp::Add => add(bag, &change.name, change.val.clone()),
        ChangeOp::Assign => assign(bag, &change.name, change.val.clone()),
        ChangeOp::Remove | ChangeOp::IndirectRemove => remove(bag, &change.name),
    }
}

/// Insert `value` into the sequence addressed by `path`.
///
/// `path` names either the sequence itself (`devices`, `config.hardware.device`)
/// or the new element (`devices["c"]`), in which case the sequence is its parent.
pub(crate) fn add(
    bag: &mut PropertyBag,
    path: &str,
    value: Option<PropertyValue>,
) -> Result<(), MergeError> {
    let value = value.ok_or_else(|| MergeError::MissingValue {
        op: "add",
        path: path.to_string(),
    })?;
    let (entry, rest) = entry_point(bag, path).ok_or_else(|| MergeError::UnknownProperty { path: path.to_string() })?;
    let segments = if rest.is_empty() {
        Vec::new()
    } else {
        PropertyPath::parse(rest)?.segments().to_vec()
    };
    let list_path = match segments.split_last() {
        Some((PathSegment::Key(_), parents)) => parents,
        _ => &segments[..],
    };

    match resolve_container(bag, &entry, list_path, path)? {
        PropertyValue::List(items) => {
            debug!(path, kind = value.type_name(), "Appending element");
            items.push(value);
            Ok(())
        }
        _ => Err(MergeError::TypeMismatch {
            path: path.to_string(),
            segment: list_path.last().map_or(entry, ToString::to_string),
            expected: "list",
        }),
    }
}

/// Replace the value at `path`
pub(crate) fn assign(
    bag: &mut PropertyBag,
    path: &str,
    value: Option<PropertyValue>,
) -> Result<(), MergeError> {
    let value = value.unwrap_or(PropertyValue::Null);

    let Some((entry, rest)) = entry_point(bag, path) else {
        debug!(path, kind = value.type_name(), "Assigning new top-level property");
        bag.insert(path.to_string(), value);
        return Ok(());
    };
    if rest.is_empty() {
        debug!(path, kind = value.type_name(), "Replacing top-level property");
        bag.insert(entry, value);
        return Ok(());
    }

    let segments = nested_segments("assign", path, rest)?;
    let (last, parents) = split_last("assign", path, &segments)?;
    debug!(path, kind = value.type_name(), "Assigning {}", last);

    match (last, resolve_container(bag, &entry, parents, path)?) {
        (PathSegment::Field(name), PropertyValue::Record(fields)) => {
            fields.insert(name.clone(), value);
        }
        (PathSegment::Key(key), PropertyValue::List(items)) => match items.iter().position(|item| item.has_element_key(key)) {
            Some(i) => items[i] = value,
            None => items.push(value),
        },
        (PathSegment::Field(_), _) => return Err(type_mismatch(path, last, "record")),
        (PathSegment::Key(_), _) => return Err(type_mismatch(path, last, "list")),
    }
    Ok(())
}

/// Drop the property or sequence element addressed by `path`.
///
/// Removing something already absent is logged and ignored: the server may
/// report the removal of an element a previous update already dropped.
pub(crate) fn remove(
    bag: &mut PropertyBag,
    path: &str,
) -> Result<(), MergeError> {
    let Some((entry, rest)) = entry_point(bag, path) else {
        warn!(path, "No cached property to remove");
        return Ok(());
    };
    if rest.is_empty() {
        debug!(path, "Removing top-level property");
        bag.remove(&entry);
        return Ok(());
    }

    let segments = nested_segments("remove", path, rest)?;
    let (last, parents) = split_last("remove", path, &segments)?;

    match (last, resolve_container(bag, &entry, parents, path)?) {
        (PathSegment::Key(key), PropertyValue::List(items)) => match items.iter().position(|item| item.has_element_key(key)) {
            Some(i) => {
                debug!(path, key = key.as_str(), "Removing element");
                items.remove(i);
            }
            None => warn!(path, key = key.as_str(), len = items.len(), "No item with key in list"),
        },
        (PathSegment::Field(name), PropertyValue::Record(fields)) => {
            if fields.remove(name).is_none() {
                warn!(path, field = name.as_str(), "No field to remove");
            }
        }
        (PathSegment::Key(_), _) => return Err(type_mismatch(path, last, "list")),
        (PathSegment::Field(_), _) => return Err(type_mismatch(path, last, "record")),
    }
    Ok(())
}

/// Longest cached top-level path that prefixes `path` on a segment boundary,
/// with the remainder of `path` below it
fn entry_point<'p>(
    bag: &PropertyBag,
    path: &'p str,
) -> Option<(String, &'p str)> {
    bag.keys()
        .filter_map(|key| {
            let rest = path.strip_prefix(key.as_str())?;
            if rest.is_empty() || rest.starts_with('[') {
                Some((key, rest))
            } else {
                rest.strip_prefix('.').filter(|r| !r.is_empty()).map(|r| (key, r))
            }
        })
        .max_by_key(|(key, _)| key.len())
        .map(|(key, rest)| (key.clone(), rest))
}

fn nested_segments(
    op: &'static str,
    path: &str,
    rest: &str,
) -> Result<Vec<PathSegment>, MergeError> {
    if rest.is_empty() {
        return Err(MergeError::InvalidTarget {
            op,
            path: path.to_string(),
        });
    }
    Ok(PropertyPath::parse(rest)?.segments().to_vec())
}

fn split_last<'s>(
    op: &'static str,
    path: &str,
    segments: &'s [PathSegment],
) -> Result<(&'s PathSegment, &'s [PathSegment]), MergeError> {
    segments.split_last().ok_or_else(|| MergeError::InvalidTarget {
        op,
        path: path.to_string(),
    })
}

/// Walk `parents` below the bag entry `entry`
fn resolve_container<'b>(
    bag: &'b mut PropertyBag,
    entry: &str,
    parents: &[PathSegment],
    path: &str,
) -> Result<&'b mut PropertyValue, MergeError> {
    let root = bag.get_mut(entry).ok_or_else(|| MergeError::UnknownProperty { path: path.to_string() })?;
    walk_mut(root, parents, path)
}

fn walk_mut<'v>(
    mut value: &'v mut PropertyValue,
    segments: &[PathSegment],
    path: &str,
) -> Result<&'v mut PropertyValue, MergeError> {
    for segment in segments {
        value = match (segment, value) {
            (PathSegment::Field(name), PropertyValue::Record(fields)) => fields.get_mut(name),
            (PathSegment::Key(key), PropertyValue::List(items)) => items.iter_mut().find(|item| item.has_element_key(key)),
            (PathSegment::Field(_), _) => return Err(type_mismatch(path, segment, "record")),
            (PathSegment::Key(_), _) => return Err(type_mismatch(path, segment, "list")),
        }
        .ok_or_else(|| MergeError::UnresolvedSegment {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;
    }
    Ok(value)
}

fn type_mismatch(
    path: &str,
    segment: &PathSegment,
    expected: &'static str,
) -> MergeError {
    MergeError::TypeMismatch {
        path: path.to_string(),
        segment: segment.to_string(),
        expected,
    }
}
