use std::sync::Arc;

use tracing::debug;

use super::apply::apply_change;
use super::apply::remove;
use crate::feed::ChangeOp;
use crate::feed::ObjectUpdate;
use crate::feed::UpdateKind;
use crate::feed::UpdateSet;
use crate::model::Mirror;
use crate::model::PropertyBag;
use crate::model::PropertyValue;
use crate::MergeError;

/// Apply every object update of `update` to `mirror`, in batch order.
///
/// Stops at the first failing operation. Callers merge into a staged copy so
/// a failure never leaves a partially merged mirror behind.
pub(crate) fn merge_update_set(
    mirror: &mut Mirror,
    update: &UpdateSet,
) -> Result<(), MergeError> {
    for filter in &update.filter_set {
        for missing in &filter.missing_set {
            if mirror.remove(missing).is_some() {
                debug!(obj = %missing, "Removing object missing from the filter set");
            }
        }
        for object_update in &filter.object_set {
            merge_object_update(mirror, object_update)?;
        }
    }
    Ok(())
}

fn merge_object_update(
    mirror: &mut Mirror,
    update: &ObjectUpdate,
) -> Result<(), MergeError> {
    match update.kind {
        UpdateKind::Enter => {
            let bag: PropertyBag = update
                .change_set
                .iter()
                .filter(|change| matches!(change.op, ChangeOp::Add | ChangeOp::Assign))
                .map(|change| (change.name.clone(), change.val.clone().unwrap_or(PropertyValue::Null)))
                .collect();
            debug!(obj = %update.obj, properties = ?bag.keys().collect::<Vec<_>>(), "Replacing cached object");
            mirror.insert(update.obj.clone(), Arc::new(bag));
        }
        UpdateKind::Leave => {
            debug!(obj = %update.obj, "Removing object from cache");
            mirror.remove(&update.obj);
        }
        UpdateKind::Modify => {
            let shared = mirror
                .get_mut(&update.obj)
                .ok_or_else(|| MergeError::UnknownObject(update.obj.clone()))?;
            // Copies the bag if a snapshot still holds it
            let bag = Arc::make_mut(shared);
            for change in &update.change_set {
                debug!(obj = %update.obj, path = change.name.as_str(), op = change.op.as_str(), "Modifying property");
                apply_change(bag, change)?;
            }
            for missing in &update.missing_set {
                debug!(obj = %update.obj, path = missing.path.as_str(), "Removing property that has gone missing");
                remove(bag, &missing.path)?;
            }
        }
    }
    Ok(())
}
