use std::sync::Arc;

use crate::model::ManagedObjectKind;
use crate::model::Mirror;
use crate::model::ObjectRef;
use crate::model::PropertyBag;
use crate::model::PropertyValue;
use crate::selector::Selector;

pub fn vm(id: &str) -> ObjectRef {
    ObjectRef::new("VM", id)
}

pub fn vm_selector(paths: &[&str]) -> Selector {
    Selector::full_hierarchy(ManagedObjectKind::Other("VM".into()), paths.iter().copied()).expect("valid selector")
}

pub fn bag<K: Into<String>>(properties: impl IntoIterator<Item = (K, PropertyValue)>) -> PropertyBag {
    properties.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

pub fn mirror<K: Into<String>>(objects: impl IntoIterator<Item = (ObjectRef, Vec<(K, PropertyValue)>)>) -> Mirror {
    objects
        .into_iter()
        .map(|(obj, properties)| (obj, Arc::new(bag(properties))))
        .collect()
}

/// Sequence element carrying a synthetic key
pub fn keyed(
    key: &str,
    label: &str,
) -> PropertyValue {
    PropertyValue::record([("key", PropertyValue::from(key)), ("label", PropertyValue::from(label))])
}

/// `config.hardware` record holding a device list, as hosts/VMs report it
pub fn hardware(devices: Vec<PropertyValue>) -> PropertyValue {
    PropertyValue::record([
        ("memoryMB", PropertyValue::Int(4096)),
        ("device", PropertyValue::List(devices)),
    ])
}
