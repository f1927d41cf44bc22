use serde::Deserialize;
use serde::Serialize;

use crate::model::ObjectRef;
use crate::model::PropertyValue;
use crate::model::Version;

/// One delta response from the change feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSet {
    pub version: Version,
    /// The server split this logical update; poll again at `version` before storing it
    #[serde(default)]
    pub truncated: bool,
    pub filter_set: Vec<FilterUpdate>,
}

/// Changes reported by one server-side filter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterUpdate {
    pub object_set: Vec<ObjectUpdate>,
    /// Objects that can no longer be observed and must be dropped
    #[serde(default)]
    pub missing_set: Vec<ObjectRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    /// Object entered the filter; the change set carries its full property bag
    Enter,
    /// Object left the filter
    Leave,
    /// Path-scoped edits to an object already in the mirror
    Modify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectUpdate {
    pub kind: UpdateKind,
    pub obj: ObjectRef,
    #[serde(default)]
    pub change_set: Vec<PropertyChange>,
    /// Properties the server could not read; dropped like removals
    #[serde(default)]
    pub missing_set: Vec<MissingProperty>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeOp {
    Add,
    Assign,
    Remove,
    IndirectRemove,
}

impl ChangeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOp::Add => "add",
            ChangeOp::Assign => "assign",
            ChangeOp::Remove => "remove",
            ChangeOp::IndirectRemove => "indirectRemove",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub name: String,
    pub op: ChangeOp,
    #[serde(default)]
    pub val: Option<PropertyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingProperty {
    pub path: String,
    /// Server-side reason, informational only
    #[serde(default)]
    pub fault: Option<String>,
}

impl UpdateSet {
    pub fn new(version: impl Into<Version>) -> Self {
        Self {
            version: version.into(),
            truncated: false,
            filter_set: Vec::new(),
        }
    }

    pub fn truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    /// Append object updates as one filter update
    pub fn with_objects(
        mut self,
        objects: impl IntoIterator<Item = ObjectUpdate>,
    ) -> Self {
        self.filter_set.push(FilterUpdate {
            object_set: objects.into_iter().collect(),
            missing_set: Vec::new(),
        });
        self
    }

    /// Append a filter update dropping `objects`
    pub fn with_missing_objects(
        mut self,
        objects: impl IntoIterator<Item = ObjectRef>,
    ) -> Self {
        self.filter_set.push(FilterUpdate {
            object_set: Vec::new(),
            missing_set: objects.into_iter().collect(),
        });
        self
    }

    pub fn object_updates(&self) -> impl Iterator<Item = &ObjectUpdate> {
        self.filter_set.iter().flat_map(|f| f.object_set.iter())
    }
}

impl ObjectUpdate {
    pub fn enter<K: Into<String>>(
        obj: ObjectRef,
        properties: impl IntoIterator<Item = (K, PropertyValue)>,
    ) -> Self {
        Self {
            kind: UpdateKind::Enter,
            obj,
            change_set: properties
                .into_iter()
                .map(|(name, val)| PropertyChange::assign(name, val))
                .collect(),
            missing_set: Vec::new(),
        }
    }

    pub fn modify(
        obj: ObjectRef,
        changes: impl IntoIterator<Item = PropertyChange>,
    ) -> Self {
        Self {
            kind: UpdateKind::Modify,
            obj,
            change_set: changes.into_iter().collect(),
            missing_set: Vec::new(),
        }
    }

    pub fn leave(obj: ObjectRef) -> Self {
        Self {
            kind: UpdateKind::Leave,
            obj,
            change_set: Vec::new(),
            missing_set: Vec::new(),
        }
    }

    pub fn with_missing(
        mut self,
        path: impl Into<String>,
    ) -> Self {
        self.missing_set.push(MissingProperty {
            path: path.into(),
            fault: None,
        });
        self
    }
}

impl PropertyChange {
    pub fn add(
        name: impl Into<String>,
        val: impl Into<PropertyValue>,
    ) -> Self {
        Self {
            name: name.into(),
            op: ChangeOp::Add,
            val: Some(val.into()),
        }
    }

    pub fn assign(
        name: impl Into<String>,
        val: impl Into<PropertyValue>,
    ) -> Self {
        Self {
            name: name.into(),
            op: ChangeOp::Assign,
            val: Some(val.into()),
        }
    }

    pub fn remove(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: ChangeOp::Remove,
            val: None,
        }
    }

    pub fn indirect_remove(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: ChangeOp::IndirectRemove,
            val: None,
        }
    }
}
