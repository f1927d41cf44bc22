use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Type of a remote managed object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ManagedObjectKind {
    Folder,
    Datacenter,
    ComputeResource,
    ClusterComputeResource,
    ResourcePool,
    HostSystem,
    VirtualMachine,
    VirtualApp,
    Datastore,
    Network,
    ContainerView,
    Task,
    /// Any kind the crate has no dedicated traversal knowledge about
    Other(String),
}

impl ManagedObjectKind {
    pub fn as_str(&self) -> &str {
        match self {
            ManagedObjectKind::Folder => "Folder",
            ManagedObjectKind::Datacenter => "Datacenter",
            ManagedObjectKind::ComputeResource => "ComputeResource",
            ManagedObjectKind::ClusterComputeResource => "ClusterComputeResource",
            ManagedObjectKind::ResourcePool => "ResourcePool",
            ManagedObjectKind::HostSystem => "HostSystem",
            ManagedObjectKind::VirtualMachine => "VirtualMachine",
            ManagedObjectKind::VirtualApp => "VirtualApp",
            ManagedObjectKind::Datastore => "Datastore",
            ManagedObjectKind::Network => "Network",
            ManagedObjectKind::ContainerView => "ContainerView",
            ManagedObjectKind::Task => "Task",
            ManagedObjectKind::Other(name) => name,
        }
    }
}

impl From<&str> for ManagedObjectKind {
    fn from(name: &str) -> Self {
        // Strip a namespace prefix such as "vim."
        let name = name.rsplit('.').next().unwrap_or(name);
        match name {
            "Folder" => ManagedObjectKind::Folder,
            "Datacenter" => ManagedObjectKind::Datacenter,
            "ComputeResource" => ManagedObjectKind::ComputeResource,
            "ClusterComputeResource" => ManagedObjectKind::ClusterComputeResource,
            "ResourcePool" => ManagedObjectKind::ResourcePool,
            "HostSystem" => ManagedObjectKind::HostSystem,
            "VirtualMachine" => ManagedObjectKind::VirtualMachine,
            "VirtualApp" => ManagedObjectKind::VirtualApp,
            "Datastore" => ManagedObjectKind::Datastore,
            "Network" => ManagedObjectKind::Network,
            "ContainerView" => ManagedObjectKind::ContainerView,
            "Task" => ManagedObjectKind::Task,
            other => ManagedObjectKind::Other(other.to_string()),
        }
    }
}

impl From<String> for ManagedObjectKind {
    fn from(name: String) -> Self {
        ManagedObjectKind::from(name.as_str())
    }
}

impl From<ManagedObjectKind> for String {
    fn from(kind: ManagedObjectKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ManagedObjectKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of one remote object.
///
/// Text form is `<Kind>:<id>`, with `@<server>` appended when the reference
/// is scoped to a server instance, e.g. `HostSystem:host-12@a1b2`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ManagedObjectKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_guid: Option<String>,
}

impl ObjectRef {
    pub fn new(
        kind: impl Into<ManagedObjectKind>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            server_guid: None,
        }
    }

    /// Scope this reference to one server instance
    pub fn with_server(
        mut self,
        server_guid: impl Into<String>,
    ) -> Self {
        self.server_guid = Some(server_guid.into());
        self
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)?;
        if let Some(server) = &self.server_guid {
            write!(f, "@{server}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed object reference {0:?}, expected <Kind>:<id>[@<server>]")]
pub struct ObjectRefParseError(pub String);

impl FromStr for ObjectRef {
    type Err = ObjectRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, server) = match s.rsplit_once('@') {
            Some((body, server)) if !server.is_empty() => (body, Some(server)),
            Some(_) => return Err(ObjectRefParseError(s.to_string())),
            None => (s, None),
        };
        let (kind, id) = body
            .split_once(':')
            .filter(|(kind, id)| !kind.is_empty() && !id.is_empty())
            .ok_or_else(|| ObjectRefParseError(s.to_string()))?;

        let mut reference = ObjectRef::new(kind, id);
        if let Some(server) = server {
            reference = reference.with_server(server);
        }
        Ok(reference)
    }
}
