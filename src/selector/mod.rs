//! Selector: which remote objects and which property paths are observed
//!
//! Three selection strategies are provided:
//! - [`Selector::full_hierarchy`] - walk every container from the root folder
//! - [`Selector::host_systems`] / [`Selector::virtual_machines`] - narrow
//!   traversals skipping branches that cannot lead to the target kind
//! - [`Selector::fixed_objects`] - an explicit list of references, no traversal

mod traversal;

pub use traversal::*;


use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONTAINER_VIEW_STEP;
use crate::constants::TASK_STATE_PATH;
use crate::constants::VISIT_FOLDERS_STEP;
use crate::model::ManagedObjectKind;
use crate::model::ObjectRef;
use crate::model::PropertyPath;
use crate::Result;
use crate::SelectorError;

/// Where the watched objects come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectSet {
    /// Recursive container view rooted at `root` (the root folder when
    /// `None`), expanded through `traversal` starting at the container step
    ContainerView {
        root: Option<ObjectRef>,
        kinds: Vec<ManagedObjectKind>,
        recursive: bool,
        traversal: TraversalGraph,
    },
    /// A known, finite set of objects
    Explicit(Vec<ObjectRef>),
}

/// Property paths observed on objects of one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub kind: ManagedObjectKind,
    pub paths: Vec<String>,
}

/// Declarative description of one watch, handed to [`crate::ChangeFeed::create_watch`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub object_set: ObjectSet,
    pub property_spec: PropertySpec,
    /// Ask the server for path-level modify updates instead of whole values
    pub partial_updates: bool,
}

impl Selector {
    /// Observe `kind` anywhere below the root folder
    pub fn full_hierarchy<S: Into<String>>(
        kind: ManagedObjectKind,
        paths: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        Self::container_view(kind, paths, full_traversal_steps())
    }

    /// Observe host systems, skipping virtual machine and resource pool branches
    pub fn host_systems<S: Into<String>>(paths: impl IntoIterator<Item = S>) -> Result<Self> {
        Self::container_view(ManagedObjectKind::HostSystem, paths, host_traversal_steps())
    }

    /// Observe virtual machines through datacenter VM folders only
    pub fn virtual_machines<S: Into<String>>(paths: impl IntoIterator<Item = S>) -> Result<Self> {
        Self::container_view(ManagedObjectKind::VirtualMachine, paths, vm_traversal_steps())
    }

    /// Observe exactly `objects`, e.g. a set of in-flight tasks
    pub fn fixed_objects<S: Into<String>>(
        kind: ManagedObjectKind,
        objects: Vec<ObjectRef>,
        paths: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        if objects.is_empty() {
            return Err(SelectorError::EmptyObjectSet.into());
        }
        Ok(Self {
            object_set: ObjectSet::Explicit(objects),
            property_spec: property_spec(kind, paths)?,
            partial_updates: true,
        })
    }

    /// Track the state of a set of tasks
    pub fn tasks(tasks: Vec<ObjectRef>) -> Result<Self> {
        Self::tasks_with_paths(tasks, [TASK_STATE_PATH])
    }

    pub fn tasks_with_paths<S: Into<String>>(
        tasks: Vec<ObjectRef>,
        paths: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        Self::fixed_objects(ManagedObjectKind::Task, tasks, paths)
    }

    fn container_view<S: Into<String>>(
        kind: ManagedObjectKind,
        paths: impl IntoIterator<Item = S>,
        mut steps: Vec<TraversalStep>,
    ) -> Result<Self> {
        let names: Vec<String> = steps.iter().map(|s| s.name.clone()).collect();
        steps.push(TraversalStep::named(CONTAINER_VIEW_STEP, ManagedObjectKind::ContainerView, "container").selecting(names));

        Ok(Self {
            object_set: ObjectSet::ContainerView {
                root: None,
                kinds: vec![kind.clone()],
                recursive: true,
                traversal: TraversalGraph::new(steps)?,
            },
            property_spec: property_spec(kind, paths)?,
            partial_updates: true,
        })
    }

    /// Root the container view at `root` instead of the root folder
    pub fn rooted_at(
        mut self,
        container: ObjectRef,
    ) -> Self {
        if let ObjectSet::ContainerView { root, .. } = &mut self.object_set {
            *root = Some(container);
        }
        self
    }

    pub fn kind(&self) -> &ManagedObjectKind {
        &self.property_spec.kind
    }

    pub fn paths(&self) -> &[String] {
        &self.property_spec.paths
    }

    pub fn traversal(&self) -> Option<&TraversalGraph> {
        match &self.object_set {
            ObjectSet::ContainerView { traversal, .. } => Some(traversal),
            ObjectSet::Explicit(_) => None,
        }
    }
}

fn property_spec<S: Into<String>>(
    kind: ManagedObjectKind,
    paths: impl IntoIterator<Item = S>,
) -> Result<PropertySpec> {
    let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
    for path in &paths {
        PropertyPath::parse(path)?;
    }
    Ok(PropertySpec { kind, paths })
}

/// Every container hop of the inventory: folders, datacenters, compute
/// resources, resource pools and hosts
fn full_traversal_steps() -> Vec<TraversalStep> {
    use ManagedObjectKind::*;

    vec![
        TraversalStep::named(VISIT_FOLDERS_STEP, Folder, "childEntity").selecting([
            VISIT_FOLDERS_STEP,
            "dcToHf",
            "dcToVmf",
            "crToH",
            "crToRp",
            "HToVm",
            "rpToVm",
        ]),
        TraversalStep::named("dcToVmf", Datacenter, "vmFolder").selecting([VISIT_FOLDERS_STEP]),
        TraversalStep::named("dcToHf", Datacenter, "hostFolder").selecting([VISIT_FOLDERS_STEP]),
        TraversalStep::named("crToH", ComputeResource, "host"),
        TraversalStep::named("crToRp", ComputeResource, "resourcePool").selecting(["rpToRp", "rpToVm"]),
        TraversalStep::named("rpToRp", ResourcePool, "resourcePool").selecting(["rpToRp", "rpToVm"]),
        TraversalStep::named("HToVm", HostSystem, "vm").selecting([VISIT_FOLDERS_STEP]),
        TraversalStep::named("rpToVm", ResourcePool, "vm"),
    ]
}

fn host_traversal_steps() -> Vec<TraversalStep> {
    use ManagedObjectKind::*;

    vec![
        TraversalStep::new(ClusterComputeResource, "host"),
        TraversalStep::new(ComputeResource, "host"),
        TraversalStep::new(Datacenter, "hostFolder").selecting(["Folder.childEntity"]),
        TraversalStep::new(Folder, "childEntity").selecting([
            "Datacenter.hostFolder",
            "ClusterComputeResource.host",
            "ComputeResource.host",
        ]),
    ]
}

fn vm_traversal_steps() -> Vec<TraversalStep> {
    use ManagedObjectKind::*;

    vec![
        TraversalStep::new(Datacenter, "vmFolder").selecting(["Folder.childEntity"]),
        TraversalStep::new(Folder, "childEntity").selecting(["Datacenter.vmFolder", "Folder.childEntity"]),
    ]
}
