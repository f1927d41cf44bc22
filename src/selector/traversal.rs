use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::model::ManagedObjectKind;
use crate::SelectorError;

/// One named hop of a server-side traversal: from objects of `kind`, follow
/// the reference property `path`, then continue with the steps in `select`.
///
/// A step may select itself to express "recurse through containers of the
/// same kind"; the server stops when it meets an object it already visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStep {
    pub name: String,
    pub kind: ManagedObjectKind,
    pub path: String,
    #[serde(default)]
    pub select: Vec<String>,
}

impl TraversalStep {
    /// Step named after what it does, e.g. `Folder.childEntity`
    pub fn new(
        kind: ManagedObjectKind,
        path: impl Into<String>,
    ) -> Self {
        let path = path.into();
        Self {
            name: format!("{kind}.{path}"),
            kind,
            path,
            select: Vec::new(),
        }
    }

    pub fn named(
        name: impl Into<String>,
        kind: ManagedObjectKind,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            path: path.into(),
            select: Vec::new(),
        }
    }

    pub fn selecting<I, S>(
        mut self,
        names: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Validated set of traversal steps.
///
/// Steps reference each other by name; construction checks that names are
/// unique and every referenced name exists so the graph never depends on
/// late binding at the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<TraversalStep>", into = "Vec<TraversalStep>")]
pub struct TraversalGraph {
    steps: Vec<TraversalStep>,
}

impl TraversalGraph {
    pub fn new(steps: Vec<TraversalStep>) -> Result<Self, SelectorError> {
        let mut names = HashSet::with_capacity(steps.len());
        for step in &steps {
            if !names.insert(step.name.as_str()) {
                return Err(SelectorError::DuplicateStep(step.name.clone()));
            }
        }
        for step in &steps {
            if let Some(missing) = step.select.iter().find(|to| !names.contains(to.as_str())) {
                return Err(SelectorError::UnknownStep {
                    from: step.name.clone(),
                    to: missing.clone(),
                });
            }
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[TraversalStep] {
        &self.steps
    }

    pub fn step(
        &self,
        name: &str,
    ) -> Option<&TraversalStep> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps reachable from `start`, in breadth-first order, each listed once
    pub fn reachable_from(
        &self,
        start: &str,
    ) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = std::collections::VecDeque::from([start]);
        while let Some(name) = queue.pop_front() {
            let Some(step) = self.step(name) else { continue };
            if !seen.insert(step.name.as_str()) {
                continue;
            }
            order.push(step.name.as_str());
            queue.extend(step.select.iter().map(String::as_str));
        }
        order
    }
}

impl TryFrom<Vec<TraversalStep>> for TraversalGraph {
    type Error = SelectorError;

    fn try_from(steps: Vec<TraversalStep>) -> Result<Self, Self::Error> {
        TraversalGraph::new(steps)
    }
}

impl From<TraversalGraph> for Vec<TraversalStep> {
    fn from(graph: TraversalGraph) -> Self {
        graph.steps
    }
}
