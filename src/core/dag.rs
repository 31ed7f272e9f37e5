//! Task dependency graph.
//!
//! `TaskGraph` stores task definitions in a petgraph `DiGraph`, with an
//! edge from each dependency to the task that needs it. It is used both to
//! validate scenario plans and to decide which tasks may run next.

use crate::core::task::{TaskDefinition, TaskId};
use crate::error::{Error, Result};
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

pub struct TaskGraph {
    graph: DiGraph<TaskDefinition, ()>,
    /// Lookup from task id to node.
    index: HashMap<TaskId, NodeIndex>,
    /// Insertion order, which is also the order ready tasks are reported in.
    order: Vec<TaskId>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Build a graph from definitions in plan order.
    ///
    /// Each dependency must name a task defined earlier in the list.
    ///
    /// # Errors
    /// `DuplicateTask` for a repeated id, `UnknownDependency` for a missing
    /// or forward reference.
    pub fn from_definitions<'a, I>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a TaskDefinition>,
    {
        let mut graph = Self::new();
        for definition in definitions {
            for dep in &definition.dependencies {
                if !graph.contains(dep) {
                    return Err(Error::UnknownDependency {
                        task: definition.id.to_string(),
                        dependency: dep.to_string(),
                    });
                }
            }
            graph.add_task(definition.clone())?;
            for dep in &definition.dependencies {
                graph.add_dependency(dep, &definition.id)?;
            }
        }
        Ok(graph)
    }

    /// Add a task node. Dependencies are not wired; see `add_dependency`.
    pub fn add_task(&mut self, definition: TaskDefinition) -> Result<NodeIndex> {
        if self.index.contains_key(&definition.id) {
            return Err(Error::DuplicateTask(definition.id.to_string()));
        }
        let id = definition.id.clone();
        let node = self.graph.add_node(definition);
        self.index.insert(id.clone(), node);
        self.order.push(id);
        Ok(node)
    }

    /// Record that `from` must finish before `to` starts.
    ///
    /// # Errors
    /// `UnknownDependency` if either task is missing, `Configuration` if
    /// the edge would close a cycle.
    pub fn add_dependency(&mut self, from: &TaskId, to: &TaskId) -> Result<()> {
        let to_node = self.node(to).ok_or_else(|| Error::UnknownDependency {
            task: from.to_string(),
            dependency: to.to_string(),
        })?;
        let from_node = self.node(from).ok_or_else(|| Error::UnknownDependency {
            task: to.to_string(),
            dependency: from.to_string(),
        })?;

        if self.graph.find_edge(from_node, to_node).is_some() {
            return Ok(());
        }

        let edge = self.graph.add_edge(from_node, to_node, ());
        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(Error::config(format!(
                "dependency {} -> {} would create a cycle",
                from, to
            )));
        }
        Ok(())
    }

    fn node(&self, id: &TaskId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &TaskId) -> Option<&TaskDefinition> {
        self.node(id).and_then(|n| self.graph.node_weight(n))
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Direct dependencies of a task.
    pub fn dependencies_of(&self, id: &TaskId) -> Vec<&TaskId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Tasks that directly depend on `id`.
    pub fn dependents_of(&self, id: &TaskId) -> Vec<&TaskId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &TaskId, direction: Direction) -> Vec<&TaskId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let mut found: Vec<&TaskId> = self
            .graph
            .neighbors_directed(node, direction)
            .filter_map(|n| self.graph.node_weight(n))
            .map(|t| &t.id)
            .collect();
        // petgraph yields neighbors newest-edge first
        found.sort_by_key(|id| self.position(id));
        found
    }

    fn position(&self, id: &TaskId) -> usize {
        self.order.iter().position(|o| o == id).unwrap_or(usize::MAX)
    }

    /// Every task reachable from `id` through dependent edges, in plan order.
    pub fn transitive_dependents(&self, id: &TaskId) -> Vec<TaskId> {
        let Some(start) = self.node(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        let mut result: Vec<TaskId> = seen
            .into_iter()
            .filter_map(|n| self.graph.node_weight(n))
            .map(|t| t.id.clone())
            .collect();
        result.sort_by_key(|id| self.position(id));
        result
    }

    /// Tasks whose dependencies are all in `completed` and that are
    /// neither completed nor in `excluded`, in plan order.
    pub fn ready_tasks(
        &self,
        completed: &HashSet<TaskId>,
        excluded: &HashSet<TaskId>,
    ) -> Vec<&TaskDefinition> {
        self.order
            .iter()
            .filter(|id| !completed.contains(*id) && !excluded.contains(*id))
            .filter_map(|id| self.get(id))
            .filter(|task| {
                self.dependencies_of(&task.id)
                    .iter()
                    .all(|dep| completed.contains(*dep))
            })
            .collect()
    }

    /// Tasks ordered so that each comes after its dependencies.
    pub fn topological_order(&self) -> Result<Vec<&TaskDefinition>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            let id = self
                .graph
                .node_weight(cycle.node_id())
                .map(|t| t.id.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            Error::config(format!("cycle detected at task {}", id))
        })?;
        Ok(sorted
            .into_iter()
            .filter_map(|n| self.graph.node_weight(n))
            .collect())
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}
