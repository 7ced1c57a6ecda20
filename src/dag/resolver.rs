// src/dag/resolver.rs

//! Static analysis of a frozen [`TaskGraph`].

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::graph::TaskGraph;
use crate::dag::spec::{TaskId, TaskSpec};

/// Adjacency, indegree and dynamic-only closure derived from a graph.
///
/// Everything here is computed once in [`DependencyResolver::build`] and is
/// read-only afterwards; per-run mutation lives in
/// [`RunState`](crate::dag::RunState).
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    graph: TaskGraph,
    /// Static successors (tasks listing the key in their `deps`).
    successors: HashMap<TaskId, Vec<TaskId>>,
    indegree: HashMap<TaskId, usize>,
    dynamic_only: BTreeSet<TaskId>,
}

impl DependencyResolver {
    pub fn build(graph: &TaskGraph) -> Self {
        let mut successors: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        let mut indegree: HashMap<TaskId, usize> = HashMap::new();

        for task in graph.tasks() {
            successors.entry(task.id.clone()).or_default();
            indegree.insert(task.id.clone(), task.deps.len());
        }

        // Walk tasks in declaration order so successor lists are too.
        for task in graph.tasks() {
            for dep in task.deps.iter() {
                successors
                    .entry(dep.clone())
                    .or_default()
                    .push(task.id.clone());
            }
        }

        let dynamic_only = dynamic_only_closure(graph);
        debug!(
            tasks = graph.len(),
            dynamic_only = dynamic_only.len(),
            "resolver: built adjacency and dynamic-only closure"
        );

        Self {
            graph: graph.clone(),
            successors,
            indegree,
            dynamic_only,
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskSpec> {
        self.graph.tasks()
    }

    pub fn task_of(&self, id: &str) -> Option<&TaskSpec> {
        self.graph.task(id)
    }

    /// Static successors of `id`, in declaration order.
    pub fn successors(&self, id: &str) -> &[TaskId] {
        self.successors
            .get(id)
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }

    pub fn indegree(&self, id: &str) -> usize {
        self.indegree.get(id).copied().unwrap_or(0)
    }

    pub fn is_dynamic_only(&self, id: &str) -> bool {
        self.dynamic_only.contains(id)
    }

    pub fn dynamic_only(&self) -> &BTreeSet<TaskId> {
        &self.dynamic_only
    }

    /// Tasks with no static predecessors that are not dynamic-only.
    pub fn initial_ready(&self) -> Vec<TaskId> {
        self.graph
            .tasks()
            .filter(|t| self.indegree(&t.id) == 0 && !self.is_dynamic_only(&t.id))
            .map(|t| t.id.clone())
            .collect()
    }

    /// Groups of tasks that form cycles in the static `deps` subgraph.
    ///
    /// Each group is sorted; groups come back sorted by their first member.
    pub fn static_cycles(&self) -> Vec<Vec<TaskId>> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for task in self.graph.tasks() {
            graph.add_node(task.id.as_str());
        }
        for task in self.graph.tasks() {
            for dep in task.deps.iter() {
                graph.add_edge(dep.as_str(), task.id.as_str(), ());
            }
        }

        let mut cycles: Vec<Vec<TaskId>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut members: Vec<TaskId> = scc.into_iter().map(str::to_string).collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();
        cycles
    }
}

/// Ids reachable only through `dynamic_spawns` edges.
///
/// Seeded with every spawn target, then grown with any task whose `deps`
/// are non-empty and all already in the set, until nothing changes.
pub fn dynamic_only_closure(graph: &TaskGraph) -> BTreeSet<TaskId> {
    let mut set: BTreeSet<TaskId> = graph
        .tasks()
        .flat_map(|t| t.dynamic_spawns.values().cloned())
        .collect();

    loop {
        let additions: Vec<TaskId> = graph
            .tasks()
            .filter(|t| {
                !set.contains(&t.id)
                    && !t.deps.is_empty()
                    && t.deps.iter().all(|d| set.contains(d))
            })
            .map(|t| t.id.clone())
            .collect();

        if additions.is_empty() {
            break;
        }
        set.extend(additions);
    }

    set
}
