// src/workflow/builder.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dag::{BranchLabel, TaskGraph, TaskId, TaskSpec};
use crate::engine::context::{BranchSelection, ExecutionContext};
use crate::errors::{BranchdagError, Result};
use crate::exec::{BodyRef, FunctionRegistry, branching_fn, noop};
use crate::types::{BranchDiscipline, Constraint};

/// Programmatic workflow builder.
///
/// Allocates task ids, registers bodies in its [`FunctionRegistry`] under
/// each task's name, and records static links and dynamic branches. Call
/// [`Workflow::build`] to freeze the result into a [`TaskGraph`].
pub struct Workflow {
    name: String,
    registry: FunctionRegistry,
    tasks: Vec<TaskSpec>,
    index: HashMap<TaskId, usize>,
    /// Branch key -> task created for it, so activators sharing a branch
    /// share the task.
    branch_tasks: HashMap<String, TaskId>,
    next_id: usize,
    noop: BodyRef,
}

/// Ids produced by [`Workflow::map_reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapReduce {
    pub initiator: TaskId,
    pub mappers: Vec<TaskId>,
    pub reducer: TaskId,
}

enum BranchTarget {
    Body(BodyRef),
    Task(TaskId),
}

/// Declaration of a single task, finished with [`TaskBuilder::add`].
#[must_use = "a task is only added to the workflow by calling `add()`"]
pub struct TaskBuilder<'w> {
    wf: &'w mut Workflow,
    name: String,
    body: BodyRef,
    params: toml::Table,
    constraints: Vec<Constraint>,
    after: Vec<TaskId>,
    branches: Vec<(BranchLabel, BranchTarget)>,
    discipline: BranchDiscipline,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_registry(name, FunctionRegistry::new())
    }

    /// Build on top of an existing registry, e.g. one shared by several
    /// workflows.
    pub fn with_registry(name: impl Into<String>, registry: FunctionRegistry) -> Self {
        Self {
            name: name.into(),
            registry,
            tasks: Vec::new(),
            index: HashMap::new(),
            branch_tasks: HashMap::new(),
            next_id: 0,
            noop: noop(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn spec(&self, id: &str) -> Option<&TaskSpec> {
        self.index.get(id).map(|&pos| &self.tasks[pos])
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Declare a plain task whose body is registered under `name`.
    pub fn task(&mut self, name: impl Into<String>, body: BodyRef) -> TaskBuilder<'_> {
        TaskBuilder {
            wf: self,
            name: name.into(),
            body,
            params: toml::Table::new(),
            constraints: Vec::new(),
            after: Vec::new(),
            branches: Vec::new(),
            discipline: BranchDiscipline::Free,
        }
    }

    /// Declare an activator that may select any subset of its branches.
    pub fn dynamic_task<F>(&mut self, name: impl Into<String>, selector: F) -> TaskBuilder<'_>
    where
        F: Fn(&mut ExecutionContext) -> anyhow::Result<BranchSelection> + Send + Sync + 'static,
    {
        self.task(name, branching_fn(selector))
    }

    /// Declare an activator that must select exactly one of its branches.
    pub fn branched_task<F>(&mut self, name: impl Into<String>, selector: F) -> TaskBuilder<'_>
    where
        F: Fn(&mut ExecutionContext) -> anyhow::Result<BranchSelection> + Send + Sync + 'static,
    {
        self.dynamic_task(name, selector)
            .discipline(BranchDiscipline::ExactlyOne)
    }

    /// Make `second` depend on `first`.
    pub fn link(&mut self, first: &str, second: &str) -> Result<()> {
        if first == second {
            return Err(BranchdagError::InvalidGraph(format!(
                "task '{first}' cannot depend on itself"
            )));
        }
        self.ensure_known(first)?;
        let pos = self.position(second)?;
        self.tasks[pos].add_dep(first);
        debug!(%first, %second, "linked tasks");
        Ok(())
    }

    /// One no-op initiator fanning out to `count` mappers, all feeding one
    /// reducer.
    ///
    /// Mapper `i` receives the parameter `index = i`.
    pub fn map_reduce(
        &mut self,
        name: &str,
        mapper: BodyRef,
        reducer: BodyRef,
        count: usize,
    ) -> Result<MapReduce> {
        if count == 0 {
            return Err(BranchdagError::InvalidGraph(format!(
                "map_reduce '{name}' needs at least one mapper"
            )));
        }

        let noop = self.noop.clone();
        let initiator = self.task(format!("{name}.init"), noop).add()?;

        let mut mappers = Vec::with_capacity(count);
        for i in 0..count {
            let id = self
                .task(format!("{name}.map"), mapper.clone())
                .param("index", i as i64)
                .after(&initiator)
                .add()?;
            mappers.push(id);
        }

        let mut reduce = self.task(format!("{name}.reduce"), reducer);
        for id in mappers.iter() {
            reduce = reduce.after(id);
        }
        let reducer = reduce.add()?;

        Ok(MapReduce {
            initiator,
            mappers,
            reducer,
        })
    }

    /// Freeze the workflow.
    pub fn build(self) -> Result<(TaskGraph, FunctionRegistry)> {
        let graph = TaskGraph::new(self.tasks)?;
        Ok((graph, self.registry))
    }

    fn allocate_id(&mut self, name: &str) -> TaskId {
        let id = format!("{name}#{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn push(&mut self, spec: TaskSpec) -> TaskId {
        let id = spec.id.clone();
        self.index.insert(id.clone(), self.tasks.len());
        self.tasks.push(spec);
        id
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| BranchdagError::InvalidGraph(format!("unknown task '{id}'")))
    }

    fn ensure_known(&self, id: &str) -> Result<()> {
        self.position(id).map(|_| ())
    }

    /// Task for branch `key`, created on first use.
    fn branch_task(&mut self, key: &str, body: BodyRef) -> Result<TaskId> {
        self.registry.register(key, body)?;
        if let Some(id) = self.branch_tasks.get(key) {
            return Ok(id.clone());
        }

        let id = self.allocate_id(key);
        let id = self.push(TaskSpec::new(id, key, key));
        self.branch_tasks.insert(key.to_string(), id.clone());
        Ok(id)
    }
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("tasks", &self.tasks)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<'w> TaskBuilder<'w> {
    pub fn param(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
        self
    }

    /// Static dependency on an already declared task.
    pub fn after(mut self, id: &str) -> Self {
        self.after.push(id.to_string());
        self
    }

    /// Declare a branch whose task runs `body`.
    ///
    /// The branch task is named and registered after `label`; declaring the
    /// same label with the same body from another activator reuses it.
    pub fn branch(mut self, label: impl Into<BranchLabel>, body: BodyRef) -> Self {
        self.branches.push((label.into(), BranchTarget::Body(body)));
        self
    }

    /// Declare a branch pointing at an already declared task.
    pub fn branch_to(mut self, label: impl Into<BranchLabel>, id: &str) -> Self {
        self.branches
            .push((label.into(), BranchTarget::Task(id.to_string())));
        self
    }

    pub fn discipline(mut self, discipline: BranchDiscipline) -> Self {
        self.discipline = discipline;
        self
    }

    /// Register the body, create branch tasks as needed and add the task.
    pub fn add(self) -> Result<TaskId> {
        let TaskBuilder {
            wf,
            name,
            body,
            params,
            constraints,
            after,
            branches,
            discipline,
        } = self;

        // Nothing is registered or created unless every part is valid.
        for dep in after.iter() {
            wf.ensure_known(dep)?;
        }
        let mut pending: Vec<(&str, &BodyRef)> = vec![(name.as_str(), &body)];
        for (label, target) in branches.iter() {
            match target {
                BranchTarget::Task(id) => wf.ensure_known(id)?,
                BranchTarget::Body(branch_body) => {
                    pending.push((label.as_str(), branch_body));
                }
            }
        }
        for (i, (key, candidate)) in pending.iter().enumerate() {
            wf.registry.check(key, candidate)?;
            let clash = pending[..i]
                .iter()
                .any(|(other, earlier)| other == key && !Arc::ptr_eq(earlier, candidate));
            if clash {
                return Err(BranchdagError::DuplicateRegistration(key.to_string()));
            }
        }

        wf.registry.register(name.as_str(), body)?;

        let mut spawns = Vec::with_capacity(branches.len());
        for (label, target) in branches {
            let target = match target {
                BranchTarget::Body(body) => wf.branch_task(&label, body)?,
                BranchTarget::Task(id) => id,
            };
            spawns.push((label, target));
        }

        let id = wf.allocate_id(&name);
        let mut spec = TaskSpec::new(id, name.as_str(), name.as_str());
        spec.params = params;
        spec.discipline = discipline;
        for dep in after {
            spec.add_dep(dep);
        }
        for (label, target) in spawns {
            spec.add_spawn(label, target);
        }
        for constraint in constraints {
            spec.add_constraint(constraint);
        }

        debug!(
            workflow = %wf.name,
            task = %spec.id,
            activator = spec.is_activator(),
            "task declared"
        );
        Ok(wf.push(spec))
    }
}
