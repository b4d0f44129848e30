// src/dag/template.rs

use tracing::{debug, info};

use crate::config::model::{ChildrenSpec, ConfigFile, DagConfig};
use crate::dag::graph::DagGraph;
use crate::dag::node::{NodeId, NodeState, NodeStatus, TaskNode};
use crate::dag::scheduler::{RunReport, Scheduler};
use crate::dag::schema::{Children, Schema};
use crate::data::MultiTaskData;
use crate::errors::{DagError, Result};
use crate::queue::QueueBackend;
use crate::signal::DagSignal;

/// A dag hosts a graph of tasks and runs them in dependency order.
///
/// A dag is defined once as a template. Each execution should use an
/// independent copy obtained from [`Dag::instantiate`], so runs never observe
/// each other's state.
#[derive(Debug)]
pub struct Dag {
    name: String,
    autostart: bool,
    workflow_name: Option<String>,
    graph: DagGraph,
    tasks: Vec<TaskNode>,
    states: Vec<NodeState>,
    copy_counter: u64,
}

impl Dag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            autostart: true,
            workflow_name: None,
            graph: DagGraph::new(),
            tasks: Vec::new(),
            states: Vec::new(),
            copy_counter: 0,
        }
    }

    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    /// Build a template from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut dag = Dag::new(cfg.dag.name.clone()).with_autostart(cfg.dag.autostart);
        dag.workflow_name = cfg.dag.workflow.clone();

        for (name, tc) in cfg.task.iter() {
            dag.add_task(
                TaskNode::new(name.clone())
                    .with_queue(tc.queue.clone())
                    .with_propagate_skip(tc.propagate_skip),
            );
        }

        let lookup = |name: &str| {
            dag.find(name)
                .ok_or_else(|| DagError::TaskNotFound(name.to_string()))
        };

        let mut schema = Schema::new();
        for (parent, spec) in cfg.schema.iter() {
            let parent_id = lookup(parent.as_str())?;
            let children = match spec {
                ChildrenSpec::One(child) => Children::One(lookup(child.as_str())?),
                ChildrenSpec::Many(children) => Children::Many(
                    children
                        .iter()
                        .map(|c| lookup(c.as_str()))
                        .collect::<Result<Vec<_>>>()?,
                ),
                ChildrenSpec::Slots(children) => Children::Slots(
                    children
                        .iter()
                        .map(|(c, label)| Ok((lookup(c.as_str())?, Some(label.clone()))))
                        .collect::<Result<Vec<_>>>()?,
                ),
            };
            schema.insert(parent_id, children);
        }

        dag.define(&schema)?;
        Ok(dag)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the dag starts together with its workflow.
    pub fn autostart(&self) -> bool {
        self.autostart
    }

    pub fn workflow_name(&self) -> Option<&str> {
        self.workflow_name.as_deref()
    }

    pub fn set_workflow_name(&mut self, name: impl Into<String>) {
        self.workflow_name = Some(name.into());
    }

    /// Register a task and return its handle.
    ///
    /// Registering does not place the task in the graph; [`Dag::define`]
    /// does.
    pub fn add_task(&mut self, task: TaskNode) -> NodeId {
        let id = NodeId::new(self.tasks.len());
        self.tasks.push(task);
        self.states.push(NodeState::default());
        id
    }

    pub fn task(&self, id: NodeId) -> Option<&TaskNode> {
        self.tasks.get(id.index())
    }

    /// First registered task with the given name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.tasks
            .iter()
            .position(|t| t.name == name)
            .map(NodeId::new)
    }

    pub fn tasks(&self) -> impl Iterator<Item = (NodeId, &TaskNode)> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (NodeId::new(i), t))
    }

    /// Construct the task graph from `schema`, replacing any previous graph.
    ///
    /// Fails only if the schema references a task not registered with this
    /// dag. Cycles are not detected here; [`Dag::run`] rejects them.
    pub fn define(&mut self, schema: &Schema) -> Result<()> {
        if let Some(unknown) = schema.referenced().find(|id| id.index() >= self.tasks.len()) {
            return Err(DagError::TaskNotFound(format!(
                "node {unknown} is not registered with dag '{}'",
                self.name
            )));
        }

        self.graph.define(schema);
        debug!(
            dag = %self.name,
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "defined dag graph"
        );
        Ok(())
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    /// Attach a slot label to an existing edge. An empty label removes it.
    pub fn set_slot(&mut self, successor: NodeId, predecessor: NodeId, label: &str) {
        self.graph.set_slot(successor, predecessor, label);
    }

    pub fn status_of(&self, id: NodeId) -> Option<NodeStatus> {
        self.states.get(id.index()).map(NodeState::status)
    }

    pub fn is_skipped(&self, id: NodeId) -> bool {
        self.states.get(id.index()).is_some_and(NodeState::is_skipped)
    }

    /// Number of copies made from this template so far.
    pub fn copy_counter(&self) -> u64 {
        self.copy_counter
    }

    /// Create an independent, runnable copy of this dag.
    ///
    /// The copy is named `"{name}:{n}"` where `n` is this template's
    /// incremented copy counter. Graph, slot labels and task definitions are
    /// duplicated; run-state starts fresh and the copy's own counter starts
    /// at zero.
    pub fn instantiate(&mut self) -> Dag {
        self.copy_counter += 1;
        let name = format!("{}:{}", self.name, self.copy_counter);
        debug!(template = %self.name, copy = %name, "instantiating dag");

        Dag {
            name,
            autostart: self.autostart,
            workflow_name: self.workflow_name.clone(),
            graph: self.graph.clone(),
            tasks: self.tasks.clone(),
            states: self.tasks.iter().map(|_| NodeState::default()).collect(),
            copy_counter: 0,
        }
    }

    /// Run the dag by dispatching its tasks in dependency order.
    ///
    /// `data` is handed unchanged to every task without predecessors.
    ///
    /// # Errors
    ///
    /// - [`DagError::GraphValidation`] if the graph contains a cycle.
    /// - [`DagError::Configuration`] if `config` is missing or invalid.
    ///
    /// Both are raised before anything is dispatched. A dispatch failure of
    /// the backend aborts the run with [`DagError::Dispatch`].
    pub async fn run(
        &mut self,
        config: Option<&DagConfig>,
        workflow_id: &str,
        backend: &dyn QueueBackend,
        signal: &dyn DagSignal,
        data: Option<MultiTaskData>,
    ) -> Result<RunReport> {
        let order = self.graph.topological_order().map_err(|node| {
            let task = self
                .task(node)
                .map(|t| t.name.as_str())
                .unwrap_or("<unknown>");
            DagError::GraphValidation(format!(
                "cycle detected in dag '{}' involving task '{}'",
                self.name, task
            ))
        })?;

        let config = config.ok_or_else(|| {
            DagError::Configuration(format!("no configuration supplied for dag '{}'", self.name))
        })?;
        let polling = config.polling_interval()?;

        for &node in &order {
            let task = &mut self.tasks[node.index()];
            task.dag_name = Some(self.name.clone());
            task.workflow_name = self.workflow_name.clone();
        }
        for state in self.states.iter_mut() {
            *state = NodeState::default();
        }

        info!(
            dag = %self.name,
            workflow_id = %workflow_id,
            tasks = order.len(),
            "starting dag run"
        );

        let mut scheduler = Scheduler::new(
            &self.name,
            workflow_id,
            &self.graph,
            &self.tasks,
            &mut self.states,
            backend,
            signal,
            polling,
            data.unwrap_or_default(),
        );
        scheduler.seed(&order);
        scheduler.run().await
    }
}
