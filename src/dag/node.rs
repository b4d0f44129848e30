// src/dag/node.rs

//! Task nodes and their per-run state.

use std::fmt;
use std::sync::Arc;

use crate::queue::{JobResult, ResultHandle};

/// Default queue a task is submitted to.
pub const DEFAULT_QUEUE: &str = "task";

/// Stable identity of a task inside a dag.
///
/// This is a handle into the dag's task arena, used as the graph vertex key.
/// Two tasks with identical definitions are still different nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Static definition of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
    pub name: String,
    /// Queue the task is submitted to.
    pub queue: String,
    /// Whether a skip of this task counts towards skipping its successors.
    pub propagate_skip: bool,
    /// Set at run start.
    pub dag_name: Option<String>,
    /// Set at run start.
    pub workflow_name: Option<String>,
}

impl TaskNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: DEFAULT_QUEUE.to_string(),
            propagate_skip: true,
            dag_name: None,
            workflow_name: None,
        }
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    pub fn with_propagate_skip(mut self, propagate: bool) -> Self {
        self.propagate_skip = propagate;
        self
    }
}

/// Public, read-only view of where a node is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Not yet dispatched.
    Pending,
    /// Submitted to the queue; no completion observed yet.
    Dispatched,
    /// The result handle reports the job as finished.
    Finished,
}

/// Mutable run-state of a node. Owned by the scheduler loop.
#[derive(Debug, Default)]
pub struct NodeState {
    handle: Option<Box<dyn ResultHandle>>,
    skipped: bool,
}

impl NodeState {
    pub fn status(&self) -> NodeStatus {
        match &self.handle {
            None => NodeStatus::Pending,
            Some(h) if h.is_finished() => NodeStatus::Finished,
            Some(_) => NodeStatus::Dispatched,
        }
    }

    /// Whether the node has been dispatched and holds a result handle.
    pub fn has_result(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| h.is_finished())
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Mark a pending node as skipped.
    ///
    /// Returns `true` only if the node was pending and not already skipped.
    /// A dispatched or finished node is never skipped.
    pub fn skip(&mut self) -> bool {
        if self.handle.is_some() || self.skipped {
            return false;
        }
        self.skipped = true;
        true
    }

    pub(crate) fn assign(&mut self, handle: Box<dyn ResultHandle>) {
        self.handle = Some(handle);
    }

    /// The job result, if the node finished and the backend still holds it.
    pub fn result(&self) -> Option<Arc<JobResult>> {
        self.handle
            .as_ref()
            .filter(|h| h.is_finished())
            .and_then(|h| h.result())
    }

    /// Ask the backend to drop the stored result.
    pub(crate) fn forget(&self) {
        if let Some(handle) = &self.handle {
            handle.forget();
        }
    }
}
