// src/queue/backend.rs

//! Pluggable job-dispatch backend abstraction.
//!
//! The scheduler loop submits jobs through a [`QueueBackend`] and observes
//! their completion only by polling the returned [`ResultHandle`]. It never
//! waits on a handle. Production wiring uses [`super::LocalQueue`]; tests
//! provide their own backend that completes jobs on demand.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dag::TaskNode;
use crate::data::{MultiTaskData, TaskData};
use crate::errors::Result;

/// Entrypoint name a worker uses to execute a single task.
pub const TASK_ENTRYPOINT: &str = "dagflow.jobs.execute_task";

/// Routing key of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobType {
    Workflow,
    Dag,
    Task,
}

impl JobType {
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::Workflow => "workflow",
            JobType::Dag => "dag",
            JobType::Task => "task",
        }
    }
}

/// Outcome of a job as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub data: TaskData,
    /// Names of the successors allowed to run. `None` permits all of them.
    #[serde(default)]
    pub limit: Option<Vec<String>>,
}

impl JobResult {
    pub fn new(data: TaskData) -> Self {
        Self { data, limit: None }
    }

    pub fn with_limit<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.limit = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Whether a successor with this name may proceed.
    pub fn permits(&self, successor: &str) -> bool {
        match &self.limit {
            None => true,
            Some(names) => names.iter().any(|n| n == successor),
        }
    }
}

/// How long the backend keeps a finished job's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Results stay until explicitly forgotten; the scheduler forgets them as
    /// soon as no successor needs them.
    Immediate,
    /// Results expire on the backend's own timer.
    After(Duration),
}

impl Retention {
    /// `0` seconds means [`Retention::Immediate`].
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            Retention::Immediate
        } else {
            Retention::After(Duration::from_secs(secs))
        }
    }

    pub fn is_immediate(self) -> bool {
        matches!(self, Retention::Immediate)
    }
}

/// Everything a worker needs to execute one task.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub entrypoint: &'static str,
    pub task: TaskNode,
    pub workflow_id: String,
    pub input: MultiTaskData,
    pub queue: String,
    pub routing_key: JobType,
}

impl DispatchRequest {
    pub fn for_task(task: TaskNode, workflow_id: &str, input: MultiTaskData) -> Self {
        let queue = task.queue.clone();
        Self {
            entrypoint: TASK_ENTRYPOINT,
            task,
            workflow_id: workflow_id.to_string(),
            input,
            queue,
            routing_key: JobType::Task,
        }
    }
}

/// Handle to a submitted job.
pub trait ResultHandle: Send + Sync + fmt::Debug {
    /// Non-blocking completion check.
    fn is_finished(&self) -> bool;

    /// The stored result, if the job finished and it has not been forgotten
    /// or expired.
    fn result(&self) -> Option<Arc<JobResult>>;

    /// Drop the stored result from the backend.
    fn forget(&self);
}

/// Trait abstracting how jobs reach workers.
pub trait QueueBackend: Send + Sync {
    /// Submit a job and return immediately with a handle to it.
    fn submit(&self, request: DispatchRequest) -> Result<Box<dyn ResultHandle>>;

    /// Result retention policy of this backend.
    fn retention(&self) -> Retention;
}
