// src/task/body.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::dag::TaskNode;
use crate::data::{MultiTaskData, TaskData};
use crate::queue::JobResult;
use crate::signal::DagSignal;
use crate::store::DataStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a worker hands to a task body.
pub struct TaskContext {
    pub task: TaskNode,
    pub workflow_id: String,
    /// Input composed by the scheduler from the predecessors' outputs.
    pub data: MultiTaskData,
    pub store: Arc<dyn DataStore>,
    pub signal: Arc<dyn DagSignal>,
}

impl TaskContext {
    pub fn name(&self) -> &str {
        &self.task.name
    }

    /// Copy of the default input dataset, or an empty one.
    pub fn default_data(&self) -> TaskData {
        self.data.default_dataset().cloned().unwrap_or_default()
    }
}

/// Output of a task body: data for the successors and, optionally, the
/// names of the only successors allowed to run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Action {
    pub data: TaskData,
    pub limit: Option<Vec<String>>,
}

impl Action {
    pub fn new(data: TaskData) -> Self {
        Self { data, limit: None }
    }

    pub fn limit<I, S>(mut self, successors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.limit = Some(successors.into_iter().map(Into::into).collect());
        self
    }
}

impl From<Action> for JobResult {
    fn from(action: Action) -> Self {
        JobResult {
            data: action.data,
            limit: action.limit,
        }
    }
}

/// Business logic of a task, executed by a worker.
///
/// An `Err` is logged by the worker and the job still finishes, with an
/// empty result. Conditional branching after a failure is expressed by
/// returning `Ok` with a limit instead.
pub trait TaskBody: Send + Sync {
    fn run(&self, ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<Action>>;
}

type TaskFn = dyn Fn(&TaskContext) -> anyhow::Result<Action> + Send + Sync;

/// Task body backed by a plain closure.
pub struct FnTask {
    func: Box<TaskFn>,
}

impl FnTask {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&TaskContext) -> anyhow::Result<Action> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
        }
    }
}

impl TaskBody for FnTask {
    fn run(&self, ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<Action>> {
        Box::pin(async move { (self.func)(&ctx) })
    }
}
