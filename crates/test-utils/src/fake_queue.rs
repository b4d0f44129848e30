use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dagflow::data::{MultiTaskData, TaskData};
use dagflow::errors::{DagError, Result};
use dagflow::queue::{DispatchRequest, JobResult, JobType, QueueBackend, ResultHandle, Retention};

/// When a fake job reports itself finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Finished as soon as it is submitted.
    Immediate,
    /// Finished after its handle was polled this many times.
    AfterPolls(usize),
    /// Finished only when the test calls [`FakeQueue::finish`].
    Manual,
}

/// What the fake backend saw for one submitted job.
#[derive(Debug, Clone)]
pub struct Submission {
    pub task: String,
    pub queue: String,
    pub workflow_id: String,
    pub dag_name: Option<String>,
    pub workflow_name: Option<String>,
    pub entrypoint: &'static str,
    pub routing_key: JobType,
    pub input: MultiTaskData,
    /// Tasks whose jobs had already finished when this one was submitted.
    pub finished_before: Vec<String>,
}

#[derive(Debug)]
struct FakeJob {
    task: String,
    polls_left: AtomicUsize,
    manual: bool,
    finished: AtomicBool,
    forgotten: AtomicBool,
    result: Arc<JobResult>,
}

#[derive(Debug, Default)]
struct FakeState {
    submissions: Vec<Submission>,
    jobs: Vec<Arc<FakeJob>>,
    results: HashMap<String, JobResult>,
    reject: Option<String>,
}

/// A fake queue backend that:
/// - records every submission, including the composed input
/// - completes jobs according to a [`Completion`] mode
/// - returns preset results (default: `{"produced_by": <task>}`)
/// - tracks which results were forgotten.
#[derive(Debug, Clone)]
pub struct FakeQueue {
    state: Arc<Mutex<FakeState>>,
    completion: Completion,
    retention: Retention,
}

impl FakeQueue {
    pub fn new(completion: Completion) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
            completion,
            retention: Retention::Immediate,
        }
    }

    pub fn immediate() -> Self {
        Self::new(Completion::Immediate)
    }

    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Preset the result a task's job produces.
    pub fn with_result(self, task: &str, result: JobResult) -> Self {
        self.state
            .lock()
            .unwrap()
            .results
            .insert(task.to_string(), result);
        self
    }

    /// Make `submit` fail for the given task.
    pub fn rejecting(self, task: &str) -> Self {
        self.state.lock().unwrap().reject = Some(task.to_string());
        self
    }

    /// Names of submitted tasks, in submission order.
    pub fn submitted(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .submissions
            .iter()
            .map(|s| s.task.clone())
            .collect()
    }

    pub fn submission(&self, task: &str) -> Option<Submission> {
        self.state
            .lock()
            .unwrap()
            .submissions
            .iter()
            .find(|s| s.task == task)
            .cloned()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    /// Complete a manual job. Returns `false` if the task was not submitted.
    pub fn finish(&self, task: &str) -> bool {
        let state = self.state.lock().unwrap();
        match state.jobs.iter().find(|j| j.task == task) {
            Some(job) => {
                job.finished.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub fn is_forgotten(&self, task: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .jobs
            .iter()
            .any(|j| j.task == task && j.forgotten.load(Ordering::SeqCst))
    }

    pub fn forgotten(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .jobs
            .iter()
            .filter(|j| j.forgotten.load(Ordering::SeqCst))
            .map(|j| j.task.clone())
            .collect()
    }
}

/// Default payload of a fake job: records which task produced it.
pub fn produced_by(task: &str) -> TaskData {
    let mut data = TaskData::new();
    data.set("produced_by", task);
    data
}

impl QueueBackend for FakeQueue {
    fn submit(&self, request: DispatchRequest) -> Result<Box<dyn ResultHandle>> {
        let mut state = self.state.lock().unwrap();
        let task = request.task.name.clone();

        if state.reject.as_deref() == Some(task.as_str()) {
            return Err(DagError::Dispatch(format!("fake queue rejected '{task}'")));
        }

        let finished_before = state
            .jobs
            .iter()
            .filter(|j| j.finished.load(Ordering::SeqCst))
            .map(|j| j.task.clone())
            .collect();

        state.submissions.push(Submission {
            task: task.clone(),
            queue: request.queue.clone(),
            workflow_id: request.workflow_id.clone(),
            dag_name: request.task.dag_name.clone(),
            workflow_name: request.task.workflow_name.clone(),
            entrypoint: request.entrypoint,
            routing_key: request.routing_key,
            input: request.input,
            finished_before,
        });

        let result = state
            .results
            .get(&task)
            .cloned()
            .unwrap_or_else(|| JobResult::new(produced_by(&task)));

        let (polls, manual) = match self.completion {
            Completion::Immediate => (0, false),
            Completion::AfterPolls(n) => (n, false),
            Completion::Manual => (0, true),
        };

        let job = Arc::new(FakeJob {
            task,
            polls_left: AtomicUsize::new(polls),
            manual,
            finished: AtomicBool::new(polls == 0 && !manual),
            forgotten: AtomicBool::new(false),
            result: Arc::new(result),
        });
        state.jobs.push(Arc::clone(&job));

        Ok(Box::new(FakeHandle { job }))
    }

    fn retention(&self) -> Retention {
        self.retention
    }
}

#[derive(Debug)]
struct FakeHandle {
    job: Arc<FakeJob>,
}

impl ResultHandle for FakeHandle {
    fn is_finished(&self) -> bool {
        if self.job.finished.load(Ordering::SeqCst) {
            return true;
        }
        if self.job.manual {
            return false;
        }
        let left = self.job.polls_left.load(Ordering::SeqCst);
        if left <= 1 {
            self.job.polls_left.store(0, Ordering::SeqCst);
            self.job.finished.store(true, Ordering::SeqCst);
            true
        } else {
            self.job.polls_left.store(left - 1, Ordering::SeqCst);
            false
        }
    }

    fn result(&self) -> Option<Arc<JobResult>> {
        if self.job.forgotten.load(Ordering::SeqCst) {
            None
        } else {
            Some(Arc::clone(&self.job.result))
        }
    }

    fn forget(&self) {
        self.job.forgotten.store(true, Ordering::SeqCst);
    }
}
