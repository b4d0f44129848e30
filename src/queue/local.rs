// src/queue/local.rs

//! In-process queue backend.
//!
//! Each submitted job runs its task body on a Tokio task. Finished results
//! land in a result store shared by all handles of this backend; the store is
//! the only state the scheduler cleans up, via [`ResultHandle::forget`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use crate::errors::{DagError, Result};
use crate::signal::DagSignal;
use crate::store::DataStore;
use crate::task::{TaskContext, TaskRegistry};

use super::backend::{DispatchRequest, JobResult, QueueBackend, ResultHandle, Retention};

type JobId = u64;

/// Results of finished jobs, keyed by job id.
#[derive(Debug, Default)]
struct ResultStore {
    entries: Mutex<HashMap<JobId, Arc<JobResult>>>,
}

impl ResultStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, Arc<JobResult>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, id: JobId, result: JobResult) {
        self.lock().insert(id, Arc::new(result));
    }

    fn get(&self, id: JobId) -> Option<Arc<JobResult>> {
        self.lock().get(&id).cloned()
    }

    fn remove(&self, id: JobId) -> bool {
        self.lock().remove(&id).is_some()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Backend that executes jobs in the current process.
///
/// Cloning is cheap; clones share the registry and the result store.
#[derive(Clone)]
pub struct LocalQueue {
    registry: Arc<TaskRegistry>,
    store: Arc<dyn DataStore>,
    signal: Arc<dyn DagSignal>,
    retention: Retention,
    results: Arc<ResultStore>,
    next_id: Arc<AtomicU64>,
}

impl fmt::Debug for LocalQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalQueue")
            .field("registry", &self.registry)
            .field("retention", &self.retention)
            .field("stored_results", &self.results.len())
            .finish_non_exhaustive()
    }
}

impl LocalQueue {
    pub fn new(
        registry: TaskRegistry,
        store: Arc<dyn DataStore>,
        signal: Arc<dyn DagSignal>,
        retention: Retention,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            store,
            signal,
            retention,
            results: Arc::new(ResultStore::default()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Number of results currently held by the result store.
    pub fn stored_results(&self) -> usize {
        self.results.len()
    }
}

impl QueueBackend for LocalQueue {
    fn submit(&self, request: DispatchRequest) -> Result<Box<dyn ResultHandle>> {
        let runtime = Handle::try_current().map_err(|e| {
            DagError::Dispatch(format!(
                "cannot submit task '{}' outside a Tokio runtime: {e}",
                request.task.name
            ))
        })?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let finished = Arc::new(AtomicBool::new(false));

        debug!(
            job = id,
            task = %request.task.name,
            queue = %request.queue,
            routing_key = request.routing_key.as_str(),
            entrypoint = request.entrypoint,
            "job submitted"
        );

        let job = Job {
            id,
            request,
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            signal: Arc::clone(&self.signal),
            retention: self.retention,
            results: Arc::clone(&self.results),
            finished: Arc::clone(&finished),
        };
        runtime.spawn(job.execute());

        Ok(Box::new(LocalHandle {
            id,
            finished,
            results: Arc::clone(&self.results),
        }))
    }

    fn retention(&self) -> Retention {
        self.retention
    }
}

/// A single job as seen by the worker side.
struct Job {
    id: JobId,
    request: DispatchRequest,
    registry: Arc<TaskRegistry>,
    store: Arc<dyn DataStore>,
    signal: Arc<dyn DagSignal>,
    retention: Retention,
    results: Arc<ResultStore>,
    finished: Arc<AtomicBool>,
}

impl Job {
    async fn execute(self) {
        let name = self.request.task.name.clone();
        let ctx = TaskContext {
            task: self.request.task,
            workflow_id: self.request.workflow_id,
            data: self.request.input,
            store: self.store,
            signal: self.signal,
        };

        // The body runs on its own task so that a panic surfaces as a
        // `JoinError` instead of unwinding past `finished`.
        let outcome = match self.registry.get(&name) {
            Some(body) => tokio::spawn(async move { body.run(ctx).await })
                .await
                .unwrap_or_else(|join_err| Err(anyhow!("task body aborted: {join_err}"))),
            None => Err(anyhow!("no task body registered for '{name}'")),
        };

        let result = match outcome {
            Ok(action) => {
                let mut result = JobResult::from(action);
                result.data.add_task_history(name.clone());
                result
            }
            Err(err) => {
                error!(job = self.id, task = %name, error = %err, "task body failed");
                JobResult::default()
            }
        };

        self.results.insert(self.id, result);
        self.finished.store(true, Ordering::SeqCst);
        debug!(job = self.id, task = %name, "job finished");

        if let Retention::After(ttl) = self.retention {
            let results = self.results;
            let id = self.id;
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                if results.remove(id) {
                    debug!(job = id, "job result expired");
                }
            });
        }
    }
}

/// Handle returned to the scheduler for a local job.
struct LocalHandle {
    id: JobId,
    finished: Arc<AtomicBool>,
    results: Arc<ResultStore>,
}

impl fmt::Debug for LocalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalHandle")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl ResultHandle for LocalHandle {
    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    fn result(&self) -> Option<Arc<JobResult>> {
        self.results.get(self.id)
    }

    fn forget(&self) {
        if !self.results.remove(self.id) {
            warn!(job = self.id, "forget called for a result that is no longer stored");
        }
    }
}
