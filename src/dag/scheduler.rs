// src/dag/scheduler.rs

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info};

use crate::dag::aggregate::build_input;
use crate::dag::graph::DagGraph;
use crate::dag::node::{NodeId, NodeState, NodeStatus, TaskNode};
use crate::data::MultiTaskData;
use crate::errors::Result;
use crate::queue::{DispatchRequest, QueueBackend};
use crate::signal::DagSignal;

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Tasks submitted to the queue, in dispatch order.
    pub dispatched: Vec<String>,
    /// Tasks marked skipped during the run, in the order they were skipped.
    pub skipped: Vec<String>,
    /// Number of results explicitly released from the backend.
    pub released: usize,
    /// Whether the stop signal was observed.
    pub stopped: bool,
}

/// Polling engine that drives one run of a dag to completion.
///
/// It keeps two working sets:
/// - `active`: nodes to dispatch, to wait on, or whose successors still have
///   to be queued;
/// - `cleanup`: discharged nodes whose results are released once every
///   successor has been dispatched.
///
/// The loop only polls result handles. It never blocks on a single job.
pub struct Scheduler<'a> {
    dag_name: &'a str,
    workflow_id: &'a str,
    graph: &'a DagGraph,
    tasks: &'a [TaskNode],
    states: &'a mut [NodeState],
    backend: &'a dyn QueueBackend,
    signal: &'a dyn DagSignal,
    polling: Duration,
    initial: MultiTaskData,
    active: Vec<NodeId>,
    cleanup: Vec<NodeId>,
    /// Every node that was ever added to `active`.
    enqueued: HashSet<NodeId>,
    /// Nodes whose result limit has already been applied.
    limited: HashSet<NodeId>,
    stopped: bool,
    report: RunReport,
}

impl<'a> Scheduler<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        dag_name: &'a str,
        workflow_id: &'a str,
        graph: &'a DagGraph,
        tasks: &'a [TaskNode],
        states: &'a mut [NodeState],
        backend: &'a dyn QueueBackend,
        signal: &'a dyn DagSignal,
        polling: Duration,
        initial: MultiTaskData,
    ) -> Self {
        Self {
            dag_name,
            workflow_id,
            graph,
            tasks,
            states,
            backend,
            signal,
            polling,
            initial,
            active: Vec::new(),
            cleanup: Vec::new(),
            enqueued: HashSet::new(),
            limited: HashSet::new(),
            stopped: false,
            report: RunReport::default(),
        }
    }

    /// Seed the active set with the start nodes (no predecessors).
    pub(crate) fn seed(&mut self, order: &[NodeId]) {
        for &node in order {
            if self.graph.predecessors(node).is_empty() {
                self.enqueue(node);
            }
        }
        debug!(
            dag = %self.dag_name,
            roots = ?self.names(&self.active),
            "seeded active set"
        );
    }

    pub(crate) async fn run(mut self) -> Result<RunReport> {
        while !self.active.is_empty() || !self.cleanup.is_empty() {
            if self.polling > Duration::ZERO {
                tokio::time::sleep(self.polling).await;
            } else {
                tokio::task::yield_now().await;
            }

            self.cleanup_pass();
            self.advance_pass()?;
        }

        info!(
            dag = %self.dag_name,
            workflow_id = %self.workflow_id,
            dispatched = self.report.dispatched.len(),
            skipped = self.report.skipped.len(),
            released = self.report.released,
            stopped = self.report.stopped,
            "dag run finished"
        );
        Ok(self.report)
    }

    /// Drop nodes whose output no successor needs any more.
    ///
    /// Leaving the cleanup set and releasing the result are separate: the
    /// result is only forgotten when the backend does not expire it itself.
    fn cleanup_pass(&mut self) {
        let release = self.backend.retention().is_immediate();
        let done: Vec<NodeId> = self
            .cleanup
            .iter()
            .copied()
            .filter(|&node| self.no_longer_needed(node))
            .collect();

        for node in done {
            if release {
                self.states[node.index()].forget();
                self.report.released += 1;
                debug!(
                    dag = %self.dag_name,
                    task = %self.tasks[node.index()].name,
                    "released task result"
                );
            }
            self.cleanup.retain(|&n| n != node);
        }
    }

    fn no_longer_needed(&self, node: NodeId) -> bool {
        self.stopped
            || self.graph.successors(node).into_iter().all(|succ| {
                let state = &self.states[succ.index()];
                state.has_result() || state.is_skipped()
            })
    }

    fn advance_pass(&mut self) -> Result<()> {
        if !self.stopped && self.signal.is_stopped() {
            info!(
                dag = %self.dag_name,
                workflow_id = %self.workflow_id,
                "stop signal received; no further tasks will be dispatched"
            );
            self.stopped = true;
            self.report.stopped = true;
        }

        let snapshot = self.active.clone();
        for node in snapshot {
            let state = &self.states[node.index()];
            match state.status() {
                NodeStatus::Pending if !state.is_skipped() => {
                    if self.stopped {
                        debug!(
                            dag = %self.dag_name,
                            task = %self.tasks[node.index()].name,
                            "run stopped; dropping undispatched task"
                        );
                        self.active.retain(|&n| n != node);
                    } else {
                        self.dispatch(node)?;
                    }
                }
                NodeStatus::Dispatched => {
                    // Still running; look again on the next pass.
                }
                NodeStatus::Pending | NodeStatus::Finished => self.resolve(node),
            }
        }

        Ok(())
    }

    fn dispatch(&mut self, node: NodeId) -> Result<()> {
        let task = &self.tasks[node.index()];
        let input = build_input(self.graph, self.tasks, self.states, node, &self.initial);

        debug!(
            dag = %self.dag_name,
            task = %task.name,
            datasets = ?input.names().collect::<Vec<_>>(),
            "composed task input"
        );

        let request = DispatchRequest::for_task(task.clone(), self.workflow_id, input);
        let handle = self.backend.submit(request)?;
        self.states[node.index()].assign(handle);
        self.report.dispatched.push(task.name.clone());

        info!(
            dag = %self.dag_name,
            workflow_id = %self.workflow_id,
            task = %task.name,
            queue = %task.queue,
            "dispatched task"
        );
        Ok(())
    }

    /// Handle a node that finished (or was skipped): apply its limit, queue
    /// the successors that became ready, and retire it once all of them are
    /// accounted for.
    fn resolve(&mut self, node: NodeId) {
        if self.stopped {
            // Successors will never be queued, so nothing is left to wait for.
            self.retire(node, "run stopped; moved to cleanup");
            return;
        }

        self.apply_limit(node);

        let mut discharged = true;
        for succ in self.graph.successors(node) {
            if self.enqueued.contains(&succ) {
                continue;
            }

            let preds = self.graph.predecessors(succ);
            let ready = preds.iter().all(|p| {
                let state = &self.states[p.index()];
                state.is_finished() || state.is_skipped()
            });
            if !ready {
                discharged = false;
                continue;
            }

            let all_skipped = preds.iter().all(|p| {
                self.states[p.index()].is_skipped() && self.tasks[p.index()].propagate_skip
            });
            if all_skipped {
                self.mark_skipped(succ, "all predecessors skipped");
            }

            self.enqueue(succ);
        }

        if discharged {
            self.retire(node, "all successors queued; moved to cleanup");
        }
    }

    fn retire(&mut self, node: NodeId, message: &str) {
        self.active.retain(|&n| n != node);
        self.cleanup.push(node);
        debug!(
            dag = %self.dag_name,
            task = %self.tasks[node.index()].name,
            "{message}"
        );
    }

    /// Skip every successor the node's result does not permit. Runs once per
    /// node, when it is first seen finished.
    fn apply_limit(&mut self, node: NodeId) {
        if !self.limited.insert(node) {
            return;
        }

        let Some(result) = self.states[node.index()].result() else {
            return;
        };
        if result.limit.is_none() {
            return;
        }

        for succ in self.graph.successors(node) {
            if !result.permits(&self.tasks[succ.index()].name) {
                self.mark_skipped(succ, "excluded by predecessor limit");
            }
        }
    }

    fn mark_skipped(&mut self, node: NodeId, reason: &str) {
        if self.states[node.index()].skip() {
            let name = &self.tasks[node.index()].name;
            info!(dag = %self.dag_name, task = %name, reason, "task skipped");
            self.report.skipped.push(name.clone());
        }
    }

    fn enqueue(&mut self, node: NodeId) {
        if self.enqueued.insert(node) {
            self.active.push(node);
        }
    }

    fn names(&self, nodes: &[NodeId]) -> Vec<&str> {
        nodes
            .iter()
            .map(|n| self.tasks[n.index()].name.as_str())
            .collect()
    }
}
