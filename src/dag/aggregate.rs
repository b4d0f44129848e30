// src/dag/aggregate.rs

//! Composition of a task's input from its predecessors' outputs.

use tracing::debug;

use crate::dag::graph::DagGraph;
use crate::dag::node::{NodeId, NodeState, TaskNode};
use crate::data::{MultiTaskData, TaskData};

/// Build the input payload for `node`.
///
/// A node without predecessors receives `initial` unchanged. Otherwise each
/// predecessor contributes one dataset named after it, aliased with the slot
/// label of the connecting edge when one was registered. A predecessor
/// without an available result (skipped, or its result already released)
/// contributes an empty dataset.
pub fn build_input(
    graph: &DagGraph,
    tasks: &[TaskNode],
    states: &[NodeState],
    node: NodeId,
    initial: &MultiTaskData,
) -> MultiTaskData {
    let predecessors = graph.predecessors(node);
    if predecessors.is_empty() {
        return initial.clone();
    }

    let mut input = MultiTaskData::new();
    for pred in predecessors {
        let pred_task = &tasks[pred.index()];
        let data = match states[pred.index()].result() {
            Some(result) => result.data.clone(),
            None => {
                debug!(
                    task = %tasks[node.index()].name,
                    predecessor = %pred_task.name,
                    "predecessor has no result; attaching empty dataset"
                );
                TaskData::new()
            }
        };

        let aliases = graph.slot(node, pred).map(|label| vec![label.to_string()]);
        input.add_dataset(pred_task.name.clone(), data, aliases);
    }

    input
}
