// src/dag/mod.rs

//! Dag representation and scheduling.
//!
//! - [`node`] holds task definitions, their arena handles and per-run state.
//! - [`schema`] describes parent → children relations used to define a dag.
//! - [`graph`] stores the topology and the slot labels of the edges.
//! - [`aggregate`] composes a task's input from its predecessors' outputs.
//! - [`scheduler`] contains the polling loop that drives one run.
//! - [`template`] ties it together: define, instantiate, run.

pub mod aggregate;
pub mod graph;
pub mod node;
pub mod scheduler;
pub mod schema;
pub mod template;

pub use graph::DagGraph;
pub use node::{DEFAULT_QUEUE, NodeId, NodeState, NodeStatus, TaskNode};
pub use scheduler::RunReport;
pub use schema::{Children, Schema};
pub use template::Dag;
