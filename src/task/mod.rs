// src/task/mod.rs

//! Task bodies: the work a worker performs for a dispatched task.
//!
//! - [`body`] defines the `TaskBody` trait, its context and its output.
//! - [`command`] runs a shell command via `tokio::process`.
//! - [`registry`] maps task names to bodies.

pub mod body;
pub mod command;
pub mod registry;

pub use body::{Action, BoxFuture, FnTask, TaskBody, TaskContext};
pub use command::CommandTask;
pub use registry::TaskRegistry;
