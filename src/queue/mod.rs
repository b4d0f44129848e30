// src/queue/mod.rs

//! Job dispatch.
//!
//! - [`backend`] defines the `QueueBackend` / `ResultHandle` traits the
//!   scheduler talks to, plus the job and result types.
//! - [`local`] is an in-process backend that runs task bodies on Tokio
//!   tasks and keeps their results in a shared result store.

pub mod backend;
pub mod local;

pub use backend::{
    DispatchRequest, JobResult, JobType, QueueBackend, ResultHandle, Retention, TASK_ENTRYPOINT,
};
pub use local::LocalQueue;
