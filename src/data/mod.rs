// src/data/mod.rs

//! Payloads passed between tasks.
//!
//! - [`task_data`] holds a single JSON-object dataset.
//! - [`multi_task_data`] bundles several named, alias-tagged datasets into
//!   the input of one task.

pub mod multi_task_data;
pub mod task_data;

pub use multi_task_data::{Dataset, MultiTaskData};
pub use task_data::TaskData;
