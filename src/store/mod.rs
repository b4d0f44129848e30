// src/store/mod.rs

//! Document store shared by the task bodies of a workflow.
//!
//! Keys use dot-path addressing into a nested document, e.g.
//! `"buffer.observable"` refers to field `observable` of object `buffer`.
//! The scheduler itself never touches the store.

pub mod memory;

use serde_json::Value;

use crate::errors::Result;

pub use memory::MemoryDataStore;

pub trait DataStore: Send + Sync {
    /// Read the value at `key`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Overwrite the value at `key`, creating intermediate objects.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Append one value to the sequence at `key`, creating it if absent.
    fn push(&self, key: &str, value: Value) -> Result<()>;

    /// Append many values to the sequence at `key`, creating it if absent.
    fn extend(&self, key: &str, values: Vec<Value>) -> Result<()>;
}
