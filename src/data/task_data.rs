// src/data/task_data.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single dataset flowing along the edges of a dag.
///
/// Values are stored as a JSON object so that any serialisable payload can be
/// passed between tasks regardless of which worker produced it. The history
/// records the names of the tasks that handled this dataset, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    #[serde(default)]
    values: Map<String, Value>,
    #[serde(default)]
    history: Vec<String>,
}

impl TaskData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Insert a value, returning the previous one for this key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another dataset into this one. Keys present in both are taken
    /// from `other`; its history is appended.
    pub fn merge(&mut self, other: &TaskData) {
        for (key, value) in other.values.iter() {
            self.values.insert(key.clone(), value.clone());
        }
        self.history.extend(other.history.iter().cloned());
    }

    /// Names of the tasks that produced or forwarded this dataset.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn add_task_history(&mut self, task_name: impl Into<String>) {
        self.history.push(task_name.into());
    }
}

impl From<Map<String, Value>> for TaskData {
    fn from(values: Map<String, Value>) -> Self {
        Self {
            values,
            history: Vec::new(),
        }
    }
}
