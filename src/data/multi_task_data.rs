// src/data/multi_task_data.rs

use serde::{Deserialize, Serialize};

use super::TaskData;

/// A dataset plus the names it can be looked up by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub data: TaskData,
}

impl Dataset {
    fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.aliases.iter().any(|a| a == key)
    }
}

/// Bag of named datasets handed to a task as its input.
///
/// For a task with predecessors there is one dataset per predecessor, named
/// after it and optionally tagged with the slot label of the connecting edge.
/// Datasets keep insertion order. The default dataset is the first one unless
/// changed with [`MultiTaskData::set_default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiTaskData {
    datasets: Vec<Dataset>,
    #[serde(default)]
    default_index: usize,
}

impl MultiTaskData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a bag holding a single dataset.
    pub fn with_dataset(name: impl Into<String>, data: TaskData) -> Self {
        let mut multi = Self::new();
        multi.add_dataset(name, data, None);
        multi
    }

    /// Append a dataset. An existing dataset with the same name is replaced
    /// in place so that names stay unique.
    pub fn add_dataset(
        &mut self,
        name: impl Into<String>,
        data: TaskData,
        aliases: Option<Vec<String>>,
    ) {
        let dataset = Dataset {
            name: name.into(),
            aliases: aliases.unwrap_or_default(),
            data,
        };

        match self.datasets.iter().position(|d| d.name == dataset.name) {
            Some(idx) => self.datasets[idx] = dataset,
            None => self.datasets.push(dataset),
        }
    }

    /// Look a dataset up by name first, then by alias.
    pub fn dataset(&self, key: &str) -> Option<&TaskData> {
        self.datasets
            .iter()
            .find(|d| d.name == key)
            .or_else(|| self.datasets.iter().find(|d| d.answers_to(key)))
            .map(|d| &d.data)
    }

    pub fn dataset_mut(&mut self, key: &str) -> Option<&mut TaskData> {
        let idx = self
            .datasets
            .iter()
            .position(|d| d.name == key)
            .or_else(|| self.datasets.iter().position(|d| d.answers_to(key)))?;
        Some(&mut self.datasets[idx].data)
    }

    pub fn default_dataset(&self) -> Option<&TaskData> {
        self.datasets.get(self.default_index).map(|d| &d.data)
    }

    /// Make the dataset reachable under `key` the default one.
    ///
    /// Returns `false` if no dataset answers to `key`.
    pub fn set_default(&mut self, key: &str) -> bool {
        match self.datasets.iter().position(|d| d.answers_to(key)) {
            Some(idx) => {
                self.default_index = idx;
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(|d| d.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.iter()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
