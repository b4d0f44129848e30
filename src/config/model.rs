// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::dag::DEFAULT_QUEUE;
use crate::errors::{DagError, Result};
use crate::queue::Retention;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// dag_polling_time = 0.5
/// result_expires = 0
///
/// [dag]
/// name = "pipeline"
///
/// [task.first]
/// cmd = "echo first"
///
/// [task.second]
/// cmd = "echo second"
///
/// [schema]
/// first = ["second"]
/// ```
///
/// This is the unvalidated form; convert with `ConfigFile::try_from`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: DagConfig,

    pub dag: DagSection,

    /// Keys are task names.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Parent task name → children.
    #[serde(default)]
    pub schema: BTreeMap<String, ChildrenSpec>,
}

/// Validated configuration. Construct via `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: DagConfig,
    pub dag: DagSection,
    pub task: BTreeMap<String, TaskConfig>,
    pub schema: BTreeMap<String, ChildrenSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            dag: raw.dag,
            task: raw.task,
            schema: raw.schema,
        }
    }
}

/// `[config]` section: settings the scheduler and the queue backend read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DagConfig {
    /// Seconds between two scheduler passes. `0` polls without sleeping.
    #[serde(default = "default_dag_polling_time")]
    pub dag_polling_time: f64,

    /// Seconds a finished job's result is kept by the backend. `0` means the
    /// scheduler releases results as soon as no successor needs them.
    #[serde(default)]
    pub result_expires: u64,
}

fn default_dag_polling_time() -> f64 {
    0.5
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            dag_polling_time: default_dag_polling_time(),
            result_expires: 0,
        }
    }
}

impl DagConfig {
    /// Config that polls without sleeping and releases results immediately.
    pub fn immediate() -> Self {
        Self {
            dag_polling_time: 0.0,
            result_expires: 0,
        }
    }

    pub fn polling_interval(&self) -> Result<Duration> {
        let secs = self.dag_polling_time;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            DagError::Configuration(format!(
                "dag_polling_time must be a non-negative number of seconds (got {secs})"
            ))
        })
    }

    pub fn retention(&self) -> Retention {
        Retention::from_secs(self.result_expires)
    }
}

/// `[dag]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DagSection {
    pub name: String,

    #[serde(default = "default_true")]
    pub autostart: bool,

    /// Name of the workflow the dag belongs to.
    #[serde(default)]
    pub workflow: Option<String>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command executed for this task.
    pub cmd: String,

    #[serde(default = "default_queue")]
    pub queue: String,

    #[serde(default = "default_true")]
    pub propagate_skip: bool,

    /// Successors allowed to run when the command exits non-zero.
    #[serde(default)]
    pub on_failure: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

fn default_queue() -> String {
    DEFAULT_QUEUE.to_string()
}

/// Children of a parent in `[schema]`.
///
/// ```toml
/// [schema]
/// a = "b"                            # single child
/// b = ["c", "d"]                     # list of children
/// c = { e = "positive", f = "" }     # children with slot labels
/// g = []                             # isolated task
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChildrenSpec {
    One(String),
    Many(Vec<String>),
    Slots(BTreeMap<String, String>),
}

impl ChildrenSpec {
    pub fn names(&self) -> Vec<&str> {
        match self {
            ChildrenSpec::One(child) => vec![child.as_str()],
            ChildrenSpec::Many(children) => children.iter().map(|c| c.as_str()).collect(),
            ChildrenSpec::Slots(children) => children.keys().map(|c| c.as_str()).collect(),
        }
    }
}
