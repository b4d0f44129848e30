#![allow(dead_code)]

use std::collections::BTreeMap;

use dagflow::config::{
    ChildrenSpec, ConfigFile, DagConfig, DagSection, RawConfigFile, TaskConfig,
};
use dagflow::dag::{Children, Dag, NodeId, Schema, TaskNode, DEFAULT_QUEUE};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(dag_name: &str) -> Self {
        Self {
            config: RawConfigFile {
                config: DagConfig::immediate(),
                dag: DagSection {
                    name: dag_name.to_string(),
                    autostart: true,
                    workflow: None,
                },
                task: BTreeMap::new(),
                schema: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_children(mut self, parent: &str, children: &[&str]) -> Self {
        let spec = ChildrenSpec::Many(children.iter().map(|c| c.to_string()).collect());
        self.config.schema.insert(parent.to_string(), spec);
        self
    }

    pub fn with_slots(mut self, parent: &str, children: &[(&str, &str)]) -> Self {
        let spec = ChildrenSpec::Slots(
            children
                .iter()
                .map(|(c, label)| (c.to_string(), label.to_string()))
                .collect(),
        );
        self.config.schema.insert(parent.to_string(), spec);
        self
    }

    pub fn with_polling_time(mut self, secs: f64) -> Self {
        self.config.config.dag_polling_time = secs;
        self
    }

    pub fn with_result_expires(mut self, secs: u64) -> Self {
        self.config.config.result_expires = secs;
        self
    }

    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.config.dag.autostart = autostart;
        self
    }

    pub fn with_workflow(mut self, workflow: &str) -> Self {
        self.config.dag.workflow = Some(workflow.to_string());
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                queue: DEFAULT_QUEUE.to_string(),
                propagate_skip: true,
                on_failure: None,
            },
        }
    }

    pub fn queue(mut self, queue: &str) -> Self {
        self.task.queue = queue.to_string();
        self
    }

    pub fn propagate_skip(mut self, val: bool) -> Self {
        self.task.propagate_skip = val;
        self
    }

    pub fn on_failure(mut self, successors: &[&str]) -> Self {
        self.task.on_failure = Some(successors.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Builds a `Dag` by task name instead of by handle.
///
/// Tasks referenced only in edges are registered on first use, in the order
/// they are first mentioned.
pub struct DagBuilder {
    dag: Dag,
    edges: Vec<(String, Vec<(String, Option<String>)>)>,
}

impl DagBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            dag: Dag::new(name),
            edges: Vec::new(),
        }
    }

    /// Register a task explicitly, e.g. to set its queue or skip propagation.
    pub fn task(mut self, task: TaskNode) -> Self {
        self.dag.add_task(task);
        self
    }

    pub fn edges(mut self, parent: &str, children: &[&str]) -> Self {
        let children = children.iter().map(|c| (c.to_string(), None)).collect();
        self.edges.push((parent.to_string(), children));
        self
    }

    pub fn slots(mut self, parent: &str, children: &[(&str, &str)]) -> Self {
        let children = children
            .iter()
            .map(|(c, label)| (c.to_string(), Some(label.to_string())))
            .collect();
        self.edges.push((parent.to_string(), children));
        self
    }

    /// Isolated task with no edges.
    pub fn alone(mut self, name: &str) -> Self {
        self.edges.push((name.to_string(), Vec::new()));
        self
    }

    pub fn build(mut self) -> Dag {
        let mut schema = Schema::new();
        for (parent, children) in std::mem::take(&mut self.edges) {
            let parent_id = self.id_of(&parent);
            let children = if children.is_empty() {
                Children::None
            } else {
                Children::Slots(
                    children
                        .into_iter()
                        .map(|(c, label)| (self.id_of(&c), label))
                        .collect(),
                )
            };
            schema.insert(parent_id, children);
        }
        self.dag
            .define(&schema)
            .expect("Failed to define dag from builder");
        self.dag
    }

    fn id_of(&mut self, name: &str) -> NodeId {
        match self.dag.find(name) {
            Some(id) => id,
            None => self.dag.add_task(TaskNode::new(name)),
        }
    }
}
