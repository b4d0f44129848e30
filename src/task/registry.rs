// src/task/registry.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::model::ConfigFile;

use super::body::TaskBody;
use super::command::CommandTask;

/// Maps task names to the bodies a worker executes for them.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    bodies: HashMap<String, Arc<dyn TaskBody>>,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.bodies.keys().collect();
        names.sort();
        f.debug_struct("TaskRegistry").field("tasks", &names).finish()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`CommandTask`] per `[task.<name>]` section.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut registry = Self::new();
        for (name, tc) in cfg.task.iter() {
            let mut body = CommandTask::new(tc.cmd.clone());
            if let Some(successors) = &tc.on_failure {
                body = body.on_failure(successors.clone());
            }
            registry.register(name.clone(), body);
        }
        registry
    }

    /// Register a body, replacing any previous one for the same name.
    pub fn register(&mut self, name: impl Into<String>, body: impl TaskBody + 'static) {
        self.bodies.insert(name.into(), Arc::new(body));
    }

    pub fn with(mut self, name: impl Into<String>, body: impl TaskBody + 'static) -> Self {
        self.register(name, body);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TaskBody>> {
        self.bodies.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bodies.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
