// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Run every semantic check on a raw config.
///
/// Cycles in `[schema]` are deliberately not rejected here: they surface as
/// a graph validation error when the dag is run.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_schema_references(cfg)?;
    validate_failure_limits(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.dag.name.trim().is_empty() {
        return Err(DagError::Configuration(
            "[dag].name must not be empty".to_string(),
        ));
    }
    if cfg.task.is_empty() {
        return Err(DagError::Configuration(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    if cfg.schema.is_empty() {
        return Err(DagError::Configuration(
            "config must contain a non-empty [schema] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    cfg.config.polling_interval()?;
    Ok(())
}

fn validate_schema_references(cfg: &RawConfigFile) -> Result<()> {
    for (parent, children) in cfg.schema.iter() {
        if !cfg.task.contains_key(parent) {
            return Err(DagError::Configuration(format!(
                "[schema] refers to unknown task '{}'",
                parent
            )));
        }
        for child in children.names() {
            if !cfg.task.contains_key(child) {
                return Err(DagError::Configuration(format!(
                    "task '{}' has unknown child '{}' in [schema]",
                    parent, child
                )));
            }
        }
    }
    Ok(())
}

fn validate_failure_limits(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        let Some(successors) = &task.on_failure else {
            continue;
        };
        for succ in successors {
            if !cfg.task.contains_key(succ) {
                return Err(DagError::Configuration(format!(
                    "task '{}' has unknown task '{}' in `on_failure`",
                    name, succ
                )));
            }
        }
    }
    Ok(())
}
