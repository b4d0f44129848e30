// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DagError {
    /// The task graph is not a directed acyclic graph.
    #[error("Graph validation error: {0}")]
    GraphValidation(String),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The queue backend refused or failed to accept a job.
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Data store error at '{key}': {reason}")]
    DataStore { key: String, reason: String },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagError>;
