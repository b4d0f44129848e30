// src/signal.rs

//! Signals between running tasks, the scheduler and the outside world.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::errors::Result;

/// Signal collaborator consulted by the scheduler and by task bodies.
pub trait DagSignal: Send + Sync {
    /// Whether a stop was requested. Dispatching stops once this is seen.
    fn is_stopped(&self) -> bool;

    /// Ask for another dag to be started.
    fn run_dag(&self, name: &str) -> Result<()>;
}

/// In-process signal: an atomic stop flag plus a log of `run_dag` requests.
#[derive(Debug, Default)]
pub struct LocalSignal {
    stopped: AtomicBool,
    requested: Mutex<Vec<String>>,
}

impl LocalSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a graceful stop. In-flight jobs are not aborted.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            info!("stop requested");
        }
    }

    /// Dag names requested through [`DagSignal::run_dag`], in request order.
    pub fn requested_dags(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DagSignal for LocalSignal {
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn run_dag(&self, name: &str) -> Result<()> {
        info!(dag = %name, "run_dag requested");
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_string());
        Ok(())
    }
}
