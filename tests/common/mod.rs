#![allow(dead_code)]

pub use dagflow_test_utils::builders;
pub use dagflow_test_utils::fake_queue;
pub use dagflow_test_utils::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};

use dagflow::config::DagConfig;
use dagflow::dag::{Dag, RunReport};
use dagflow::data::MultiTaskData;
use dagflow::errors::Result;
use dagflow::queue::QueueBackend;
use dagflow::signal::{DagSignal, LocalSignal};

pub type TestResult = std::result::Result<(), Box<dyn Error>>;

/// Run `dag` with a config that polls without sleeping, under a timeout.
pub async fn run_immediate(
    dag: &mut Dag,
    backend: &dyn QueueBackend,
    data: Option<MultiTaskData>,
) -> Result<RunReport> {
    let signal = LocalSignal::new();
    let config = DagConfig::immediate();
    with_timeout(dag.run(Some(&config), "wf-test", backend, &signal, data)).await
}

/// Signal that reports "stopped" once it has been polled `after` times.
#[derive(Debug)]
pub struct StopAfter {
    after: usize,
    polls: AtomicUsize,
}

impl StopAfter {
    pub fn new(after: usize) -> Self {
        Self {
            after,
            polls: AtomicUsize::new(0),
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl DagSignal for StopAfter {
    fn is_stopped(&self) -> bool {
        self.polls.fetch_add(1, Ordering::SeqCst) >= self.after
    }

    fn run_dag(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}
