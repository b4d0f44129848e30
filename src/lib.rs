// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod data;
pub mod errors;
pub mod logging;
pub mod queue;
pub mod signal;
pub mod store;
pub mod task;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::Dag;
use crate::queue::LocalQueue;
use crate::signal::LocalSignal;
use crate::store::{DataStore, MemoryDataStore};
use crate::task::TaskRegistry;

/// High-level entry point used by `main.rs`.
///
/// Loads the config, builds the dag template and runs one copy of it on the
/// in-process queue backend with an in-memory data store. Ctrl-C requests a
/// graceful stop.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading config from '{}'", args.config))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let mut template = Dag::from_config(&cfg)?;
    if !template.autostart() {
        info!(dag = %template.name(), "dag has autostart = false; nothing to run");
        return Ok(());
    }

    let store: Arc<dyn DataStore> = Arc::new(MemoryDataStore::new());
    let signal = Arc::new(LocalSignal::new());
    let backend = LocalQueue::new(
        TaskRegistry::from_config(&cfg),
        Arc::clone(&store),
        signal.clone(),
        cfg.config.retention(),
    );

    tokio::spawn(stop_on_ctrl_c(Arc::clone(&signal)));

    let workflow_id = args
        .workflow_id
        .unwrap_or_else(|| format!("{}-{}", template.name(), std::process::id()));

    let mut dag = template.instantiate();
    let report = dag
        .run(Some(&cfg.config), &workflow_id, &backend, signal.as_ref(), None)
        .await?;

    info!(
        dag = %dag.name(),
        workflow_id = %workflow_id,
        dispatched = ?report.dispatched,
        skipped = ?report.skipped,
        stopped = report.stopped,
        "workflow finished"
    );

    for name in signal.requested_dags() {
        warn!(dag = %name, "run_dag request ignored: only a single dag is run per invocation");
    }

    Ok(())
}

/// First Ctrl-C stops dispatching. Jobs already submitted still finish.
async fn stop_on_ctrl_c(signal: Arc<LocalSignal>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => signal.stop(),
        Err(e) => warn!(error = %e, "cannot listen for Ctrl-C; graceful stop disabled"),
    }
}

/// Simple dry-run output: print settings, tasks and edges.
fn print_dry_run(cfg: &ConfigFile) {
    println!("dagflow dry-run");
    println!("  dag.name = {}", cfg.dag.name);
    println!("  dag.autostart = {}", cfg.dag.autostart);
    if let Some(ref workflow) = cfg.dag.workflow {
        println!("  dag.workflow = {workflow}");
    }
    println!("  config.dag_polling_time = {}", cfg.config.dag_polling_time);
    println!("  config.result_expires = {}", cfg.config.result_expires);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        println!("      queue: {}", task.queue);
        if !task.propagate_skip {
            println!("      propagate_skip: false");
        }
        if let Some(ref successors) = task.on_failure {
            println!("      on_failure: {:?}", successors);
        }
    }
    println!();

    println!("schema:");
    for (parent, children) in cfg.schema.iter() {
        println!("  {parent} -> {:?}", children.names());
    }

    debug!("dry-run complete (no execution)");
}
