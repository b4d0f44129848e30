// src/task/command.rs

//! Task body that runs a shell command.

use std::process::Stdio;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::body::{Action, BoxFuture, TaskBody, TaskContext};

/// Runs `cmd` through the platform shell.
///
/// - The task input is written to stdin as JSON.
/// - `DAGFLOW_TASK`, `DAGFLOW_WORKFLOW_ID` and `DAGFLOW_DAG` are set in the
///   environment.
/// - The output is the default input dataset extended with `stdout` (list of
///   lines) and `exit_code`.
/// - On a non-zero exit the `on_failure` successor list, if any, becomes
///   the limit of the result.
#[derive(Debug, Clone)]
pub struct CommandTask {
    cmd: String,
    on_failure: Option<Vec<String>>,
}

impl CommandTask {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            on_failure: None,
        }
    }

    pub fn on_failure(mut self, successors: Vec<String>) -> Self {
        self.on_failure = Some(successors);
        self
    }

    async fn execute(&self, ctx: TaskContext) -> Result<Action> {
        info!(
            task = %ctx.name(),
            workflow_id = %ctx.workflow_id,
            cmd = %self.cmd,
            "starting task process"
        );

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.env("DAGFLOW_TASK", ctx.name())
            .env("DAGFLOW_WORKFLOW_ID", &ctx.workflow_id)
            .env("DAGFLOW_DAG", ctx.task.dag_name.as_deref().unwrap_or_default())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for task '{}'", ctx.name()))?;

        let input = serde_json::to_vec(&ctx.data)
            .with_context(|| format!("serialising input of task '{}'", ctx.name()))?;

        // Written from a separate task so a child that never reads stdin
        // cannot stall on a full stdout pipe.
        if let Some(mut stdin) = child.stdin.take() {
            let task_name = ctx.name().to_string();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&input).await {
                    debug!(task = %task_name, error = %e, "task process did not consume its input");
                }
            });
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("waiting for process of task '{}'", ctx.name()))?;

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!(task = %ctx.name(), "stderr: {}", line);
        }

        let code = output.status.code().unwrap_or(-1);
        let stdout: Vec<Value> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| Value::String(line.to_string()))
            .collect();

        let mut data = ctx.default_data();
        data.set("stdout", stdout);
        data.set("exit_code", code);

        info!(
            task = %ctx.name(),
            workflow_id = %ctx.workflow_id,
            exit_code = code,
            success = output.status.success(),
            "task process exited"
        );

        let action = Action::new(data);
        if output.status.success() {
            return Ok(action);
        }

        match &self.on_failure {
            Some(successors) => {
                warn!(
                    task = %ctx.name(),
                    exit_code = code,
                    ?successors,
                    "task failed; limiting successors"
                );
                Ok(action.limit(successors.iter().cloned()))
            }
            None => {
                warn!(task = %ctx.name(), exit_code = code, "task failed");
                Ok(action)
            }
        }
    }
}

impl TaskBody for CommandTask {
    fn run(&self, ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<Action>> {
        Box::pin(self.execute(ctx))
    }
}
