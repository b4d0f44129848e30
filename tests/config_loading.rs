// tests/config_loading.rs

mod common;

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::fake_queue::FakeQueue;
use crate::common::{init_tracing, run_immediate, TestResult};

use dagflow::config::{load_and_validate, load_from_path, ChildrenSpec, ConfigFile, DagConfig};
use dagflow::dag::Dag;
use dagflow::errors::DagError;
use dagflow::queue::Retention;
use dagflow::task::TaskRegistry;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(contents: &str, needle: &str) {
    let file = write_config(contents);
    match load_and_validate(file.path()) {
        Err(DagError::Configuration(msg)) => {
            assert!(msg.contains(needle), "expected '{needle}' in: {msg}");
        }
        Err(e) => panic!("Expected Configuration error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

const PIPELINE: &str = r#"
[config]
dag_polling_time = 0.1
result_expires = 30

[dag]
name = "pipeline"
workflow = "nightly"

[task.extract]
cmd = "echo extract"
queue = "io"

[task.transform]
cmd = "echo transform"
on_failure = ["alert"]

[task.load]
cmd = "echo load"
propagate_skip = false

[task.alert]
cmd = "echo alert"

[schema]
extract = "transform"
transform = { load = "rows", alert = "" }
"#;

#[test]
fn full_config_is_loaded_and_validated() {
    let file = write_config(PIPELINE);

    let cfg = load_and_validate(file.path()).expect("valid config");

    assert_eq!(cfg.dag.name, "pipeline");
    assert!(cfg.dag.autostart);
    assert_eq!(cfg.dag.workflow.as_deref(), Some("nightly"));
    assert_eq!(cfg.config.polling_interval().unwrap(), Duration::from_millis(100));
    assert_eq!(cfg.config.retention(), Retention::After(Duration::from_secs(30)));

    assert_eq!(cfg.task["extract"].queue, "io");
    assert_eq!(cfg.task["transform"].queue, "task");
    assert!(!cfg.task["load"].propagate_skip);
    assert_eq!(
        cfg.task["transform"].on_failure,
        Some(vec!["alert".to_string()])
    );
    assert_eq!(cfg.schema["extract"], ChildrenSpec::One("transform".into()));
    assert_eq!(cfg.schema["transform"].names(), vec!["alert", "load"]);
}

#[test]
fn dag_built_from_config_has_matching_shape() {
    let file = write_config(PIPELINE);
    let cfg = load_and_validate(file.path()).unwrap();

    let dag = Dag::from_config(&cfg).unwrap();

    let id = |name: &str| dag.find(name).unwrap();
    assert_eq!(dag.name(), "pipeline");
    assert_eq!(dag.workflow_name(), Some("nightly"));
    assert!(dag.graph().has_edge(id("extract"), id("transform")));
    assert!(dag.graph().has_edge(id("transform"), id("load")));
    assert!(dag.graph().has_edge(id("transform"), id("alert")));
    assert_eq!(dag.graph().slot(id("load"), id("transform")), Some("rows"));
    assert_eq!(dag.graph().slot(id("alert"), id("transform")), None);
    assert_eq!(dag.task(id("extract")).unwrap().queue, "io");
    assert!(!dag.task(id("load")).unwrap().propagate_skip);
}

#[test]
fn registry_gets_one_command_per_task() {
    let file = write_config(PIPELINE);
    let cfg = load_and_validate(file.path()).unwrap();

    let registry = TaskRegistry::from_config(&cfg);

    assert_eq!(registry.len(), 4);
    for name in ["extract", "transform", "load", "alert"] {
        assert!(registry.contains(name), "missing body for {name}");
    }
}

#[test]
fn defaults_apply_when_sections_are_omitted() {
    let file = write_config(
        r#"
[dag]
name = "tiny"

[task.only]
cmd = "true"

[schema]
only = []
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.config, DagConfig::default());
    assert_eq!(cfg.config.dag_polling_time, 0.5);
    assert_eq!(cfg.config.retention(), Retention::Immediate);
    assert_eq!(cfg.schema["only"], ChildrenSpec::Many(Vec::new()));
}

#[test]
fn unknown_child_is_rejected() {
    expect_config_error(
        r#"
[dag]
name = "d"

[task.a]
cmd = "echo a"

[schema]
a = ["ghost"]
"#,
        "unknown child 'ghost'",
    );
}

#[test]
fn unknown_parent_is_rejected() {
    expect_config_error(
        r#"
[dag]
name = "d"

[task.a]
cmd = "echo a"

[schema]
ghost = "a"
"#,
        "unknown task 'ghost'",
    );
}

#[test]
fn unknown_on_failure_target_is_rejected() {
    expect_config_error(
        r#"
[dag]
name = "d"

[task.a]
cmd = "echo a"
on_failure = ["ghost"]

[schema]
a = []
"#,
        "on_failure",
    );
}

#[test]
fn missing_schema_is_rejected() {
    expect_config_error(
        r#"
[dag]
name = "d"

[task.a]
cmd = "echo a"
"#,
        "[schema]",
    );
}

#[test]
fn empty_dag_name_is_rejected() {
    expect_config_error(
        r#"
[dag]
name = "  "

[task.a]
cmd = "echo a"

[schema]
a = []
"#,
        "[dag].name",
    );
}

#[test]
fn negative_polling_time_is_rejected() {
    expect_config_error(
        r#"
[config]
dag_polling_time = -0.5

[dag]
name = "d"

[task.a]
cmd = "echo a"

[schema]
a = []
"#,
        "dag_polling_time",
    );
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_config("[dag\nname = ");

    let err = load_from_path(file.path()).expect_err("invalid toml");

    assert!(matches!(err, DagError::Toml(_)), "got {err:?}");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = load_and_validate(dir.path().join("absent.toml")).expect_err("no file");

    assert!(matches!(err, DagError::Io(_)), "got {err:?}");
}

#[test]
fn cyclic_schema_passes_validation_but_fails_at_run() {
    let file = write_config(
        r#"
[dag]
name = "loop"

[task.a]
cmd = "echo a"

[task.b]
cmd = "echo b"

[schema]
a = "b"
b = "a"
"#,
    );

    let cfg = load_and_validate(file.path()).expect("cycles are checked at run time");
    assert!(Dag::from_config(&cfg).is_ok());
}

#[tokio::test]
async fn builder_config_runs_end_to_end() -> TestResult {
    init_tracing();
    let cfg: ConfigFile = ConfigFileBuilder::new("built")
        .with_task("a", TaskConfigBuilder::new("echo a").queue("fast").build())
        .with_task("b", TaskConfigBuilder::new("echo b").build())
        .with_task("c", TaskConfigBuilder::new("echo c").build())
        .with_slots("a", &[("b", "left")])
        .with_children("b", &["c"])
        .build();

    let mut template = Dag::from_config(&cfg)?;
    let mut dag = template.instantiate();
    let queue = FakeQueue::immediate();

    run_immediate(&mut dag, &queue, None).await?;

    assert_eq!(queue.submitted(), vec!["a", "b", "c"]);
    assert_eq!(queue.submission("a").unwrap().queue, "fast");
    assert!(queue.submission("b").unwrap().input.dataset("left").is_some());
    Ok(())
}

#[test]
fn builder_rejects_invalid_raw_config() {
    let raw = ConfigFileBuilder::new("bad")
        .with_task("a", TaskConfigBuilder::new("echo a").on_failure(&["nope"]).build())
        .with_children("a", &[])
        .build_raw();

    assert!(ConfigFile::try_from(raw).is_err());
}
