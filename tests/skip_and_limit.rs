// tests/skip_and_limit.rs

mod common;

use crate::common::builders::DagBuilder;
use crate::common::fake_queue::{produced_by, FakeQueue};
use crate::common::{init_tracing, run_immediate, TestResult};

use dagflow::dag::TaskNode;
use dagflow::queue::JobResult;

fn limited(task: &str, allowed: &[&str]) -> JobResult {
    JobResult::new(produced_by(task)).with_limit(allowed.iter().copied())
}

#[tokio::test]
async fn limit_skips_successors_not_listed() -> TestResult {
    init_tracing();
    let queue = FakeQueue::immediate().with_result("a", limited("a", &["b"]));
    let mut dag = DagBuilder::new("branch").edges("a", &["b", "c"]).build();

    let report = run_immediate(&mut dag, &queue, None).await?;

    assert_eq!(queue.submitted(), vec!["a", "b"]);
    assert_eq!(report.skipped, vec!["c"]);
    assert!(dag.is_skipped(dag.find("c").unwrap()));
    assert!(!dag.is_skipped(dag.find("b").unwrap()));
    Ok(())
}

#[tokio::test]
async fn skip_propagates_when_every_predecessor_is_skipped() -> TestResult {
    init_tracing();
    // a -> {b, c}; c -> d -> e
    let queue = FakeQueue::immediate().with_result("a", limited("a", &["b"]));
    let mut dag = DagBuilder::new("chain")
        .edges("a", &["b", "c"])
        .edges("c", &["d"])
        .edges("d", &["e"])
        .build();

    let report = run_immediate(&mut dag, &queue, None).await?;

    assert_eq!(queue.submitted(), vec!["a", "b"]);
    assert_eq!(report.skipped, vec!["c", "d", "e"]);
    Ok(())
}

#[tokio::test]
async fn predecessor_with_propagation_disabled_does_not_skip_successor() -> TestResult {
    init_tracing();
    let queue = FakeQueue::immediate().with_result("a", limited("a", &["b"]));
    let mut dag = DagBuilder::new("optional")
        .task(TaskNode::new("c").with_propagate_skip(false))
        .edges("a", &["b", "c"])
        .edges("c", &["d"])
        .build();

    let report = run_immediate(&mut dag, &queue, None).await?;

    assert_eq!(report.skipped, vec!["c"]);
    assert_eq!(queue.submitted(), vec!["a", "b", "d"]);

    let d = queue.submission("d").unwrap();
    let from_c = d.input.dataset("c").expect("skipped predecessor still contributes");
    assert!(from_c.is_empty());
    Ok(())
}

#[tokio::test]
async fn join_runs_when_only_some_predecessors_are_skipped() -> TestResult {
    init_tracing();
    // a -> {b, c}; b -> d; c -> d
    let queue = FakeQueue::immediate().with_result("a", limited("a", &["b"]));
    let mut dag = DagBuilder::new("join")
        .edges("a", &["b", "c"])
        .edges("b", &["d"])
        .edges("c", &["d"])
        .build();

    let report = run_immediate(&mut dag, &queue, None).await?;

    assert_eq!(report.skipped, vec!["c"]);
    assert_eq!(queue.submitted(), vec!["a", "b", "d"]);

    let d = queue.submission("d").unwrap();
    assert_eq!(
        d.input.dataset("b").and_then(|data| data.get("produced_by")),
        Some(&serde_json::json!("b"))
    );
    assert!(d.input.dataset("c").unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_limit_skips_every_successor() -> TestResult {
    init_tracing();
    let queue = FakeQueue::immediate().with_result("gate", limited("gate", &[]));
    let mut dag = DagBuilder::new("closed")
        .edges("gate", &["left", "right"])
        .build();

    let report = run_immediate(&mut dag, &queue, None).await?;

    assert_eq!(queue.submitted(), vec!["gate"]);
    assert_eq!(report.skipped, vec!["left", "right"]);
    Ok(())
}

#[tokio::test]
async fn limit_names_that_are_not_successors_are_ignored() -> TestResult {
    init_tracing();
    let queue =
        FakeQueue::immediate().with_result("a", limited("a", &["b", "not_a_successor"]));
    let mut dag = DagBuilder::new("extra").edges("a", &["b"]).build();

    let report = run_immediate(&mut dag, &queue, None).await?;

    assert_eq!(queue.submitted(), vec!["a", "b"]);
    assert!(report.skipped.is_empty());
    Ok(())
}

#[tokio::test]
async fn task_excluded_by_one_predecessor_stays_skipped() -> TestResult {
    init_tracing();
    // a -> c, x -> c; a permits nothing
    let queue = FakeQueue::immediate().with_result("a", limited("a", &[]));
    let mut dag = DagBuilder::new("shared")
        .edges("a", &["c"])
        .edges("x", &["c"])
        .build();

    let report = run_immediate(&mut dag, &queue, None).await?;

    assert_eq!(report.skipped, vec!["c"]);
    let mut submitted = queue.submitted();
    submitted.sort();
    assert_eq!(submitted, vec!["a", "x"]);
    Ok(())
}
