// tests/cleanup.rs

mod common;

use std::time::Duration;

use serde_json::json;

use crate::common::builders::DagBuilder;
use crate::common::fake_queue::{Completion, FakeQueue};
use crate::common::{init_tracing, run_immediate, TestResult};

use dagflow::queue::Retention;

#[tokio::test]
async fn immediate_retention_releases_every_result() -> TestResult {
    init_tracing();
    let queue = FakeQueue::immediate();
    let mut dag = DagBuilder::new("release")
        .edges("a", &["b", "c"])
        .edges("b", &["d"])
        .build();

    let report = run_immediate(&mut dag, &queue, None).await?;

    let mut forgotten = queue.forgotten();
    forgotten.sort();
    assert_eq!(forgotten, vec!["a", "b", "c", "d"]);
    assert_eq!(report.released, 4);
    Ok(())
}

#[tokio::test]
async fn results_outlive_their_consumers_dispatch() -> TestResult {
    init_tracing();
    let queue = FakeQueue::new(Completion::AfterPolls(3));
    let mut dag = DagBuilder::new("keep")
        .edges("a", &["b"])
        .edges("b", &["c"])
        .build();

    run_immediate(&mut dag, &queue, None).await?;

    for (task, pred) in [("b", "a"), ("c", "b")] {
        let input = queue.submission(task).unwrap().input;
        assert_eq!(
            input.dataset(pred).and_then(|d| d.get("produced_by")),
            Some(&json!(pred)),
            "{task} must see {pred}'s result"
        );
    }
    Ok(())
}

#[tokio::test]
async fn expiring_backend_results_are_not_forgotten() -> TestResult {
    init_tracing();
    let queue = FakeQueue::immediate().with_retention(Retention::After(Duration::from_secs(60)));
    let mut dag = DagBuilder::new("expire")
        .edges("a", &["b"])
        .edges("b", &["c"])
        .build();

    let report = run_immediate(&mut dag, &queue, None).await?;

    assert_eq!(report.dispatched.len(), 3);
    assert_eq!(report.released, 0);
    assert!(queue.forgotten().is_empty());
    Ok(())
}

#[tokio::test]
async fn skipped_successors_do_not_hold_back_release() -> TestResult {
    init_tracing();
    let queue = FakeQueue::immediate().with_result(
        "a",
        dagflow::queue::JobResult::default().with_limit(Vec::<String>::new()),
    );
    let mut dag = DagBuilder::new("skipped").edges("a", &["b"]).build();

    let report = run_immediate(&mut dag, &queue, None).await?;

    assert_eq!(report.skipped, vec!["b"]);
    assert!(queue.is_forgotten("a"));
    Ok(())
}
