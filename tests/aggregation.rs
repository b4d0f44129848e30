// tests/aggregation.rs

mod common;

use serde_json::json;

use crate::common::builders::DagBuilder;
use crate::common::fake_queue::FakeQueue;
use crate::common::{init_tracing, run_immediate, TestResult};

use dagflow::data::{MultiTaskData, TaskData};
use dagflow::queue::JobResult;

fn payload(key: &str, value: i64) -> TaskData {
    let mut data = TaskData::new();
    data.set(key, value);
    data
}

#[tokio::test]
async fn start_tasks_receive_the_initial_payload_unchanged() -> TestResult {
    init_tracing();
    let queue = FakeQueue::immediate();
    let mut dag = DagBuilder::new("roots")
        .edges("left", &["sink"])
        .edges("right", &["sink"])
        .build();

    let mut initial = MultiTaskData::with_dataset("seed", payload("n", 7));
    initial.add_dataset("extra", payload("m", 1), Some(vec!["bonus".to_string()]));

    run_immediate(&mut dag, &queue, Some(initial.clone())).await?;

    assert_eq!(queue.submission("left").unwrap().input, initial);
    assert_eq!(queue.submission("right").unwrap().input, initial);

    let sink = queue.submission("sink").unwrap().input;
    assert_eq!(sink.names().collect::<Vec<_>>(), vec!["left", "right"]);
    assert!(sink.dataset("seed").is_none());
    Ok(())
}

#[tokio::test]
async fn missing_initial_payload_means_empty_input() -> TestResult {
    init_tracing();
    let queue = FakeQueue::immediate();
    let mut dag = DagBuilder::new("empty").edges("a", &["b"]).build();

    run_immediate(&mut dag, &queue, None).await?;

    assert!(queue.submission("a").unwrap().input.is_empty());
    assert_eq!(queue.submission("b").unwrap().input.len(), 1);
    Ok(())
}

#[tokio::test]
async fn slot_labels_become_dataset_aliases() -> TestResult {
    init_tracing();
    let queue = FakeQueue::immediate()
        .with_result("numerator", JobResult::new(payload("value", 10)))
        .with_result("denominator", JobResult::new(payload("value", 2)));
    let mut dag = DagBuilder::new("divide")
        .slots("numerator", &[("divide", "top")])
        .slots("denominator", &[("divide", "bottom")])
        .build();

    run_immediate(&mut dag, &queue, None).await?;

    let input = queue.submission("divide").unwrap().input;
    assert_eq!(
        input.names().collect::<Vec<_>>(),
        vec!["numerator", "denominator"]
    );
    assert_eq!(input.dataset("top").unwrap().get("value"), Some(&json!(10)));
    assert_eq!(input.dataset("bottom").unwrap().get("value"), Some(&json!(2)));
    assert_eq!(
        input.dataset("numerator"),
        input.dataset("top"),
        "name and alias resolve to the same dataset"
    );
    assert_eq!(
        input.default_dataset().unwrap().get("value"),
        Some(&json!(10))
    );
    Ok(())
}

#[tokio::test]
async fn unlabelled_edges_have_no_alias() -> TestResult {
    init_tracing();
    let queue = FakeQueue::immediate();
    let mut dag = DagBuilder::new("plain")
        .slots("a", &[("c", "first")])
        .edges("b", &["c"])
        .build();

    run_immediate(&mut dag, &queue, None).await?;

    let input = queue.submission("c").unwrap().input;
    let aliases: Vec<Vec<String>> = input.iter().map(|d| d.aliases.clone()).collect();
    assert_eq!(aliases, vec![vec!["first".to_string()], Vec::new()]);
    Ok(())
}

#[tokio::test]
async fn successor_sees_each_predecessor_output() -> TestResult {
    init_tracing();
    let queue = FakeQueue::immediate();
    let mut dag = DagBuilder::new("fan_in")
        .edges("a", &["d"])
        .edges("b", &["d"])
        .edges("c", &["d"])
        .build();

    run_immediate(&mut dag, &queue, None).await?;

    let input = queue.submission("d").unwrap().input;
    for name in ["a", "b", "c"] {
        let data = input.dataset(name).expect("dataset per predecessor");
        assert_eq!(data.get("produced_by"), Some(&json!(name)));
    }
    Ok(())
}
