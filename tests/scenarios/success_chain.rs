//! Test: Success Chain - stages run in declared order and every update lands

use crate::helpers::*;
use compositor::core::{FnStage, StageSpec};
use compositor::{ExecutionEngine, FieldValue, Pipeline, StateRecord, Update};

/// Two stages A: x = "x:" + input, B: y = x + "!"
#[tokio::test]
async fn test_two_stage_chain() {
    let log = new_log();
    let pipeline = Pipeline::builder("two")
        .initial_fields(["input"])
        .stage(concat_stage("A", "input", "x", "x:", "", &log))
        .stage(concat_stage("B", "x", "y", "", "!", &log))
        .build()
        .unwrap();

    let outcome = ExecutionEngine::new(pipeline)
        .run(StateRecord::from_texts([("input", "hi")]))
        .await
        .unwrap();

    assert_eq!(
        outcome.record,
        StateRecord::from_texts([("input", "hi"), ("x", "x:hi"), ("y", "x:hi!")])
    );
    assert_eq!(outcome.stage_order(), vec!["A", "B"]);
    assert_eq!(logged(&log), vec!["A", "B"]);
}

/// N stages: exactly N invocations, in order, one field each
#[tokio::test]
async fn test_each_stage_invoked_once_in_order() {
    let log = new_log();
    let engine = ExecutionEngine::new(chain_pipeline(6, &log, None));

    let outcome = engine
        .run(StateRecord::from_texts([("field_0", "seed")]))
        .await
        .unwrap();

    let expected: Vec<String> = (1..=6).map(|i| format!("stage_{}", i)).collect();
    assert_eq!(logged(&log), expected);
    assert_eq!(outcome.record.len(), 7);
    assert_eq!(outcome.record.text("field_6").unwrap(), "seed++++++");
    for report in &outcome.stages {
        assert_eq!(report.written.len(), 1);
    }
}

/// The initial record survives untouched alongside stage outputs
#[tokio::test]
async fn test_initial_fields_preserved() {
    let log = new_log();
    let engine = ExecutionEngine::new(chain_pipeline(2, &log, None));

    let initial = StateRecord::from_texts([("field_0", "a"), ("unrelated", "kept")]);
    let outcome = engine.run(initial.clone()).await.unwrap();

    for (name, value) in initial.iter() {
        assert_eq!(outcome.record.get(name).unwrap(), value);
    }
}

/// Same pipeline, same input: identical final records
#[tokio::test]
async fn test_runs_are_deterministic() {
    let log = new_log();
    let engine = ExecutionEngine::new(chain_pipeline(4, &log, None));
    let initial = StateRecord::from_texts([("field_0", "same")]);

    let first = engine.run(initial.clone()).await.unwrap();
    let second = engine.run(initial).await.unwrap();

    assert_eq!(first.record, second.record);
    assert_eq!(
        serde_json::to_string(&first.record).unwrap(),
        serde_json::to_string(&second.record).unwrap()
    );
}

/// A stage may write several fields in one update
#[tokio::test]
async fn test_multi_field_update() {
    let split = FnStage::new(
        StageSpec::new("split").reads(["pair"]).writes(["left", "right"]),
        |record| {
            let pair = record.text("pair")?;
            let (left, right) = pair.split_once('/').unwrap_or((pair, ""));
            Ok(Update::new().text("left", left).text("right", right))
        },
    );
    let pipeline = Pipeline::builder("split")
        .initial_fields(["pair"])
        .stage(split)
        .build()
        .unwrap();

    let outcome = ExecutionEngine::new(pipeline)
        .run(StateRecord::from_texts([("pair", "C/G")]))
        .await
        .unwrap();

    assert_eq!(outcome.record.get("left").unwrap(), &FieldValue::Text("C".into()));
    assert_eq!(outcome.record.text("right").unwrap(), "G");
    assert_eq!(outcome.stages[0].written, vec!["left", "right"]);
}
