//! Test: Construction - malformed pipelines are rejected before running

use crate::helpers::*;
use compositor::core::config::PipelineConfig;
use compositor::{Pipeline, PipelineError};

#[test]
fn test_overlapping_outputs_rejected() {
    let log = new_log();
    let result = Pipeline::builder("overlap")
        .initial_fields(["input"])
        .stage(concat_stage("first", "input", "shared", "", "", &log))
        .stage(concat_stage("second", "input", "shared", "", "", &log))
        .build();

    assert_eq!(
        result.unwrap_err(),
        PipelineError::OverlappingOutputs {
            field: "shared".to_string(),
            first: "first".to_string(),
            second: "second".to_string(),
        }
    );
}

#[test]
fn test_read_before_write_rejected() {
    let log = new_log();
    let result = Pipeline::builder("order")
        .initial_fields(["input"])
        .stage(concat_stage("late", "early_out", "late_out", "", "", &log))
        .stage(concat_stage("early", "input", "early_out", "", "", &log))
        .build();

    match result {
        Err(PipelineError::UnproducedInput { stage, field }) => {
            assert_eq!(stage, "late");
            assert_eq!(field, "early_out");
        }
        other => panic!("unexpected result: {:?}", other.err()),
    }
}

#[test]
fn test_yaml_with_overlapping_outputs_fails_to_build() {
    let yaml = r#"
name: "Overlap"
inputs: [musician_input]
stages:
  - name: one
    kind: prompt
    reads: [musician_input]
    output: melody
    prompt: "Melody for {{ musician_input }}"
  - name: two
    kind: prompt
    reads: [musician_input]
    output: melody
    prompt: "Another melody for {{ musician_input }}"
"#;

    let result = PipelineConfig::from_yaml(yaml);
    assert!(result.is_err());
}

#[test]
fn test_default_pipeline_shape() {
    let config = PipelineConfig::default_pipeline().unwrap();
    let names: Vec<&str> = config.stages.iter().map(|s| s.name.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "melody_generator",
            "harmony_creator",
            "rhythm_analyzer",
            "style_adapter",
            "midi_converter"
        ]
    );
    assert_eq!(config.inputs, vec!["musician_input", "style"]);
}
