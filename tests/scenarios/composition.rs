//! Test: Composition - the built-in five stage pipeline with a scripted agent

use crate::helpers::*;
use compositor::{ExecutionError, StageError};
use std::sync::Arc;

#[tokio::test]
async fn test_full_composition_run() {
    let dir = tempfile::tempdir().unwrap();
    let agent = Arc::new(MockAgent::new(composition_responses()));
    let engine = composition_engine(agent.clone(), dir.path(), Some(42));

    let outcome = engine
        .run(composition_input("A calm major lullaby", "Jazz"))
        .await
        .unwrap();

    assert_eq!(
        outcome.stage_order(),
        vec![
            "melody_generator",
            "harmony_creator",
            "rhythm_analyzer",
            "style_adapter",
            "midi_converter"
        ]
    );

    let record = &outcome.record;
    assert_eq!(record.text("melody").unwrap(), "C4 D4 E4 G4 E4 D4 C4");
    assert_eq!(record.text("harmony").unwrap(), "C major, G major, A minor, F major");
    assert_eq!(record.text("composition").unwrap(), "Jazz arrangement: swung eighths over ii-V-I");

    let midi = record.path("midi_file").unwrap();
    assert!(midi.starts_with(dir.path()));
    assert_eq!(midi.extension().and_then(|e| e.to_str()), Some("mid"));

    let bytes = std::fs::read(midi).unwrap();
    let smf = midly::Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 3);
}

#[tokio::test]
async fn test_prompts_rendered_from_record() {
    let dir = tempfile::tempdir().unwrap();
    let agent = Arc::new(MockAgent::new(composition_responses()));
    let engine = composition_engine(agent.clone(), dir.path(), Some(1));

    engine
        .run(composition_input("a rainy afternoon", "Romantic"))
        .await
        .unwrap();

    let prompts = agent.prompts();
    assert_eq!(prompts.len(), 4);
    assert_eq!(
        prompts[0],
        "Generate a melody based on this input: a rainy afternoon. \
         Represent it as a string of notes in music21 format."
    );
    assert!(prompts[1].starts_with("Create harmony for this melody: C4 D4 E4 G4 E4 D4 C4."));
    assert!(prompts[2].contains("C4 D4 E4 G4 E4 D4 C4, C major, G major, A minor, F major"));
    assert!(prompts[3].starts_with("Adapt this composition to the Romantic style:"));
    assert!(prompts[3].contains("Rhythm: quarter quarter half quarter quarter half whole"));
}

#[tokio::test]
async fn test_seeded_runs_write_identical_midi() {
    let dir = tempfile::tempdir().unwrap();

    let mut files = Vec::new();
    let mut texts = Vec::new();
    for _ in 0..2 {
        let agent = Arc::new(MockAgent::new(composition_responses()));
        let engine = composition_engine(agent, dir.path(), Some(7));
        let outcome = engine
            .run(composition_input("a sad minor waltz", "Classical"))
            .await
            .unwrap();

        files.push(std::fs::read(outcome.record.path("midi_file").unwrap()).unwrap());
        texts.push(outcome.record.text("composition").unwrap().to_string());
    }

    assert_eq!(files[0], files[1]);
    assert_eq!(texts[0], texts[1]);
}

#[tokio::test]
async fn test_agent_error_stops_composition() {
    let dir = tempfile::tempdir().unwrap();
    let agent = Arc::new(MockAgent::new(composition_responses()).failing_on(1));
    let engine = composition_engine(agent.clone(), dir.path(), Some(3));

    let err = engine
        .run(composition_input("anything", "Pop"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), "harmony_creator");
    assert!(matches!(
        &err,
        ExecutionError::StageFailed { source: StageError::Agent(_), .. }
    ));
    assert!(err.record().contains("melody"));
    assert!(!err.record().contains("harmony"));
    assert_eq!(agent.calls(), 2);

    // midi_converter never ran
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_blank_agent_reply_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let agent = Arc::new(MockAgent::new(vec!["   \n".to_string()]));
    let engine = composition_engine(agent, dir.path(), None);

    let err = engine
        .run(composition_input("anything", "Pop"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), "melody_generator");
    assert!(matches!(
        err,
        ExecutionError::StageFailed { source: StageError::EmptyResponse, .. }
    ));
}
