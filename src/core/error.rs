//! Error types for records, stages, pipeline construction and execution

use crate::agent::AgentError;
use crate::core::record::StateRecord;
use thiserror::Error;

/// Errors reading from a state record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Field '{field}' has not been produced yet")]
    MissingField { field: String },

    #[error("Field '{field}' holds a {found} value, expected {expected}")]
    WrongKind {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors raised by a stage's own work
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MIDI error: {0}")]
    Midi(String),

    #[error("Agent returned an empty response")]
    EmptyResponse,

    #[error("{0}")]
    Failed(String),
}

/// Errors detected while assembling a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Pipeline '{0}' has no stages")]
    Empty(String),

    #[error("Duplicate stage name: {0}")]
    DuplicateStage(String),

    #[error("Field '{field}' is written by both '{first}' and '{second}'")]
    OverlappingOutputs {
        field: String,
        first: String,
        second: String,
    },

    #[error("Stage '{stage}' writes initial field '{field}'")]
    OverwritesInitialField { stage: String, field: String },

    #[error("Stage '{stage}' reads '{field}', which no earlier stage or initial field provides")]
    UnproducedInput { stage: String, field: String },
}

/// Errors that abort a pipeline run
///
/// Every variant names the stage that was about to run (or running) and
/// carries the record as it was before that stage started.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Stage '{stage}' read missing field '{field}'")]
    MissingField {
        stage: String,
        field: String,
        record: Box<StateRecord>,
    },

    #[error("Stage '{stage}' is missing declared inputs: {}", .missing.join(", "))]
    UnsatisfiedInput {
        stage: String,
        missing: Vec<String>,
        record: Box<StateRecord>,
    },

    #[error("Stage '{stage}' wrote undeclared fields: {}", .fields.join(", "))]
    UndeclaredWrite {
        stage: String,
        fields: Vec<String>,
        record: Box<StateRecord>,
    },

    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: StageError,
        record: Box<StateRecord>,
    },
}

impl ExecutionError {
    /// Build the error for a failed stage invocation
    ///
    /// A missing field read inside the stage is reported as such rather
    /// than as a generic stage failure.
    pub fn from_stage(stage: &str, error: StageError, record: StateRecord) -> Self {
        match error {
            StageError::Record(RecordError::MissingField { field }) => {
                ExecutionError::MissingField {
                    stage: stage.to_string(),
                    field,
                    record: Box::new(record),
                }
            }
            source => ExecutionError::StageFailed {
                stage: stage.to_string(),
                source,
                record: Box::new(record),
            },
        }
    }

    /// Name of the stage the run stopped at
    pub fn stage(&self) -> &str {
        match self {
            ExecutionError::MissingField { stage, .. }
            | ExecutionError::UnsatisfiedInput { stage, .. }
            | ExecutionError::UndeclaredWrite { stage, .. }
            | ExecutionError::StageFailed { stage, .. } => stage,
        }
    }

    /// Record as of just before the failing stage ran
    pub fn record(&self) -> &StateRecord {
        match self {
            ExecutionError::MissingField { record, .. }
            | ExecutionError::UnsatisfiedInput { record, .. }
            | ExecutionError::UndeclaredWrite { record, .. }
            | ExecutionError::StageFailed { record, .. } => record,
        }
    }

    /// Take ownership of the carried record
    pub fn into_record(self) -> StateRecord {
        match self {
            ExecutionError::MissingField { record, .. }
            | ExecutionError::UnsatisfiedInput { record, .. }
            | ExecutionError::UndeclaredWrite { record, .. }
            | ExecutionError::StageFailed { record, .. } => *record,
        }
    }
}
