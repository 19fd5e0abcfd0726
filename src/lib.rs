//! compositor - a linear stage pipeline that composes music with an LLM agent

pub mod agent;
pub mod cli;
pub mod compose;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use agent::{AgentClient, AgentClientConfig, AgentError, AgentExecutor, AgentResponse};
pub use core::{
    ExecutionError, FieldValue, Next, Pipeline, PipelineError, RecordError, RunOutcome, Stage,
    StageError, StageSpec, StateRecord, Update,
};
pub use execution::{ExecutionEngine, ExecutionEvent};
