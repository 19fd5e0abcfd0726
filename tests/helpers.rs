//! Test utility functions for compositor

#![allow(dead_code)]

use async_trait::async_trait;
use compositor::core::config::{OutputOptions, PipelineConfig};
use compositor::core::{FnStage, StageError, StageSpec};
use compositor::{
    AgentError, AgentExecutor, AgentResponse, ExecutionEngine, Pipeline, StateRecord, Update,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock agent that returns predefined responses and records prompts
pub struct MockAgent {
    responses: Vec<String>,
    index: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    fail_on: Option<usize>,
}

impl MockAgent {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            index: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    /// Fail the request with this zero-based index
    pub fn failing_on(mut self, request: usize) -> Self {
        self.fail_on = Some(request);
        self
    }

    /// Prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentExecutor for MockAgent {
    async fn execute(&self, prompt: &str) -> Result<AgentResponse, AgentError> {
        let idx = self.index.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if self.fail_on == Some(idx) {
            return Err(AgentError::Api(format!("MockAgent: request {} rejected", idx + 1)));
        }

        match self.responses.get(idx) {
            Some(response) => Ok(AgentResponse::new(response.clone())),
            None => Err(AgentError::Internal(format!(
                "MockAgent: No response available for request {}",
                idx + 1
            ))),
        }
    }
}

/// Shared log of stage invocations
pub type InvocationLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> InvocationLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Stage that logs its invocation and writes `to = prefix + from + suffix`
pub fn concat_stage(
    name: &str,
    from: &'static str,
    to: &'static str,
    prefix: &'static str,
    suffix: &'static str,
    log: &InvocationLog,
) -> FnStage {
    let log = log.clone();
    let stage_name = name.to_string();
    FnStage::new(StageSpec::new(name).reads([from]).writes([to]), move |record| {
        log.lock().unwrap().push(stage_name.clone());
        let value = record.text(from)?;
        Ok(Update::new().text(to, format!("{}{}{}", prefix, value, suffix)))
    })
}

/// Stage that logs its invocation and always fails
pub fn failing_stage(name: &str, writes: &'static str, log: &InvocationLog) -> FnStage {
    let log = log.clone();
    let stage_name = name.to_string();
    FnStage::new(StageSpec::new(name).writes([writes]), move |_| {
        log.lock().unwrap().push(stage_name.clone());
        Err(StageError::Failed(format!("{} could not finish", stage_name)))
    })
}

/// Chain of `n` stages: field_0 -> field_1 -> ... -> field_n
pub fn chain_pipeline(n: usize, log: &InvocationLog, fail_at: Option<usize>) -> Pipeline {
    let mut builder = Pipeline::builder("chain").initial_fields(["field_0"]);
    for i in 1..=n {
        let name = format!("stage_{}", i);
        let from: &'static str = Box::leak(format!("field_{}", i - 1).into_boxed_str());
        let to: &'static str = Box::leak(format!("field_{}", i).into_boxed_str());
        builder = if fail_at == Some(i) {
            builder.stage(failing_stage(&name, to, log))
        } else {
            builder.stage(concat_stage(&name, from, to, "", "+", log))
        };
    }
    builder.build().unwrap()
}

pub fn logged(log: &InvocationLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// The built-in composition pipeline wired to `agent`
pub fn composition_engine(
    agent: Arc<dyn AgentExecutor>,
    out_dir: &Path,
    seed: Option<u64>,
) -> ExecutionEngine {
    let config = PipelineConfig::default_pipeline().unwrap();
    let output = OutputOptions {
        output_dir: out_dir.to_path_buf(),
        seed,
    };
    ExecutionEngine::new(config.build(agent, &output).unwrap())
}

/// Canned responses for the four prompt stages
pub fn composition_responses() -> Vec<String> {
    vec![
        "C4 D4 E4 G4 E4 D4 C4".to_string(),
        "C major, G major, A minor, F major".to_string(),
        "quarter quarter half quarter quarter half whole".to_string(),
        "Jazz arrangement: swung eighths over ii-V-I".to_string(),
    ]
}

pub fn composition_input(description: &str, style: &str) -> StateRecord {
    StateRecord::from_texts([("musician_input", description), ("style", style)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_agent_runs_out_of_responses() {
        let agent = MockAgent::new(vec!["one".to_string()]);
        assert_eq!(agent.execute("a").await.unwrap().content, "one");
        assert!(agent.execute("b").await.is_err());
        assert_eq!(agent.prompts(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_agent_failing_on() {
        let agent = MockAgent::new(vec!["one".to_string(), "two".to_string()]).failing_on(1);
        assert!(agent.execute("a").await.is_ok());
        assert!(matches!(agent.execute("b").await, Err(AgentError::Api(_))));
        assert_eq!(agent.calls(), 2);
    }
}
