//! Prompt stage - renders a template from record fields and asks the agent

use crate::agent::AgentExecutor;
use crate::core::{RecordError, Stage, StageError, StageSpec, StateRecord, Update};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex is valid")
    })
}

/// Field names referenced as `{{ field }}` in a template, in first-use order
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(template) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Replace every `{{ field }}` with the field's value from the record
pub fn render_template(template: &str, record: &StateRecord) -> Result<String, RecordError> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;

    for caps in placeholder_regex().captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        rendered.push_str(&template[last..whole.start()]);
        rendered.push_str(&record.get(&caps[1])?.render());
        last = whole.end();
    }
    rendered.push_str(&template[last..]);

    Ok(rendered)
}

/// Stage that asks the agent for one piece of text
pub struct PromptStage {
    spec: StageSpec,
    template: String,
    output: String,
    agent: Arc<dyn AgentExecutor>,
}

impl PromptStage {
    /// Create a prompt stage writing `output`
    ///
    /// The stage reads the declared `reads` fields; the template may only
    /// reference those.
    pub fn new(
        name: impl Into<String>,
        reads: Vec<String>,
        output: impl Into<String>,
        template: impl Into<String>,
        agent: Arc<dyn AgentExecutor>,
    ) -> Self {
        let output = output.into();
        Self {
            spec: StageSpec::new(name).reads(reads).writes([output.clone()]),
            template: template.into(),
            output,
            agent,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

#[async_trait]
impl Stage for PromptStage {
    fn spec(&self) -> &StageSpec {
        &self.spec
    }

    async fn run(&self, record: &StateRecord) -> Result<Update, StageError> {
        let prompt = render_template(&self.template, record)?;
        debug!("Prompt for stage {}: {}", self.spec.name, prompt);

        let response = self.agent.execute(&prompt).await?;
        let text = response.text();
        if text.is_empty() {
            return Err(StageError::EmptyResponse);
        }

        info!("Stage {} generated {} bytes for '{}'", self.spec.name, text.len(), self.output);
        Ok(Update::new().text(self.output.clone(), text))
    }
}
