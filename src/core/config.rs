//! Pipeline definition from YAML

use crate::agent::AgentExecutor;
use crate::compose::{placeholders, MidiSettings, MidiStage, PromptStage, MIN_TEMPO_BPM};
use crate::core::{Pipeline, Stage};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Pipeline definition shipped with the binary
pub const DEFAULT_PIPELINE_YAML: &str = include_str!("../../pipelines/compositor.yaml");

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Fields the caller supplies when starting a run
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Stages, in execution order
    pub stages: Vec<StageConfig>,
}

/// Stage configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Unique stage name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Fields this stage reads
    #[serde(default)]
    pub reads: Vec<String>,

    /// Field this stage writes
    pub output: String,

    #[serde(flatten)]
    pub kind: StageKind,
}

/// What a stage does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageKind {
    /// Ask the agent, using a `{{ field }}` template
    Prompt { prompt: String },

    /// Render a MIDI file from the single field in `reads`
    Midi {
        #[serde(default = "default_beats")]
        beats: usize,
        #[serde(default = "default_tempo_bpm")]
        tempo_bpm: u32,
    },
}

fn default_beats() -> usize {
    7
}

fn default_tempo_bpm() -> u32 {
    60
}

impl StageKind {
    pub fn label(&self) -> &'static str {
        match self {
            StageKind::Prompt { .. } => "prompt",
            StageKind::Midi { .. } => "midi",
        }
    }
}

impl PipelineConfig {
    /// The embedded composition pipeline
    pub fn default_pipeline() -> Result<Self> {
        Self::from_yaml(DEFAULT_PIPELINE_YAML).context("Embedded pipeline definition is invalid")
    }

    /// Load from a file, or fall back to the embedded definition
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::default_pipeline(),
        }
    }

    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Pipeline name must not be empty");
        }
        if self.stages.is_empty() {
            anyhow::bail!("Pipeline '{}' has no stages", self.name);
        }

        let inputs: HashSet<&str> = self.inputs.iter().map(String::as_str).collect();
        let mut seen_names = HashSet::new();
        // field -> stage that writes it
        let mut writers: HashMap<&str, &str> = HashMap::new();

        for stage in &self.stages {
            if !seen_names.insert(stage.name.as_str()) {
                anyhow::bail!("Duplicate stage name: {}", stage.name);
            }

            for field in &stage.reads {
                if !inputs.contains(field.as_str()) && !writers.contains_key(field.as_str()) {
                    anyhow::bail!(
                        "Stage '{}' reads '{}', which is neither an input \
                         nor written by an earlier stage",
                        stage.name,
                        field
                    );
                }
            }

            if inputs.contains(stage.output.as_str()) {
                anyhow::bail!(
                    "Stage '{}' writes '{}', which is a pipeline input",
                    stage.name,
                    stage.output
                );
            }
            if let Some(first) = writers.insert(stage.output.as_str(), stage.name.as_str()) {
                anyhow::bail!(
                    "Field '{}' is written by both '{}' and '{}'",
                    stage.output,
                    first,
                    stage.name
                );
            }

            match &stage.kind {
                StageKind::Prompt { prompt } => {
                    if prompt.trim().is_empty() {
                        anyhow::bail!("Stage '{}' has an empty prompt", stage.name);
                    }
                    for placeholder in placeholders(prompt) {
                        if !stage.reads.contains(&placeholder) {
                            anyhow::bail!(
                                "Stage '{}' prompt uses '{{{{ {} }}}}' but does not read '{}'",
                                stage.name,
                                placeholder,
                                placeholder
                            );
                        }
                    }
                }
                StageKind::Midi { beats, tempo_bpm } => {
                    if stage.reads.len() != 1 {
                        anyhow::bail!(
                            "MIDI stage '{}' must read exactly one description field",
                            stage.name
                        );
                    }
                    if *beats == 0 {
                        anyhow::bail!("MIDI stage '{}' needs at least one beat", stage.name);
                    }
                    if *tempo_bpm < MIN_TEMPO_BPM {
                        anyhow::bail!(
                            "MIDI stage '{}' needs a tempo of at least {} BPM, got {}",
                            stage.name,
                            MIN_TEMPO_BPM,
                            tempo_bpm
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Assemble the runtime pipeline, handing each stage its collaborators
    pub fn build(&self, agent: Arc<dyn AgentExecutor>, output: &OutputOptions) -> Result<Pipeline> {
        let mut builder = Pipeline::builder(self.name.clone()).initial_fields(self.inputs.clone());

        for stage in &self.stages {
            let built: Box<dyn Stage> = match &stage.kind {
                StageKind::Prompt { prompt } => Box::new(PromptStage::new(
                    stage.name.clone(),
                    stage.reads.clone(),
                    stage.output.clone(),
                    prompt.clone(),
                    agent.clone(),
                )),
                StageKind::Midi { beats, tempo_bpm } => {
                    let description_field = stage.reads.first().with_context(|| {
                        format!("MIDI stage '{}' has no description field", stage.name)
                    })?;
                    Box::new(MidiStage::new(
                        stage.name.clone(),
                        description_field.clone(),
                        stage.output.clone(),
                        MidiSettings {
                            output_dir: output.output_dir.clone(),
                            seed: output.seed,
                            beats: *beats,
                            tempo_bpm: *tempo_bpm,
                        },
                    ))
                }
            };
            builder = builder.boxed_stage(built);
        }

        Ok(builder.build()?)
    }
}

/// Run-time options for stages that write files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    /// Directory for generated files
    pub output_dir: PathBuf,

    /// Fixed seed for reproducible MIDI output
    pub seed: Option<u64>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir(),
            seed: None,
        }
    }
}
