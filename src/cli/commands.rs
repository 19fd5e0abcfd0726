//! CLI command definitions

use crate::agent::{client::DEFAULT_AGENT_ARGS, AgentClientConfig};
use crate::compose::{MUSICIAN_INPUT, STYLE};
use crate::core::config::PipelineConfig;
use crate::core::{StateRecord, Update};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// Run the composition pipeline
#[derive(Debug, Args, Clone)]
pub struct ComposeCommand {
    /// Description of the desired music
    #[arg(short, long)]
    pub description: String,

    /// Musical style
    #[arg(short, long, value_enum, default_value_t = StyleArg::Classical)]
    pub style: StyleArg,

    /// Pipeline definition file (defaults to the built-in pipeline)
    #[arg(short, long)]
    pub pipeline: Option<PathBuf>,

    /// Extra initial fields (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub input: Vec<(String, String)>,

    /// Directory for the generated MIDI file
    #[arg(short, long, env = "COMPOSITOR_OUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Seed for reproducible MIDI output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Agent executable used by prompt stages
    #[arg(long, env = "COMPOSITOR_AGENT", default_value = "pi")]
    pub agent: String,

    /// Argument passed to the agent before the prompt (repeatable)
    #[arg(long = "agent-arg", allow_hyphen_values = true)]
    pub agent_args: Vec<String>,

    /// Agent timeout per prompt, in seconds
    #[arg(long, env = "COMPOSITOR_AGENT_TIMEOUT", default_value_t = 600)]
    pub timeout: u64,

    /// Print every generated text field
    #[arg(long)]
    pub show_text: bool,

    /// Print the final record as JSON
    #[arg(long)]
    pub json: bool,
}

impl ComposeCommand {
    /// Agent configuration from flags and environment
    pub fn agent_config(&self) -> AgentClientConfig {
        let config = AgentClientConfig::new()
            .with_command(self.agent.clone())
            .with_timeout(self.timeout);

        if self.agent_args.is_empty() {
            config.with_args(DEFAULT_AGENT_ARGS)
        } else {
            config.with_args(self.agent_args.clone())
        }
    }

    /// Initial record: description, style, then the extra `--input` fields
    ///
    /// Extra fields may not replace the description or style, nor name a
    /// field some stage of `config` writes.
    pub fn initial_record(&self, config: &PipelineConfig) -> Result<StateRecord> {
        let mut extra = Update::new();
        for (key, value) in &self.input {
            if key == MUSICIAN_INPUT || key == STYLE {
                anyhow::bail!(
                    "--input {} is not allowed; use --description or --style",
                    key
                );
            }
            if let Some(stage) = config.stages.iter().find(|s| &s.output == key) {
                anyhow::bail!("--input {} is written by stage '{}'", key, stage.name);
            }
            extra = extra.text(key.clone(), value.clone());
        }

        Ok(StateRecord::from_texts([
            (MUSICIAN_INPUT, self.description.trim()),
            (STYLE, self.style.label()),
        ])
        .merge(extra))
    }
}

/// Validate a pipeline definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Pipeline definition file (defaults to the built-in pipeline)
    #[arg(short, long)]
    pub pipeline: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show the stage order of a pipeline
#[derive(Debug, Args, Clone)]
pub struct StagesCommand {
    /// Pipeline definition file (defaults to the built-in pipeline)
    #[arg(short, long)]
    pub pipeline: Option<PathBuf>,
}

/// Musical style argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StyleArg {
    Classical,
    Romantic,
    Jazz,
    Pop,
}

impl StyleArg {
    /// Style name as written into the record
    pub fn label(self) -> &'static str {
        match self {
            StyleArg::Classical => "Classical",
            StyleArg::Romantic => "Romantic",
            StyleArg::Jazz => "Jazz",
            StyleArg::Pop => "Pop",
        }
    }
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 || parts[0].is_empty() {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
