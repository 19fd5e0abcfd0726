//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{ComposeCommand, StagesCommand, ValidateCommand};
use std::ffi::OsString;

/// Compose music by chaining LLM agent prompts into a MIDI file
#[derive(Debug, Parser, Clone)]
#[command(name = "compositor")]
#[command(version)]
#[command(about = "Compose music with an LLM agent and a linear stage pipeline", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the composition pipeline
    Compose(ComposeCommand),

    /// Validate a pipeline definition
    Validate(ValidateCommand),

    /// Show the stage order of a pipeline
    Stages(StagesCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
