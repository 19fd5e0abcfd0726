use compositor::cli::commands::{ComposeCommand, StagesCommand, ValidateCommand};
use compositor::cli::output::*;
use compositor::cli::{Cli, Command};
use compositor::core::config::{OutputOptions, PipelineConfig};
use compositor::execution::{ExecutionEngine, ExecutionEvent};
use compositor::{AgentClient, FieldValue};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Compose(cmd) => compose(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::Stages(cmd) => show_stages(cmd)?,
    }

    Ok(())
}

async fn compose(cmd: &ComposeCommand) -> Result<()> {
    let description = cmd.description.trim();
    if description.is_empty() {
        println!("{} Please enter a description for your music!", CROSS);
        std::process::exit(1);
    }

    let config = PipelineConfig::load(cmd.pipeline.as_deref())
        .context("Failed to load pipeline definition")?;

    let initial = match cmd.initial_record(&config) {
        Ok(initial) => initial,
        Err(e) => {
            println!("{} {}", CROSS, style(&e).red());
            std::process::exit(1);
        }
    };

    let agent = Arc::new(AgentClient::new(cmd.agent_config()));
    let output = OutputOptions {
        output_dir: cmd.out_dir.clone().unwrap_or_else(std::env::temp_dir),
        seed: cmd.seed,
    };
    let pipeline = config
        .build(agent, &output)
        .context("Failed to assemble pipeline")?;

    let mut engine = ExecutionEngine::new(pipeline);

    let progress = if cmd.json {
        ProgressBar::hidden()
    } else {
        create_progress_bar(engine.pipeline().len())
    };
    let bar = progress.clone();
    engine.add_event_handler(move |event| {
        match &event {
            ExecutionEvent::StageStarted { stage, .. } => bar.set_message(stage.clone()),
            ExecutionEvent::StageCompleted { .. } => bar.inc(1),
            _ => {}
        }
        bar.println(format_execution_event(&event));
    });

    let result = engine.run(initial).await;
    progress.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) if cmd.json => {
            error!("{}", e);
            println!("{}", serde_json::to_string_pretty(&failure_json(&e))?);
            std::process::exit(1);
        }
        Err(e) => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(engine.pipeline().name()).bold(),
                style("failed").red()
            );
            println!("  {}", style(&e).red());
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("\n{}Composition created successfully!", NOTE);
    println!("  Your Input: {}", style(description).bold());
    println!("  Selected Music Style: {}", style(cmd.style.label()).cyan());
    println!("  Duration: {}", style(format_duration(outcome.duration())).dim());
    for (name, value) in outcome.record.iter() {
        if let FieldValue::Path(path) = value {
            println!("  {} saved at: {}", name, style(path.display()).green());
        }
    }

    if cmd.show_text {
        print_generated_text(&outcome, &config.inputs, 20);
    }

    Ok(())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    match PipelineConfig::load(cmd.pipeline.as_deref()) {
        Ok(config) => {
            println!("{} Pipeline definition is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Inputs: {}", style(config.inputs.join(", ")).cyan());
            println!("  Stages: {}", style(config.stages.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

fn show_stages(cmd: &StagesCommand) -> Result<()> {
    let config = PipelineConfig::load(cmd.pipeline.as_deref())
        .context("Failed to load pipeline definition")?;
    print_stage_chain(&config);
    Ok(())
}
