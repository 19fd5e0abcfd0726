//! CLI output formatting

use crate::{
    core::{config::PipelineConfig, ExecutionError, ExecutionStatus, FieldValue, RunOutcome},
    execution::ExecutionEvent,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static NOTE: Emoji<'_, '_> = Emoji("🎵 ", "~ ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar over pipeline stages
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let template = "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}";
    if let Ok(template) = ProgressStyle::default_bar().template(template) {
        progress.set_style(template.progress_chars("#>-"));
    }
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format an execution event for console output
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            pipeline_name,
            total_stages,
            ..
        } => format!(
            "{}Starting {} ({} stages)",
            ROCKET,
            style(pipeline_name).bold(),
            style(total_stages).cyan()
        ),
        ExecutionEvent::StageStarted { index, stage } => format!(
            "  {} {}",
            style(format!("[{}]", index + 1)).dim(),
            style(stage).cyan()
        ),
        ExecutionEvent::StageCompleted { stage, written, .. } => format!(
            "  {}{} wrote {}",
            CHECK,
            style(stage).green(),
            style(written.join(", ")).dim()
        ),
        ExecutionEvent::StageFailed { stage, error } => format!(
            "  {}{} failed: {}",
            CROSS,
            style(stage).red(),
            style(error).red()
        ),
        ExecutionEvent::PipelineCompleted { status, .. } => {
            format!("{}Pipeline {}", INFO, format_status(*status))
        }
    }
}

/// JSON body printed for a failed run
pub fn failure_json(err: &ExecutionError) -> serde_json::Value {
    serde_json::json!({
        "status": ExecutionStatus::Failed,
        "stage": err.stage(),
        "error": err.to_string(),
        "record": err.record(),
    })
}

/// Format text output with a line limit
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();
    if lines.len() <= max_lines {
        output.to_string()
    } else {
        format!(
            "{}\n{}",
            lines[..max_lines].join("\n"),
            style(format!("... ({} more lines)", lines.len() - max_lines)).dim()
        )
    }
}

/// Print the generated text fields of a run, skipping the given inputs
pub fn print_generated_text(outcome: &RunOutcome, inputs: &[String], max_lines: usize) {
    for (name, value) in outcome.record.iter() {
        if inputs.iter().any(|i| i == name) {
            continue;
        }
        if let FieldValue::Text(text) = value {
            println!("\n{}", style(name).bold().underlined());
            println!("{}", format_output(text, max_lines));
        }
    }
}

/// Print the stage chain of a pipeline definition
pub fn print_stage_chain(config: &PipelineConfig) {
    println!("{} {}", INFO, style(&config.name).bold());
    if !config.inputs.is_empty() {
        println!("  inputs: {}", style(config.inputs.join(", ")).cyan());
    }
    for (i, stage) in config.stages.iter().enumerate() {
        println!(
            "  {} {} {} ({}) -> {}",
            style(format!("{}.", i + 1)).dim(),
            style(&stage.name).bold(),
            style(stage.kind.label()).dim(),
            stage.reads.join(", "),
            style(&stage.output).green()
        );
    }
    println!("  {}", style("end").dim());
}

/// Format a duration for display
pub fn format_duration(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
