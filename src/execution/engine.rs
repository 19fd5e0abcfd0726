//! Main execution engine - walks the stage chain and merges updates

use crate::core::{
    ExecutionError, ExecutionStatus, Next, Pipeline, RunOutcome, StageReport, StateRecord,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
        total_stages: usize,
    },
    StageStarted {
        index: usize,
        stage: String,
    },
    StageCompleted {
        index: usize,
        stage: String,
        written: Vec<String>,
    },
    StageFailed {
        stage: String,
        error: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Runs a pipeline from an initial record to the terminal marker
///
/// Stages run one at a time in declared order; each stage's update is
/// validated and merged before the next stage starts. The first failure
/// aborts the run.
pub struct ExecutionEngine {
    pipeline: Pipeline,
    check_inputs: bool,
    event_handlers: Vec<EventHandler>,
}

impl ExecutionEngine {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            check_inputs: true,
            event_handlers: Vec::new(),
        }
    }

    /// Skip the declared-input pre-check before each stage
    pub fn without_input_check(mut self) -> Self {
        self.check_inputs = false;
        self
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute the pipeline
    pub async fn run(&self, initial: StateRecord) -> Result<RunOutcome, ExecutionError> {
        let execution_id = Uuid::new_v4();
        let pipeline_name = self.pipeline.name().to_string();
        let started_at = Utc::now();

        info!(
            "Starting pipeline execution: {} ({}, {} stages)",
            pipeline_name,
            execution_id,
            self.pipeline.len()
        );
        self.emit_event(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline_name.clone(),
            total_stages: self.pipeline.len(),
        });

        let mut record = initial;
        let mut reports = Vec::with_capacity(self.pipeline.len());
        let mut cursor = self.pipeline.entry();

        while let Next::Stage(index) = cursor {
            let stage = &self.pipeline.stages()[index];
            let spec = stage.spec();

            if self.check_inputs {
                let missing = spec.missing_inputs(&record);
                if !missing.is_empty() {
                    return Err(self.abort(
                        execution_id,
                        ExecutionError::UnsatisfiedInput {
                            stage: spec.name.clone(),
                            missing,
                            record: Box::new(record),
                        },
                    ));
                }
            }

            info!("Running stage {}/{}: {}", index + 1, self.pipeline.len(), spec.name);
            self.emit_event(ExecutionEvent::StageStarted {
                index,
                stage: spec.name.clone(),
            });

            let stage_started = Utc::now();
            let result = stage.run(&record).await;
            let update = match result {
                Ok(update) => update,
                Err(e) => {
                    return Err(self.abort(
                        execution_id,
                        ExecutionError::from_stage(&spec.name, e, record),
                    ));
                }
            };

            let undeclared = spec.undeclared_writes(&update);
            if !undeclared.is_empty() {
                return Err(self.abort(
                    execution_id,
                    ExecutionError::UndeclaredWrite {
                        stage: spec.name.clone(),
                        fields: undeclared,
                        record: Box::new(record),
                    },
                ));
            }

            let written: Vec<String> = update.field_names().map(str::to_string).collect();
            debug!("Stage {} wrote fields: {:?}", spec.name, written);
            record = record.merge(update);

            reports.push(StageReport {
                name: spec.name.clone(),
                written: written.clone(),
                started_at: stage_started,
                completed_at: Utc::now(),
            });
            self.emit_event(ExecutionEvent::StageCompleted {
                index,
                stage: spec.name.clone(),
                written,
            });

            cursor = self.pipeline.successor(index);
        }

        info!("Pipeline execution finished: {} - Completed", pipeline_name);
        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id,
            status: ExecutionStatus::Completed,
        });

        Ok(RunOutcome {
            execution_id,
            pipeline_name,
            record,
            stages: reports,
            started_at,
            completed_at: Utc::now(),
        })
    }

    /// Report a failed run and hand the error back
    fn abort(&self, execution_id: Uuid, err: ExecutionError) -> ExecutionError {
        error!("Pipeline {} aborted at stage {}: {}", self.pipeline.name(), err.stage(), err);
        self.emit_event(ExecutionEvent::StageFailed {
            stage: err.stage().to_string(),
            error: err.to_string(),
        });
        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id,
            status: ExecutionStatus::Failed,
        });
        err
    }
}
