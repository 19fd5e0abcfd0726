//! Pipeline domain model - an ordered, linear chain of stages

use crate::core::{error::PipelineError, stage::Stage};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Position reached after a stage finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Run the stage at this index
    Stage(usize),
    /// The pipeline has completed
    Terminal,
}

/// A validated linear pipeline
///
/// Stage `i` is followed by stage `i + 1`; the last stage is followed by
/// [`Next::Terminal`]. Output fields are disjoint across stages.
pub struct Pipeline {
    name: String,
    initial_fields: Vec<String>,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Start building a pipeline
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields the caller is expected to supply
    pub fn initial_fields(&self) -> &[String] {
        &self.initial_fields
    }

    pub fn stages(&self) -> &[Box<dyn Stage>] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Option<&dyn Stage> {
        self.stages.get(index).map(|s| s.as_ref())
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Where execution starts
    pub fn entry(&self) -> Next {
        self.successor_of_position(0)
    }

    /// Successor of the stage at `index`
    pub fn successor(&self, index: usize) -> Next {
        self.successor_of_position(index + 1)
    }

    fn successor_of_position(&self, position: usize) -> Next {
        if position < self.stages.len() {
            Next::Stage(position)
        } else {
            Next::Terminal
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("initial_fields", &self.initial_fields)
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder that validates the stage chain on [`PipelineBuilder::build`]
pub struct PipelineBuilder {
    name: String,
    initial_fields: Option<Vec<String>>,
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial_fields: None,
            stages: Vec::new(),
        }
    }

    /// Declare the fields a run starts with
    ///
    /// When declared, every stage input must be one of these or be written
    /// by an earlier stage.
    pub fn initial_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initial_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Append a stage to the chain
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Append an already boxed stage
    pub fn boxed_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        if self.stages.is_empty() {
            return Err(PipelineError::Empty(self.name));
        }

        let mut names = HashSet::new();
        for stage in &self.stages {
            if !names.insert(stage.name()) {
                return Err(PipelineError::DuplicateStage(stage.name().to_string()));
            }
        }

        let initial: HashSet<&str> = self
            .initial_fields
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();

        // field -> stage that writes it
        let mut writers: HashMap<&str, &str> = HashMap::new();
        for stage in &self.stages {
            let spec = stage.spec();

            if self.initial_fields.is_some() {
                for field in &spec.reads {
                    if !initial.contains(field.as_str()) && !writers.contains_key(field.as_str()) {
                        return Err(PipelineError::UnproducedInput {
                            stage: spec.name.clone(),
                            field: field.clone(),
                        });
                    }
                }
            }

            for field in &spec.writes {
                if initial.contains(field.as_str()) {
                    return Err(PipelineError::OverwritesInitialField {
                        stage: spec.name.clone(),
                        field: field.clone(),
                    });
                }
                if let Some(first) = writers.insert(field.as_str(), spec.name.as_str()) {
                    return Err(PipelineError::OverlappingOutputs {
                        field: field.clone(),
                        first: first.to_string(),
                        second: spec.name.clone(),
                    });
                }
            }
        }

        Ok(Pipeline {
            name: self.name,
            initial_fields: self.initial_fields.unwrap_or_default(),
            stages: self.stages,
        })
    }
}
