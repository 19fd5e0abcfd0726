//! Stage contract

use crate::core::{
    error::StageError,
    record::{StateRecord, Update},
};
use async_trait::async_trait;
use std::fmt;

/// Identity and declared data flow of a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    /// Unique stage name within a pipeline
    pub name: String,

    /// Fields the stage reads
    pub reads: Vec<String>,

    /// Fields the stage writes
    pub writes: Vec<String>,
}

impl StageSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    pub fn reads<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        push_unique(&mut self.reads, fields);
        self
    }

    pub fn writes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        push_unique(&mut self.writes, fields);
        self
    }

    /// Declared inputs not present in the record
    pub fn missing_inputs(&self, record: &StateRecord) -> Vec<String> {
        self.reads
            .iter()
            .filter(|field| !record.contains(field))
            .cloned()
            .collect()
    }

    /// Fields in an update that the stage did not declare
    pub fn undeclared_writes(&self, update: &Update) -> Vec<String> {
        update
            .field_names()
            .filter(|field| !self.writes.iter().any(|w| w.as_str() == *field))
            .map(str::to_string)
            .collect()
    }
}

// Declared fields are a set; repeats are dropped, first position wins
fn push_unique<I, S>(target: &mut Vec<String>, fields: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for field in fields {
        let field = field.into();
        if !target.contains(&field) {
            target.push(field);
        }
    }
}

/// One unit of work in a pipeline
///
/// A stage reads the current record and returns a partial update. It never
/// mutates the record itself; the executor merges the update.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Name and declared reads/writes
    fn spec(&self) -> &StageSpec;

    /// Run the stage against the current record
    async fn run(&self, record: &StateRecord) -> Result<Update, StageError>;

    fn name(&self) -> &str {
        &self.spec().name
    }
}

type StageFn = dyn Fn(&StateRecord) -> Result<Update, StageError> + Send + Sync;

/// Stage backed by a synchronous closure
pub struct FnStage {
    spec: StageSpec,
    func: Box<StageFn>,
}

impl FnStage {
    pub fn new<F>(spec: StageSpec, func: F) -> Self
    where
        F: Fn(&StateRecord) -> Result<Update, StageError> + Send + Sync + 'static,
    {
        Self {
            spec,
            func: Box::new(func),
        }
    }
}

impl fmt::Debug for FnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStage").field("spec", &self.spec).finish()
    }
}

#[async_trait]
impl Stage for FnStage {
    fn spec(&self) -> &StageSpec {
        &self.spec
    }

    async fn run(&self, record: &StateRecord) -> Result<Update, StageError> {
        (self.func)(record)
    }
}
