//! Core domain models for the stage pipeline
//!
//! This module defines the state record threaded through a run, the stage
//! contract, the linear pipeline and the pipeline definition file.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod stage;
pub mod state;

pub use error::*;
pub use pipeline::*;
pub use record::*;
pub use stage::*;
pub use state::*;
