//! Scenario-based tests for compositor

mod composition;
mod construction;
mod success_chain;
