//! E2E test suite entry point.

mod batch_workflow;
mod fixture;
mod matching_workflow;
