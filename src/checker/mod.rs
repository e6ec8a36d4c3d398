// SPDX-License-Identifier: MIT

//! Fact-checking domain
//!
//! A supervisor repeatedly picks a research action or decides to render a
//! verdict; research accumulates on the blackboard; a judge renders the
//! verdict and a review gate may send the run back for one improvement pass.

pub mod config;
pub mod llm;
pub mod provider;
pub mod research;
pub mod server;
pub mod types;
pub mod workflow;

pub use workflow::engine::{run_fact_check, CompletedRun, Engine, Providers, WorkflowEvent};
