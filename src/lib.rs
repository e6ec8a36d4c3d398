// SPDX-License-Identifier: MIT

//! factcheck-rs: a supervisor-driven fact-checking workflow
//!
//! - [`adk`] - model and tool kit shared by the providers
//! - [`checker`] - the fact-check graph, its providers and surfaces

pub mod adk;
pub mod checker;
