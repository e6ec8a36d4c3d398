// SPDX-License-Identifier: MIT

//! Nodes of the fact-check graph
//!
//! Each node reads the blackboard and returns a [`StatePatch`] carrying its
//! contributions and the routing key for the next hop:
//! - [`SupervisorNode`] - picks the next action
//! - [`ResearchNode`] - one per backend, always returns to the supervisor
//! - [`JudgeNode`] - renders a verdict, always proceeds to review
//! - [`ReviewNode`] - the loop-termination gate

mod judge;
mod research;
mod review;
mod supervisor;

pub use judge::JudgeNode;
pub use research::ResearchNode;
pub use review::ReviewNode;
pub use supervisor::SupervisorNode;

use async_trait::async_trait;

use crate::adk::error::CheckError;
use crate::checker::workflow::router::NodeId;
use crate::checker::workflow::state::{StatePatch, WorkflowState};

/// A unit of orchestration logic invoked by the engine.
///
/// `invoke` must not have side effects on the state: the engine may call it
/// more than once under its retry policy and merges only the successful patch.
#[async_trait]
pub trait Node: Send + Sync {
    fn id(&self) -> NodeId;

    async fn invoke(&self, state: &WorkflowState) -> Result<StatePatch, CheckError>;
}
