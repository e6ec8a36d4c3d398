// SPDX-License-Identifier: MIT

//! Boundary contracts for the external collaborators of a fact-check run
//!
//! Decisions, research and verdicts all come from outside the engine. Each is
//! an injected capability, so tests can substitute deterministic stubs. All
//! implementations must be safe to share across concurrent runs.

use crate::adk::error::CheckError;
use crate::checker::types::{Action, Decision, Document, Message, ResearchResult, Verdict};
use crate::checker::workflow::state::WorkflowState;
use async_trait::async_trait;

/// What a decision is being asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionPurpose {
    /// Supervisor turn: pick the next action
    NextAction,
    /// Review gate: is the verdict ready to publish?
    Review,
}

/// Everything a decision provider gets to see
#[derive(Debug, Clone)]
pub struct DecisionContext<'a> {
    pub purpose: DecisionPurpose,
    pub statement: &'a str,
    pub current_date: &'a str,
    pub history: &'a [Message],
    /// Present for review decisions
    pub verdict: Option<&'a Verdict>,
    /// Names the provider must choose from
    pub available_actions: Vec<&'static str>,
}

impl<'a> DecisionContext<'a> {
    /// Context for a supervisor turn
    pub fn next_action(state: &'a WorkflowState) -> Self {
        Self {
            purpose: DecisionPurpose::NextAction,
            statement: state.statement(),
            current_date: state.current_date(),
            history: state.messages(),
            verdict: None,
            available_actions: Action::ALL.iter().map(Action::name).collect(),
        }
    }

    /// Context for the review gate
    pub fn review(state: &'a WorkflowState, verdict: &'a Verdict) -> Self {
        use crate::checker::types::ReviewDecision;

        Self {
            purpose: DecisionPurpose::Review,
            statement: state.statement(),
            current_date: state.current_date(),
            history: state.messages(),
            verdict: Some(verdict),
            available_actions: vec![ReviewDecision::IMPROVE, ReviewDecision::FINISH],
        }
    }
}

/// Supplies structured decisions (action name plus arguments)
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    async fn decide(&self, context: DecisionContext<'_>) -> Result<Decision, CheckError>;
}

/// One research backend. An empty result is valid and not an error.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<Vec<Document>, CheckError>;
}

/// Renders a verdict from the statement and all research gathered so far
#[async_trait]
pub trait VerdictProvider: Send + Sync {
    async fn judge(
        &self,
        statement: &str,
        research: &[ResearchResult],
    ) -> Result<Verdict, CheckError>;
}
