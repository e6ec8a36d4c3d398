// SPDX-License-Identifier: MIT

//! The blackboard threaded through every node of one run
//!
//! Nodes never mutate the state directly. They read it and return a
//! [`StatePatch`], which the engine merges: the message log uses an append
//! reducer, every other field overwrites.

use serde::Serialize;

use crate::checker::types::{Message, ResearchResult, Verdict};
use crate::checker::workflow::router::RoutingKey;

/// Runtime state of a single fact-check run
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowState {
    statement: String,
    current_date: String,
    messages: Vec<Message>,
    research: Vec<ResearchResult>,
    verdict: Option<Verdict>,
    improved: bool,
    next: Option<RoutingKey>,
    judge_passes: usize,
}

impl WorkflowState {
    /// Create the initial state for a statement. The log starts with the statement itself.
    pub fn new(statement: impl Into<String>) -> Self {
        let statement = statement.into();
        Self {
            messages: vec![Message::Statement {
                text: statement.clone(),
            }],
            statement,
            current_date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
            research: Vec::new(),
            verdict: None,
            improved: false,
            next: None,
            judge_passes: 0,
        }
    }

    /// Pin the date shown to providers (used by deterministic tests)
    pub fn with_current_date(mut self, date: impl Into<String>) -> Self {
        self.current_date = date.into();
        self
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn current_date(&self) -> &str {
        &self.current_date
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Research as of the last supervisor turn
    pub fn research(&self) -> &[ResearchResult] {
        &self.research
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn improved(&self) -> bool {
        self.improved
    }

    pub fn next(&self) -> Option<RoutingKey> {
        self.next
    }

    /// How many times the judge has rendered a verdict in this run
    pub fn judge_passes(&self) -> usize {
        self.judge_passes
    }

    /// All research-type entries currently in the log, in log order
    pub fn research_results(&self) -> Vec<ResearchResult> {
        self.messages.iter().filter_map(Message::as_research).collect()
    }

    /// The most recent supervisor decision, if any
    pub fn last_decision(&self) -> Option<&crate::checker::types::Decision> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Decision(d) => Some(d),
            _ => None,
        })
    }

    /// Merge a node's patch into the state
    pub fn apply(&mut self, patch: StatePatch) {
        self.messages.extend(patch.messages);

        if let Some(research) = patch.research {
            self.research = research;
        }
        if let Some(verdict) = patch.verdict {
            self.verdict = Some(verdict);
            self.judge_passes += 1;
        }
        if patch.improved {
            // one-shot latch, never reset
            self.improved = true;
        }
        self.next = Some(patch.next);
    }
}

/// Partial update produced by one node invocation
#[derive(Debug, Clone, PartialEq)]
pub struct StatePatch {
    pub messages: Vec<Message>,
    pub research: Option<Vec<ResearchResult>>,
    pub verdict: Option<Verdict>,
    pub improved: bool,
    pub next: RoutingKey,
}

impl StatePatch {
    pub fn new(next: RoutingKey) -> Self {
        Self {
            messages: Vec::new(),
            research: None,
            verdict: None,
            improved: false,
            next,
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_research(mut self, research: Vec<ResearchResult>) -> Self {
        self.research = Some(research);
        self
    }

    pub fn with_verdict(mut self, verdict: Verdict) -> Self {
        self.verdict = Some(verdict);
        self
    }

    pub fn mark_improved(mut self) -> Self {
        self.improved = true;
        self
    }
}
