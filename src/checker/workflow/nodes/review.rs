// SPDX-License-Identifier: MIT

//! The loop-termination gate
//!
//! First entry (`improved == false`): the provider's vote is honored.
//! Any later entry: the decision is forced to `Finish`, the provider is still
//! consulted for its note but its vote is discarded. Either way `improved` is
//! latched to true, so the improvement cycle runs at most once per run.

use async_trait::async_trait;
use std::sync::Arc;

use super::Node;
use crate::adk::error::{CheckError, WorkflowError};
use crate::checker::provider::{DecisionContext, DecisionProvider};
use crate::checker::types::{Message, ReviewDecision};
use crate::checker::workflow::router::{NodeId, RoutingKey};
use crate::checker::workflow::state::{StatePatch, WorkflowState};

pub struct ReviewNode {
    provider: Arc<dyn DecisionProvider>,
}

impl ReviewNode {
    pub fn new(provider: Arc<dyn DecisionProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Node for ReviewNode {
    fn id(&self) -> NodeId {
        NodeId::Review
    }

    async fn invoke(&self, state: &WorkflowState) -> Result<StatePatch, CheckError> {
        let verdict = state.verdict().ok_or(WorkflowError::MissingVerdict)?;

        let decision = self
            .provider
            .decide(DecisionContext::review(state, verdict))
            .await?;

        let outcome = if state.improved() {
            log::info!(
                "Review already ran an improvement cycle, forcing FINISH (provider voted '{}')",
                decision.action
            );
            ReviewDecision::Finish
        } else {
            ReviewDecision::parse(&decision.action)?
        };

        let note = decision
            .arguments
            .get("comments")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string();

        let correlation_id = state
            .last_decision()
            .map(|d| d.call_id.clone())
            .unwrap_or_default();

        log::info!("Review decision: {:?}", outcome);

        Ok(StatePatch::new(RoutingKey::from(outcome))
            .with_message(Message::ReviewNote {
                text: note,
                correlation_id,
            })
            .mark_improved())
    }
}
