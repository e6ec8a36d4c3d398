// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use super::Node;
use crate::adk::error::CheckError;
use crate::checker::provider::{DecisionContext, DecisionProvider};
use crate::checker::types::{Action, Message};
use crate::checker::workflow::router::{NodeId, RoutingKey};
use crate::checker::workflow::state::{StatePatch, WorkflowState};

/// Chooses exactly one of the available actions each turn
pub struct SupervisorNode {
    provider: Arc<dyn DecisionProvider>,
}

impl SupervisorNode {
    pub fn new(provider: Arc<dyn DecisionProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Node for SupervisorNode {
    fn id(&self) -> NodeId {
        NodeId::Supervisor
    }

    async fn invoke(&self, state: &WorkflowState) -> Result<StatePatch, CheckError> {
        let decision = self
            .provider
            .decide(DecisionContext::next_action(state))
            .await?;

        if decision.action.trim().is_empty() {
            return Err(CheckError::invalid_decision(
                "supervisor returned no actionable choice",
            ));
        }

        let action = Action::parse(&decision.action)?;
        if action.research_source().is_some() && decision.query().is_none() {
            return Err(CheckError::invalid_decision(format!(
                "{} requires a non-empty 'query' argument",
                action.name()
            )));
        }

        log::info!(
            "Supervisor chose {} (call {}) with {} research results so far",
            action.name(),
            decision.call_id,
            state.research_results().len()
        );

        Ok(StatePatch::new(RoutingKey::from(action))
            .with_research(state.research_results())
            .with_message(Message::Decision(decision)))
    }
}
