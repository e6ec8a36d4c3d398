// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use super::Node;
use crate::adk::error::CheckError;
use crate::checker::provider::ResearchProvider;
use crate::checker::types::{Message, ResearchSource};
use crate::checker::workflow::router::{NodeId, RoutingKey};
use crate::checker::workflow::state::{StatePatch, WorkflowState};

/// Runs the query from the pending supervisor decision against one backend
pub struct ResearchNode {
    source: ResearchSource,
    provider: Arc<dyn ResearchProvider>,
}

impl ResearchNode {
    pub fn new(source: ResearchSource, provider: Arc<dyn ResearchProvider>) -> Self {
        Self { source, provider }
    }
}

#[async_trait]
impl Node for ResearchNode {
    fn id(&self) -> NodeId {
        NodeId::research(self.source)
    }

    async fn invoke(&self, state: &WorkflowState) -> Result<StatePatch, CheckError> {
        let action = self.source.action();
        let decision = state
            .last_decision()
            .filter(|d| d.action == action.name())
            .ok_or_else(|| {
                CheckError::invalid_decision(format!(
                    "{} node reached without a pending {} decision",
                    self.source.as_str(),
                    action.name()
                ))
            })?;

        let query = decision.query().ok_or_else(|| {
            CheckError::invalid_decision(format!("{} decision has no query", action.name()))
        })?;

        log::info!("Searching {} for '{}'", self.source.as_str(), query);
        let documents = self.provider.fetch(query).await?;
        log::info!(
            "{} returned {} documents",
            self.source.as_str(),
            documents.len()
        );

        Ok(
            StatePatch::new(RoutingKey::Researched).with_message(Message::ToolResult {
                name: action.name().to_string(),
                payload: serde_json::to_value(&documents)?,
                correlation_id: decision.call_id.clone(),
            }),
        )
    }
}
