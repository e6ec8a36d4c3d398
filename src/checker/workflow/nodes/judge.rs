// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use super::Node;
use crate::adk::error::CheckError;
use crate::checker::provider::VerdictProvider;
use crate::checker::workflow::router::{NodeId, RoutingKey};
use crate::checker::workflow::state::{StatePatch, WorkflowState};

/// Renders a verdict from the full accumulated research set
pub struct JudgeNode {
    provider: Arc<dyn VerdictProvider>,
}

impl JudgeNode {
    pub fn new(provider: Arc<dyn VerdictProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Node for JudgeNode {
    fn id(&self) -> NodeId {
        NodeId::Judge
    }

    async fn invoke(&self, state: &WorkflowState) -> Result<StatePatch, CheckError> {
        let research = state.research();
        log::info!(
            "Judging statement with {} research results (pass {})",
            research.len(),
            state.judge_passes() + 1
        );

        let verdict = self.provider.judge(state.statement(), research).await?;
        verdict.validate()?;

        log::info!("Judge rendered verdict: {}", verdict.label);
        Ok(StatePatch::new(RoutingKey::Judged).with_verdict(verdict))
    }
}
