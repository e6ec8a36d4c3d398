// SPDX-License-Identifier: MIT

//! The step loop driving one fact-check run
//!
//! Starting at the supervisor, the engine invokes the current node under the
//! retry policy, merges the returned patch into the blackboard and asks the
//! router for the next node, until review routes to the terminal node.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::nodes::{JudgeNode, Node, ResearchNode, ReviewNode, SupervisorNode};
use super::router::{NodeId, Router};
use super::state::WorkflowState;
use crate::adk::error::{CheckError, WorkflowError};
use crate::checker::config::{CheckerConfig, EngineConfig};
use crate::checker::llm::{chat_model, LlmDecisionProvider, LlmVerdictProvider};
use crate::checker::provider::{DecisionProvider, ResearchProvider, VerdictProvider};
use crate::checker::research::{ArxivProvider, WebSearchProvider, WikipediaProvider};
use crate::checker::types::{ResearchSource, Verdict};

/// The external capabilities a run depends on
#[derive(Clone)]
pub struct Providers {
    pub decision: Arc<dyn DecisionProvider>,
    pub verdict: Arc<dyn VerdictProvider>,
    pub wikipedia: Arc<dyn ResearchProvider>,
    pub arxiv: Arc<dyn ResearchProvider>,
    pub web: Arc<dyn ResearchProvider>,
}

impl Providers {
    fn research(&self, source: ResearchSource) -> Arc<dyn ResearchProvider> {
        match source {
            ResearchSource::Wikipedia => self.wikipedia.clone(),
            ResearchSource::Arxiv => self.arxiv.clone(),
            ResearchSource::Web => self.web.clone(),
        }
    }
}

/// Progress events emitted while a run executes
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    NodeStarted {
        step: usize,
        node: NodeId,
    },
    NodeCompleted {
        step: usize,
        node: NodeId,
        next: NodeId,
        messages: usize,
    },
    Retrying {
        node: NodeId,
        attempt: u32,
        error: String,
    },
    Verdict {
        verdict: Verdict,
    },
    Error {
        message: String,
    },
}

/// Everything a finished run leaves behind
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub verdict: Verdict,
    pub state: WorkflowState,
    /// Nodes in the order they ran, terminal excluded
    pub path: Vec<NodeId>,
}

/// Fact-check workflow engine. Cheap to share; each run owns its own state.
pub struct Engine {
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    router: Router,
    config: EngineConfig,
}

impl Engine {
    /// Build the standard graph over the given providers
    pub fn new(providers: Providers, config: EngineConfig) -> Self {
        let mut nodes: Vec<Arc<dyn Node>> = vec![
            Arc::new(SupervisorNode::new(providers.decision.clone())),
            Arc::new(JudgeNode::new(providers.verdict.clone())),
            Arc::new(ReviewNode::new(providers.decision.clone())),
        ];
        for source in ResearchSource::ALL {
            nodes.push(Arc::new(ResearchNode::new(
                source,
                providers.research(source),
            )));
        }
        let nodes = nodes.into_iter().map(|node| (node.id(), node)).collect();

        Self {
            nodes,
            router: Router::fact_check(),
            config,
        }
    }

    /// Wire the OpenAI model and the HTTP research backends from configuration
    pub fn from_config(config: &CheckerConfig) -> Result<Self, CheckError> {
        let model = chat_model(&config.model)?;
        let temperature = config.model.temperature;

        let providers = Providers {
            decision: Arc::new(LlmDecisionProvider::new(model.clone(), temperature)),
            verdict: Arc::new(LlmVerdictProvider::new(model, temperature)),
            wikipedia: Arc::new(WikipediaProvider::new(&config.research.wikipedia)?),
            arxiv: Arc::new(ArxivProvider::new(&config.research.arxiv)?),
            web: Arc::new(WebSearchProvider::new(&config.research.web)?),
        };

        Ok(Self::new(providers, config.engine.clone()))
    }

    /// Replace the routing table
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Run a fact-check to completion
    pub async fn run(&self, statement: &str) -> Result<Verdict, CheckError> {
        self.run_with_cancel(statement, &CancellationToken::new())
            .await
    }

    /// Run a fact-check, stopping between nodes once `token` is cancelled
    pub async fn run_with_cancel(
        &self,
        statement: &str,
        token: &CancellationToken,
    ) -> Result<Verdict, CheckError> {
        let run = self.run_traced(statement, token, None).await?;
        Ok(run.verdict)
    }

    /// Run a fact-check and keep the final state and the visited path.
    ///
    /// When `events` is given, progress is streamed to it. A closed receiver
    /// does not stop the run.
    pub async fn run_traced(
        &self,
        statement: &str,
        token: &CancellationToken,
        events: Option<&mpsc::Sender<WorkflowEvent>>,
    ) -> Result<CompletedRun, CheckError> {
        self.run_from(WorkflowState::new(statement), token, events)
            .await
    }

    /// Run from a prepared initial state
    pub async fn run_from(
        &self,
        state: WorkflowState,
        token: &CancellationToken,
        events: Option<&mpsc::Sender<WorkflowEvent>>,
    ) -> Result<CompletedRun, CheckError> {
        log::info!(
            "Starting fact-check of: {}",
            preview(state.statement(), 80)
        );

        match self.drive(state, token, events).await {
            Ok(run) => {
                log::info!(
                    "Fact-check finished after {} steps: {}",
                    run.path.len(),
                    run.verdict.label
                );
                emit(
                    events,
                    WorkflowEvent::Verdict {
                        verdict: run.verdict.clone(),
                    },
                )
                .await;
                Ok(run)
            }
            Err(e) => {
                log::error!("Fact-check failed: {}", e);
                emit(
                    events,
                    WorkflowEvent::Error {
                        message: e.to_string(),
                    },
                )
                .await;
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        mut state: WorkflowState,
        token: &CancellationToken,
        events: Option<&mpsc::Sender<WorkflowEvent>>,
    ) -> Result<CompletedRun, CheckError> {
        let mut current = NodeId::Supervisor;
        let mut path = Vec::new();
        let mut step = 0;

        while current != NodeId::Terminal {
            if token.is_cancelled() {
                log::warn!("Run cancelled before {}", current);
                return Err(WorkflowError::Cancelled.into());
            }

            step += 1;
            if step > self.config.max_iterations {
                log::error!(
                    "Run exceeded max iterations ({})",
                    self.config.max_iterations
                );
                return Err(WorkflowError::MaxIterations {
                    limit: self.config.max_iterations,
                }
                .into());
            }

            let node: &dyn Node = self
                .nodes
                .get(&current)
                .map(|n| n.as_ref())
                .ok_or_else(|| {
                    CheckError::RoutingConfiguration(format!(
                        "no node registered for '{}'",
                        current
                    ))
                })?;

            log::info!("Step {}: {}", step, current);
            emit(events, WorkflowEvent::NodeStarted { step, node: current }).await;

            let state_ref = &state;
            let node_id = current;
            let patch = self
                .config
                .retry
                .run(
                    current.as_str(),
                    |attempt, e| {
                        // the retry callback is synchronous, so events are best-effort here
                        if let Some(tx) = events {
                            let _ = tx.try_send(WorkflowEvent::Retrying {
                                node: node_id,
                                attempt,
                                error: e.to_string(),
                            });
                        }
                    },
                    move || node.invoke(state_ref),
                )
                .await?;

            state.apply(patch);
            path.push(current);

            let next = self.router.next(current, state.next())?;
            log::debug!("Routing {} -> {}", current, next);
            emit(
                events,
                WorkflowEvent::NodeCompleted {
                    step,
                    node: current,
                    next,
                    messages: state.messages().len(),
                },
            )
            .await;

            current = next;
        }

        let verdict = state
            .verdict()
            .cloned()
            .ok_or(WorkflowError::MissingVerdict)?;

        Ok(CompletedRun {
            verdict,
            state,
            path,
        })
    }
}

/// Run one fact-check on `engine`; the entry point for the CLI and the HTTP API
pub async fn run_fact_check(engine: &Engine, statement: &str) -> Result<Verdict, CheckError> {
    engine.run(statement).await
}

async fn emit(events: Option<&mpsc::Sender<WorkflowEvent>>, event: WorkflowEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::provider::{DecisionContext, DecisionPurpose};
    use crate::checker::types::{Decision, Document, ResearchResult, VerdictLabel};
    use crate::checker::workflow::retry::RetryPolicy;
    use crate::checker::workflow::router::RoutingKey;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Supervisor always searches the web first, then renders; review always finishes
    struct SimpleDecisions;

    #[async_trait]
    impl DecisionProvider for SimpleDecisions {
        async fn decide(&self, context: DecisionContext<'_>) -> Result<Decision, CheckError> {
            match context.purpose {
                DecisionPurpose::NextAction if context.history.len() == 1 => {
                    Ok(Decision::new("search_web", json!({"query": context.statement})))
                }
                DecisionPurpose::NextAction => Ok(Decision::new("render_verdict", json!({}))),
                DecisionPurpose::Review => Ok(Decision::new("FINISH", json!({"comments": ""}))),
            }
        }
    }

    struct OneDoc;

    #[async_trait]
    impl ResearchProvider for OneDoc {
        async fn fetch(&self, query: &str) -> Result<Vec<Document>, CheckError> {
            Ok(vec![Document {
                title: query.to_string(),
                source_url: "https://example.org/a".to_string(),
                content: "evidence".to_string(),
            }])
        }
    }

    struct CountingJudge(AtomicUsize);

    #[async_trait]
    impl VerdictProvider for CountingJudge {
        async fn judge(
            &self,
            _statement: &str,
            research: &[ResearchResult],
        ) -> Result<Verdict, CheckError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Verdict {
                label: VerdictLabel::MostlyTrue,
                explanation: format!("{} sources agree", research.len()),
                references: vec![],
            })
        }
    }

    fn providers(decision: Arc<dyn DecisionProvider>) -> Providers {
        let research: Arc<dyn ResearchProvider> = Arc::new(OneDoc);
        Providers {
            decision,
            verdict: Arc::new(CountingJudge(AtomicUsize::new(0))),
            wikipedia: research.clone(),
            arxiv: research.clone(),
            web: research,
        }
    }

    fn config(max_iterations: usize) -> EngineConfig {
        EngineConfig {
            max_iterations,
            retry: RetryPolicy::immediate(2),
        }
    }

    #[test]
    fn test_every_node_registered_under_its_id() {
        let engine = Engine::new(providers(Arc::new(SimpleDecisions)), config(25));

        assert_eq!(engine.nodes.len(), 6);
        for (id, node) in &engine.nodes {
            assert_eq!(*id, node.id());
        }
        for source in ResearchSource::ALL {
            assert!(engine.nodes.contains_key(&NodeId::research(source)));
        }
    }

    #[tokio::test]
    async fn test_simple_run_path() {
        let engine = Engine::new(providers(Arc::new(SimpleDecisions)), config(25));
        let run = engine
            .run_traced("claim", &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(
            run.path,
            vec![
                NodeId::Supervisor,
                NodeId::Web,
                NodeId::Supervisor,
                NodeId::Judge,
                NodeId::Review
            ]
        );
        assert_eq!(run.verdict.explanation, "1 sources agree");
        assert!(run.state.improved());
    }

    #[tokio::test]
    async fn test_events_are_streamed() {
        let engine = Engine::new(providers(Arc::new(SimpleDecisions)), config(25));
        let (tx, mut rx) = mpsc::channel(64);

        engine
            .run_traced("claim", &CancellationToken::new(), Some(&tx))
            .await
            .unwrap();
        drop(tx);

        let mut started = 0;
        let mut last = None;
        while let Some(event) = rx.recv().await {
            if matches!(event, WorkflowEvent::NodeStarted { .. }) {
                started += 1;
            }
            last = Some(event);
        }
        assert_eq!(started, 5);
        assert!(matches!(last, Some(WorkflowEvent::Verdict { .. })));
    }

    #[tokio::test]
    async fn test_iteration_ceiling() {
        let engine = Engine::new(providers(Arc::new(SimpleDecisions)), config(3));
        let err = engine.run("claim").await.unwrap_err();
        assert!(matches!(
            err,
            CheckError::Workflow(WorkflowError::MaxIterations { limit: 3 })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_node() {
        let engine = Engine::new(providers(Arc::new(SimpleDecisions)), config(25));
        let token = CancellationToken::new();
        token.cancel();

        let err = engine.run_with_cancel("claim", &token).await.unwrap_err();
        assert!(matches!(err, CheckError::Workflow(WorkflowError::Cancelled)));
    }

    #[tokio::test]
    async fn test_missing_edge_is_routing_error() {
        let mut router = Router::empty();
        router.add_edge(NodeId::Supervisor, RoutingKey::SearchWeb, NodeId::Web);

        let engine =
            Engine::new(providers(Arc::new(SimpleDecisions)), config(25)).with_router(router);
        let err = engine.run("claim").await.unwrap_err();
        assert!(matches!(err, CheckError::RoutingConfiguration(_)));
    }

    #[tokio::test]
    async fn test_error_event_on_failure() {
        let engine = Engine::new(providers(Arc::new(SimpleDecisions)), config(1));
        let (tx, mut rx) = mpsc::channel(64);

        let result = engine
            .run_traced("claim", &CancellationToken::new(), Some(&tx))
            .await;
        drop(tx);
        assert!(result.is_err());

        let mut last = None;
        while let Some(event) = rx.recv().await {
            last = Some(event);
        }
        match last {
            Some(WorkflowEvent::Error { message }) => assert!(message.contains("max iterations")),
            other => panic!("unexpected last event: {:?}", other),
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = WorkflowEvent::NodeStarted {
            step: 1,
            node: NodeId::Supervisor,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "node_started", "step": 1, "node": "supervisor"})
        );
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 80), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
    }
}
