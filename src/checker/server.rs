// SPDX-License-Identifier: MIT

//! HTTP surface over the engine
//!
//! - `GET /api/health`
//! - `POST /api/check_statement` - run to completion, answer with the verdict
//! - `POST /api/check_statement/stream` - stream [`WorkflowEvent`]s as SSE
//! - `POST /api/get_statements` - split an article into checkable statements

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::checker::llm::StatementExtractor;
use crate::checker::types::Verdict;
use crate::checker::workflow::engine::{run_fact_check, Engine, WorkflowEvent};

#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
    extractor: Arc<StatementExtractor>,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub statement: String,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub content: String,
}

/// Build the router; split out from [`serve`] so it can be driven in tests
pub fn app(engine: Arc<Engine>, extractor: Arc<StatementExtractor>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/check_statement", post(check_statement))
        .route("/api/check_statement/stream", post(stream_check))
        .route("/api/get_statements", post(get_statements))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { engine, extractor })
}

pub async fn serve(
    engine: Arc<Engine>,
    extractor: Arc<StatementExtractor>,
    port: u16,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(engine, extractor)).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

async fn check_statement(
    State(state): State<AppState>,
    Json(payload): Json<CheckRequest>,
) -> Result<Json<Verdict>, (StatusCode, Json<Value>)> {
    if payload.statement.trim().is_empty() {
        return Err(bad_request("statement must not be empty"));
    }

    match run_fact_check(&state.engine, &payload.statement).await {
        Ok(verdict) => Ok(Json(verdict)),
        Err(e) => {
            log::error!("Fact-check failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

async fn get_statements(
    State(state): State<AppState>,
    Json(payload): Json<ExtractRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if payload.content.trim().is_empty() {
        return Err(bad_request("content must not be empty"));
    }

    match state.extractor.extract(&payload.content).await {
        Ok(statements) => Ok(Json(json!({ "statements": statements }))),
        Err(e) => {
            log::error!("Statement extraction failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

async fn stream_check(
    State(state): State<AppState>,
    Json(payload): Json<CheckRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<Value>)> {
    if payload.statement.trim().is_empty() {
        return Err(bad_request("statement must not be empty"));
    }

    let (tx, rx) = mpsc::channel(100);
    let token = CancellationToken::new();
    let run_token = token.clone();

    tokio::spawn(async move {
        log::info!("Starting streaming fact-check");
        // Errors are already reported on the stream as an Error event
        let _ = state
            .engine
            .run_traced(&payload.statement, &run_token, Some(&tx))
            .await;
        log::info!("Streaming fact-check finished");
    });

    // Dropping the stream (client went away) cancels the run at the next node boundary
    let guard = token.drop_guard();
    let stream = ReceiverStream::new(rx).map(move |event| {
        let _ = &guard;
        Ok(Event::default()
            .json_data(&event)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::CheckError;
    use crate::checker::config::EngineConfig;
    use crate::checker::provider::{
        DecisionContext, DecisionProvider, DecisionPurpose, ResearchProvider, VerdictProvider,
    };
    use crate::adk::error::ProviderError;
    use crate::adk::model::{Content, GenerationConfig, Model, Part};
    use crate::adk::tool::ToolSpec;
    use crate::checker::types::{Decision, Document, ResearchResult, VerdictLabel};
    use crate::checker::workflow::engine::Providers;
    use async_trait::async_trait;

    struct RenderImmediately;

    #[async_trait]
    impl DecisionProvider for RenderImmediately {
        async fn decide(&self, context: DecisionContext<'_>) -> Result<Decision, CheckError> {
            Ok(match context.purpose {
                DecisionPurpose::NextAction => Decision::new("render_verdict", json!({})),
                DecisionPurpose::Review => Decision::new("FINISH", json!({"comments": "ok"})),
            })
        }
    }

    struct NoResearch;

    #[async_trait]
    impl ResearchProvider for NoResearch {
        async fn fetch(&self, _query: &str) -> Result<Vec<Document>, CheckError> {
            Ok(vec![])
        }
    }

    struct FixedJudge;

    #[async_trait]
    impl VerdictProvider for FixedJudge {
        async fn judge(
            &self,
            _statement: &str,
            _research: &[ResearchResult],
        ) -> Result<Verdict, CheckError> {
            Ok(Verdict {
                label: VerdictLabel::Uncertain,
                explanation: "No research was gathered.".to_string(),
                references: vec![],
            })
        }
    }

    /// Answers every prompt with the same two statements
    struct TwoStatements;

    #[async_trait]
    impl Model for TwoStatements {
        async fn generate_content(
            &self,
            _history: &[Content],
            _config: Option<&GenerationConfig>,
            _tools: Option<&[ToolSpec]>,
        ) -> Result<Content, ProviderError> {
            Ok(Content {
                role: "model".to_string(),
                parts: vec![Part::Text(
                    "The bridge opened in 1937.\nIt is 2.7 km long.\n".to_string(),
                )],
            })
        }
    }

    fn app_state() -> AppState {
        AppState {
            engine: engine(),
            extractor: Arc::new(StatementExtractor::new(Arc::new(TwoStatements), None)),
        }
    }

    fn engine() -> Arc<Engine> {
        let research: Arc<dyn ResearchProvider> = Arc::new(NoResearch);
        Arc::new(Engine::new(
            Providers {
                decision: Arc::new(RenderImmediately),
                verdict: Arc::new(FixedJudge),
                wikipedia: research.clone(),
                arxiv: research.clone(),
                web: research,
            },
            EngineConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_check_statement_returns_verdict() {
        let Json(verdict) = check_statement(
            State(app_state()),
            Json(CheckRequest {
                statement: "The moon is made of cheese".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(verdict.label, VerdictLabel::Uncertain);
    }

    #[tokio::test]
    async fn test_empty_statement_is_bad_request() {
        let (status, Json(body)) = check_statement(
            State(app_state()),
            Json(CheckRequest {
                statement: "   ".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_empty_statement_stream_is_bad_request() {
        let result = stream_check(
            State(app_state()),
            Json(CheckRequest {
                statement: String::new(),
            }),
        )
        .await;

        match result {
            Err((status, Json(body))) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body["error"], "statement must not be empty");
            }
            Ok(_) => panic!("empty statement was accepted"),
        }
    }

    #[tokio::test]
    async fn test_get_statements() {
        let Json(body) = get_statements(
            State(app_state()),
            Json(ExtractRequest {
                content: "The Golden Gate Bridge opened in 1937 and spans 2.7 km.".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(
            body["statements"],
            json!(["The bridge opened in 1937.", "It is 2.7 km long."])
        );
    }

    #[tokio::test]
    async fn test_empty_article_is_bad_request() {
        let (status, _) = get_statements(
            State(app_state()),
            Json(ExtractRequest {
                content: "\n".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health_check().await;
        assert_eq!(body["status"], "ok");
    }
}
