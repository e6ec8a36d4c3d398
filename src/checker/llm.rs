// SPDX-License-Identifier: MIT

//! Model-backed decision and verdict providers, plus statement extraction
//!
//! Both providers present their options as tool specs and require the model to
//! answer with a tool call. The call is then decoded into a [`Decision`] or a
//! [`Verdict`]; the engine validates the result. [`StatementExtractor`] asks
//! for plain text instead.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::adk::error::CheckError;
use crate::adk::model::openai::OpenAIModel;
use crate::adk::model::{Content, GenerationConfig, Model, Part};
use crate::adk::tool::ToolSpec;
use crate::checker::config::ModelConfig;
use crate::checker::provider::{
    DecisionContext, DecisionProvider, DecisionPurpose, VerdictProvider,
};
use crate::checker::types::{
    Action, Decision, Message, ResearchResult, ResearchSource, ReviewDecision, Verdict,
    VerdictLabel,
};

const SUPERVISOR_INSTRUCTIONS: &str = "You are a journalist on the fact-checking team of a major \
news publication. Journalistic integrity is paramount. A good fact-check has a complete \
explanation, accounts for reasonable alternate explanations, does not rely on information that \
is not present, and is ideally corroborated by more than one source.";

const SUPERVISOR_CLOSING: &str = "Given the work done so far, which one of your available tool \
actions do you want to take next? You must choose exactly one of your available tools.";

const REVIEW_INSTRUCTIONS: &str = "You are a journalist on the review committee of a \
fact-checking team. Review the statement and verdict below. A publishable verdict has a \
complete explanation, accounts for reasonable alternate explanations, and does not rely on \
information that is not present. Does this verdict need improvement, or is it finished?";

const EXTRACTION_INSTRUCTIONS: &str = "You are a journalist on the fact-checking team of a \
major news publication. From the article below, extract every verifiable statement that is \
significant to the story. Each statement must carry the names and context needed to be \
understood and verified without the article. Answer with one statement per line, without \
numbering or bullets.";

const JUDGE_INSTRUCTIONS: &str = "You are a journalist on the fact-checking team of a major \
news publication. Judge whether the statement is accurate and reasonable given the references \
gathered by your team. Justify the verdict only from those references.";

static QUERY_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The search query"
            }
        },
        "required": ["query"]
    })
});

static ACTION_TOOLS: Lazy<Vec<ToolSpec>> = Lazy::new(|| {
    Action::ALL
        .iter()
        .map(|action| match action {
            Action::SearchWikipedia => ToolSpec::new(
                action.name(),
                "Search Wikipedia. Useful when you need well-established information.",
                QUERY_SCHEMA.clone(),
            ),
            Action::SearchArxiv => ToolSpec::new(
                action.name(),
                "Search arXiv. Useful when you need scholarly technical papers.",
                QUERY_SCHEMA.clone(),
            ),
            Action::SearchWeb => ToolSpec::new(
                action.name(),
                "Search the Web. Useful for recent information or anything that would not be \
                 found in Wikipedia or scholarly journals.",
                QUERY_SCHEMA.clone(),
            ),
            Action::RenderVerdict => ToolSpec::new(
                action.name(),
                "Render a verdict on the statement given the available research. Useful when \
                 you are confident you have sufficient information.",
                json!({
                    "type": "object",
                    "properties": {
                        "statement": {
                            "type": "string",
                            "description": "The statement to be judged"
                        }
                    }
                }),
            ),
        })
        .collect()
});

static REVIEW_TOOL: Lazy<ToolSpec> = Lazy::new(|| {
    ToolSpec::new(
        "review_feedback",
        "Record whether the verdict needs improvement or is finished.",
        json!({
            "type": "object",
            "properties": {
                "next": {
                    "type": "string",
                    "enum": [ReviewDecision::IMPROVE, ReviewDecision::FINISH],
                    "description": "Does this verdict need improvement, or is it finished?"
                },
                "comments": {
                    "type": "string",
                    "description":
                        "If recommending improvement, what the team should do to make it better"
                }
            },
            "required": ["next", "comments"]
        }),
    )
});

static VERDICT_TOOL: Lazy<ToolSpec> = Lazy::new(|| {
    ToolSpec::new(
        "record_verdict",
        "Record your verdict on the accuracy of the statement.",
        json!({
            "type": "object",
            "properties": {
                "verdict": {
                    "type": "string",
                    "enum": VerdictLabel::ALL.map(|l| l.as_str()),
                },
                "explanation": {
                    "type": "string",
                    "description": "Justification for the verdict, derived from the references"
                },
                "references": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "source_url": {
                                "type": "string",
                                "description": "The source URL of the reference"
                            },
                            "summary": {
                                "type": "string",
                                "description": "Brief summary of the justifying content"
                            }
                        },
                        "required": ["title", "source_url", "summary"]
                    }
                }
            },
            "required": ["verdict", "explanation", "references"]
        }),
    )
});

/// Build the chat model named in the config
pub fn chat_model(config: &ModelConfig) -> Result<Arc<dyn Model>, CheckError> {
    let model = OpenAIModel::new(config.model_name.clone())
        .map_err(|e| CheckError::config(e.to_string()))?;
    log::info!(
        "Using provider: {} with model: {}",
        config.provider,
        model.model_name()
    );
    Ok(Arc::new(model))
}

/// Replay the message log as conversation history
fn history_to_contents(history: &[Message]) -> Vec<Content> {
    history
        .iter()
        .map(|message| match message {
            Message::Statement { text } => Content::user(format!("Statement: {}", text)),
            Message::Decision(decision) => Content {
                role: "model".to_string(),
                parts: vec![Part::FunctionCall {
                    id: decision.call_id.clone(),
                    name: decision.action.clone(),
                    args: decision.arguments.clone(),
                }],
            },
            Message::ToolResult {
                name,
                payload,
                correlation_id,
            } => Content {
                role: "tool".to_string(),
                parts: vec![Part::FunctionResponse {
                    id: correlation_id.clone(),
                    name: name.clone(),
                    response: payload.clone(),
                }],
            },
            Message::ReviewNote {
                text,
                correlation_id,
            } => Content {
                role: "tool".to_string(),
                parts: vec![Part::FunctionResponse {
                    id: correlation_id.clone(),
                    name: "review".to_string(),
                    response: json!({ "comments": text }),
                }],
            },
        })
        .collect()
}

/// Decision provider backed by a chat model
pub struct LlmDecisionProvider {
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl LlmDecisionProvider {
    pub fn new(model: Arc<dyn Model>, temperature: Option<f32>) -> Self {
        Self {
            model,
            config: GenerationConfig {
                temperature,
                require_tool_call: true,
                ..Default::default()
            },
        }
    }

    fn supervisor_request(context: &DecisionContext<'_>) -> Vec<Content> {
        let mut contents = vec![Content::system(format!(
            "{}\n\nToday's date is {}.\n\n\
             This is the statement you are tasked with fact-checking: {}\n\n\
             Below is the work you've done so far.",
            SUPERVISOR_INSTRUCTIONS, context.current_date, context.statement
        ))];
        contents.extend(history_to_contents(context.history));
        contents.push(Content::system(SUPERVISOR_CLOSING));
        contents
    }

    fn review_request(context: &DecisionContext<'_>) -> Result<Vec<Content>, CheckError> {
        let verdict = serde_json::to_string_pretty(&context.verdict)?;
        Ok(vec![Content::system(format!(
            "{}\n\nThe statement: {}\n\nThe verdict: {}",
            REVIEW_INSTRUCTIONS, context.statement, verdict
        ))])
    }
}

#[async_trait]
impl DecisionProvider for LlmDecisionProvider {
    async fn decide(&self, context: DecisionContext<'_>) -> Result<Decision, CheckError> {
        let (contents, tools): (Vec<Content>, &[ToolSpec]) = match context.purpose {
            DecisionPurpose::NextAction => {
                (Self::supervisor_request(&context), ACTION_TOOLS.as_slice())
            }
            DecisionPurpose::Review => (
                Self::review_request(&context)?,
                std::slice::from_ref(&*REVIEW_TOOL),
            ),
        };

        let response = self
            .model
            .generate_content(&contents, Some(&self.config), Some(tools))
            .await
            .map_err(|e| CheckError::from_provider("decision model", e))?;

        let (call_id, name, args) = response.first_function_call().ok_or_else(|| {
            CheckError::invalid_decision("model answered without choosing an action")
        })?;

        match context.purpose {
            DecisionPurpose::NextAction => Ok(Decision {
                call_id: call_id.to_string(),
                action: name.to_string(),
                arguments: args.clone(),
            }),
            // A missing vote passes through empty; the review node decides whether it matters
            DecisionPurpose::Review => {
                let vote = args.get("next").and_then(Value::as_str).unwrap_or_default();
                Ok(Decision {
                    call_id: call_id.to_string(),
                    action: vote.to_string(),
                    arguments: json!({
                        "comments": args.get("comments").cloned().unwrap_or(Value::Null)
                    }),
                })
            }
        }
    }
}

/// Verdict provider backed by a chat model
pub struct LlmVerdictProvider {
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl LlmVerdictProvider {
    pub fn new(model: Arc<dyn Model>, temperature: Option<f32>) -> Self {
        Self {
            model,
            config: GenerationConfig {
                temperature,
                require_tool_call: true,
                ..Default::default()
            },
        }
    }

    /// Lay the research out per source, the way the judge prompt expects it
    fn format_research(research: &[ResearchResult]) -> String {
        let mut sections = Vec::new();
        for source in ResearchSource::ALL {
            let documents: Vec<String> = research
                .iter()
                .filter(|r| r.source == source)
                .flat_map(|r| r.documents.iter())
                .map(|d| format!("- {} ({})\n{}", d.title, d.source_url, d.content))
                .collect();
            if !documents.is_empty() {
                sections.push(format!("{}:\n{}", source.as_str(), documents.join("\n\n")));
            }
        }

        if sections.is_empty() {
            "(no research was gathered)".to_string()
        } else {
            sections.join("\n\n")
        }
    }
}

#[async_trait]
impl VerdictProvider for LlmVerdictProvider {
    async fn judge(
        &self,
        statement: &str,
        research: &[ResearchResult],
    ) -> Result<Verdict, CheckError> {
        let contents = vec![
            Content::system(JUDGE_INSTRUCTIONS),
            Content::user(format!(
                "Statement:\n{}\n\nReferences:\n{}",
                statement,
                Self::format_research(research)
            )),
        ];

        let response = self
            .model
            .generate_content(
                &contents,
                Some(&self.config),
                Some(std::slice::from_ref(&*VERDICT_TOOL)),
            )
            .await
            .map_err(|e| CheckError::from_provider("verdict model", e))?;

        let (_, _, args) = response.first_function_call().ok_or_else(|| {
            CheckError::InvalidVerdict("model answered without recording a verdict".to_string())
        })?;

        serde_json::from_value(args.clone())
            .map_err(|e| CheckError::InvalidVerdict(format!("malformed verdict: {}", e)))
    }
}

/// Splits an article into standalone statements worth checking
pub struct StatementExtractor {
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl StatementExtractor {
    pub fn new(model: Arc<dyn Model>, temperature: Option<f32>) -> Self {
        Self {
            model,
            config: GenerationConfig {
                temperature,
                ..Default::default()
            },
        }
    }

    pub async fn extract(&self, article: &str) -> Result<Vec<String>, CheckError> {
        let contents = vec![
            Content::system(EXTRACTION_INSTRUCTIONS),
            Content::user(format!("Article:\n{}", article)),
        ];

        let response = self
            .model
            .generate_content(&contents, Some(&self.config), None)
            .await
            .map_err(|e| CheckError::from_provider("extraction model", e))?;

        let statements = Self::split_statements(&response.text());
        log::info!("Extracted {} statements", statements.len());
        Ok(statements)
    }

    fn split_statements(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    }
}
