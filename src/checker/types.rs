// SPDX-License-Identifier: MIT

//! Domain types for a fact-check run
//!
//! These are in-memory structures only. They derive serde so the HTTP layer
//! and the model providers can (de)serialize them, but no wire format is owned
//! here.

use crate::adk::error::CheckError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Which research backend produced a result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResearchSource {
    Wikipedia,
    Arxiv,
    Web,
}

impl ResearchSource {
    pub const ALL: [ResearchSource; 3] = [
        ResearchSource::Wikipedia,
        ResearchSource::Arxiv,
        ResearchSource::Web,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchSource::Wikipedia => "wikipedia",
            ResearchSource::Arxiv => "arxiv",
            ResearchSource::Web => "web",
        }
    }

    /// The supervisor action that triggers this source
    pub fn action(&self) -> Action {
        match self {
            ResearchSource::Wikipedia => Action::SearchWikipedia,
            ResearchSource::Arxiv => Action::SearchArxiv,
            ResearchSource::Web => Action::SearchWeb,
        }
    }
}

/// A single retrieved document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub title: String,
    pub source_url: String,
    pub content: String,
}

/// Documents returned by one research call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchResult {
    pub source: ResearchSource,
    pub documents: Vec<Document>,
}

/// Verdict labels, from most to least accurate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerdictLabel {
    #[serde(rename = "True")]
    True,
    #[serde(rename = "Mostly True")]
    MostlyTrue,
    #[serde(rename = "Uncertain")]
    Uncertain,
    #[serde(rename = "Mostly False")]
    MostlyFalse,
    #[serde(rename = "False")]
    False,
}

impl VerdictLabel {
    pub const ALL: [VerdictLabel; 5] = [
        VerdictLabel::True,
        VerdictLabel::MostlyTrue,
        VerdictLabel::Uncertain,
        VerdictLabel::MostlyFalse,
        VerdictLabel::False,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::True => "True",
            VerdictLabel::MostlyTrue => "Mostly True",
            VerdictLabel::Uncertain => "Uncertain",
            VerdictLabel::MostlyFalse => "Mostly False",
            VerdictLabel::False => "False",
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference that supports a verdict
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reference {
    pub title: String,
    #[serde(alias = "source")]
    pub source_url: String,
    pub summary: String,
}

/// The outcome of a fact-check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    #[serde(alias = "verdict")]
    pub label: VerdictLabel,
    pub explanation: String,
    #[serde(default)]
    pub references: Vec<Reference>,
}

impl Verdict {
    /// Check the verdict invariants: a non-empty explanation, and an absolute
    /// http(s) URL on every reference.
    pub fn validate(&self) -> Result<(), CheckError> {
        if self.explanation.trim().is_empty() {
            return Err(CheckError::InvalidVerdict(
                "explanation must not be empty".to_string(),
            ));
        }

        for reference in &self.references {
            let parsed = url::Url::parse(&reference.source_url).map_err(|e| {
                CheckError::InvalidVerdict(format!(
                    "reference '{}' has unresolvable source URL '{}': {}",
                    reference.title, reference.source_url, e
                ))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(CheckError::InvalidVerdict(format!(
                    "reference '{}' uses unsupported scheme '{}'",
                    reference.title,
                    parsed.scheme()
                )));
            }
        }

        Ok(())
    }
}

/// The closed set of actions the supervisor may choose from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SearchWikipedia,
    SearchArxiv,
    SearchWeb,
    RenderVerdict,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::SearchWikipedia,
        Action::SearchArxiv,
        Action::SearchWeb,
        Action::RenderVerdict,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Action::SearchWikipedia => "search_wikipedia",
            Action::SearchArxiv => "search_arxiv",
            Action::SearchWeb => "search_web",
            Action::RenderVerdict => "render_verdict",
        }
    }

    /// Parse an action name. Anything outside the closed set is an invalid decision.
    pub fn parse(name: &str) -> Result<Self, CheckError> {
        Action::ALL
            .into_iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| {
                CheckError::invalid_decision(format!(
                    "unknown action '{}', expected one of: {}",
                    name,
                    Action::ALL.map(|a| a.name()).join(", ")
                ))
            })
    }

    /// The research backend behind a search action
    pub fn research_source(&self) -> Option<ResearchSource> {
        match self {
            Action::SearchWikipedia => Some(ResearchSource::Wikipedia),
            Action::SearchArxiv => Some(ResearchSource::Arxiv),
            Action::SearchWeb => Some(ResearchSource::Web),
            Action::RenderVerdict => None,
        }
    }
}

/// A structured choice returned by a decision provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    /// Correlates later tool results and review notes with this decision
    pub call_id: String,
    /// The chosen action, as named by the provider (validated by the caller)
    pub action: String,
    /// Action arguments
    #[serde(default)]
    pub arguments: Value,
}

impl Decision {
    pub fn new(action: impl Into<String>, arguments: Value) -> Self {
        Self {
            call_id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            action: action.into(),
            arguments,
        }
    }

    /// The `query` argument of a search decision
    pub fn query(&self) -> Option<&str> {
        self.arguments
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// The reviewer's routing vote
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReviewDecision {
    Improve,
    Finish,
}

impl ReviewDecision {
    pub const IMPROVE: &'static str = "Improve";
    pub const FINISH: &'static str = "FINISH";

    pub fn parse(vote: &str) -> Result<Self, CheckError> {
        match vote.trim() {
            v if v.eq_ignore_ascii_case(Self::IMPROVE) => Ok(ReviewDecision::Improve),
            v if v.eq_ignore_ascii_case(Self::FINISH) => Ok(ReviewDecision::Finish),
            other => Err(CheckError::invalid_decision(format!(
                "unknown review decision '{}', expected '{}' or '{}'",
                other,
                Self::IMPROVE,
                Self::FINISH
            ))),
        }
    }
}

/// An entry in the append-only message log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// The claim under investigation; always the first entry
    Statement { text: String },
    /// A supervisor decision, recorded verbatim
    Decision(Decision),
    /// Output of a research node
    ToolResult {
        name: String,
        payload: Value,
        correlation_id: String,
    },
    /// Reviewer commentary, correlated with the decision that led to the verdict
    ReviewNote { text: String, correlation_id: String },
}

impl Message {
    /// Decode a research tool result back into a typed `ResearchResult`
    pub fn as_research(&self) -> Option<ResearchResult> {
        let Message::ToolResult { name, payload, .. } = self else {
            return None;
        };
        let action = Action::parse(name).ok()?;
        let source = action.research_source()?;
        let documents: Vec<Document> = serde_json::from_value(payload.clone()).ok()?;
        Some(ResearchResult { source, documents })
    }

    /// Short label for logs and traces
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Statement { .. } => "statement",
            Message::Decision(_) => "decision",
            Message::ToolResult { .. } => "tool_result",
            Message::ReviewNote { .. } => "review_note",
        }
    }
}
