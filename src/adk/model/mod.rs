// SPDX-License-Identifier: MIT

//! Model module - defines the chat model trait and shared types
//!
//! Model implementations live in their own submodules:
//! - [openai] - OpenAI-compatible chat completions API

pub mod openai;

use crate::adk::error::ProviderError;
use crate::adk::tool::ToolSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    /// Force the model to answer with a tool call instead of free text
    #[serde(default)]
    pub require_tool_call: bool,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// All text parts, concatenated
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// First function call in this message, if any
    pub fn first_function_call(&self) -> Option<(&str, &str, &serde_json::Value)> {
        self.parts.iter().find_map(|part| match part {
            Part::FunctionCall { id, name, args } => Some((id.as_str(), name.as_str(), args)),
            _ => None,
        })
    }
}

/// Parts of a message - text, function calls, function responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Part {
    /// Regular text output
    Text(String),
    /// Function/tool call requested by the model
    FunctionCall {
        id: String,
        name: String,
        args: serde_json::Value,
    },
    /// Response to a function call, correlated by `id`
    FunctionResponse {
        id: String,
        name: String,
        response: serde_json::Value,
    },
}

/// Core trait for chat model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[ToolSpec]>,
    ) -> Result<Content, ProviderError>;
}
