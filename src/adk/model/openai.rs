// SPDX-License-Identifier: MIT

//! OpenAI Model - chat completions API implementation

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::ProviderError;
use crate::adk::tool::ToolSpec;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::env;
use std::time::Duration;

const PROVIDER: &str = "openai";

/// OpenAI chat model implementation
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    /// Create a new OpenAIModel
    ///
    /// Requires `OPENAI_API_KEY` environment variable to be set.
    /// Optionally uses `OPENAI_BASE_URL` for custom endpoints.
    pub fn new(model_name: String) -> Result<Self, ProviderError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::Config("OPENAI_API_KEY must be set".to_string()))?;
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;

        Ok(Self {
            client,
            api_key,
            model_name,
            base_url,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Convert internal Content to OpenAI message format
    fn content_to_openai_message(content: &Content) -> serde_json::Value {
        let role = match content.role.as_str() {
            "system" => "system",
            "user" => "user",
            "model" => "assistant",
            other => other,
        };

        for part in &content.parts {
            if let Part::FunctionResponse { id, response, .. } = part {
                return json!({
                    "role": "tool",
                    "tool_call_id": id,
                    "content": serde_json::to_string(response).unwrap_or_default()
                });
            }
        }

        let mut tool_calls = Vec::new();
        let mut text_content = String::new();

        for part in &content.parts {
            match part {
                Part::Text(t) => text_content.push_str(t),
                Part::FunctionCall { id, name, args } => {
                    tool_calls.push(json!({
                        "id": id,
                        "type": "function",
                        "function": {
                            "name": name,
                            "arguments": serde_json::to_string(args).unwrap_or_default()
                        }
                    }));
                }
                Part::FunctionResponse { .. } => {}
            }
        }

        if !tool_calls.is_empty() {
            let content = if text_content.is_empty() {
                serde_json::Value::Null
            } else {
                json!(text_content)
            };
            json!({
                "role": role,
                "content": content,
                "tool_calls": tool_calls
            })
        } else {
            json!({
                "role": role,
                "content": text_content
            })
        }
    }

    /// Convert tool specs to OpenAI function format
    fn tools_to_openai_format(tools: &[ToolSpec]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.schema
                    }
                })
            })
            .collect()
    }

    /// Parse OpenAI response into Content
    fn parse_openai_response(response: &serde_json::Value) -> Result<Content, ProviderError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| {
                ProviderError::InvalidResponse("No choices in OpenAI response".to_string())
            })?;

        let message = &choice["message"];
        let mut parts = Vec::new();

        if let Some(content) = message["content"].as_str() {
            if !content.is_empty() {
                parts.push(Part::Text(content.to_string()));
            }
        }

        if let Some(tool_calls) = message["tool_calls"].as_array() {
            for tc in tool_calls {
                let id = tc["id"].as_str().unwrap_or_default().to_string();
                let name = tc["function"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let args_str = tc["function"]["arguments"].as_str().unwrap_or("{}");
                let args: serde_json::Value = serde_json::from_str(args_str).map_err(|e| {
                    ProviderError::InvalidResponse(format!(
                        "tool call '{}' has malformed arguments: {}",
                        name, e
                    ))
                })?;

                parts.push(Part::FunctionCall { id, name, args });
            }
        }

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[ToolSpec]>,
    ) -> Result<Content, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let messages: Vec<serde_json::Value> = history
            .iter()
            .map(Self::content_to_openai_message)
            .collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        let require_tool_call = config.is_some_and(|c| c.require_tool_call);

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }

        if let Some(tools) = tools {
            if !tools.is_empty() {
                body["tools"] = json!(Self::tools_to_openai_format(tools));
                body["tool_choice"] = if require_tool_call {
                    json!("required")
                } else {
                    json!("auto")
                };
            }
        }

        log::debug!(
            "OpenAI request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Http(e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::upstream(PROVIDER, status.as_u16(), text));
        }

        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("OpenAI response: {}", resp_json);

        Self::parse_openai_response(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_to_openai_system_message() {
        let msg = OpenAIModel::content_to_openai_message(&Content::system("You are a journalist"));
        assert_eq!(msg["role"], "system");
        assert_eq!(msg["content"], "You are a journalist");
    }

    #[test]
    fn test_content_to_openai_with_function_call() {
        let content = Content {
            role: "model".to_string(),
            parts: vec![Part::FunctionCall {
                id: "call_abc".to_string(),
                name: "search_wikipedia".to_string(),
                args: json!({"query": "Eiffel Tower height"}),
            }],
        };

        let msg = OpenAIModel::content_to_openai_message(&content);
        assert_eq!(msg["role"], "assistant");
        assert!(msg["content"].is_null());

        let tool_call = &msg["tool_calls"][0];
        assert_eq!(tool_call["id"], "call_abc");
        assert_eq!(tool_call["function"]["name"], "search_wikipedia");
    }

    #[test]
    fn test_function_response_keeps_call_id() {
        let content = Content {
            role: "tool".to_string(),
            parts: vec![Part::FunctionResponse {
                id: "call_abc".to_string(),
                name: "search_wikipedia".to_string(),
                response: json!([{"title": "Eiffel Tower"}]),
            }],
        };

        let msg = OpenAIModel::content_to_openai_message(&content);
        assert_eq!(msg["role"], "tool");
        assert_eq!(msg["tool_call_id"], "call_abc");
    }

    #[test]
    fn test_tools_to_openai_format() {
        let tools = vec![ToolSpec::new(
            "render_verdict",
            "Render a verdict",
            json!({"type": "object", "properties": {}}),
        )];
        let formatted = OpenAIModel::tools_to_openai_format(&tools);
        assert_eq!(formatted.len(), 1);
        assert_eq!(formatted[0]["type"], "function");
        assert_eq!(formatted[0]["function"]["name"], "render_verdict");
    }

    #[test]
    fn test_parse_openai_function_call_response() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "search_arxiv",
                            "arguments": "{\"query\": \"room temperature superconductor\"}"
                        }
                    }]
                }
            }]
        });

        let content = OpenAIModel::parse_openai_response(&response).unwrap();
        assert_eq!(content.parts.len(), 1);

        let (id, name, args) = content.first_function_call().unwrap();
        assert_eq!(id, "call_123");
        assert_eq!(name, "search_arxiv");
        assert_eq!(args["query"], "room temperature superconductor");
    }

    #[test]
    fn test_parse_malformed_arguments_is_error() {
        let response = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "call_1",
                        "function": { "name": "search_web", "arguments": "{not json" }
                    }]
                }
            }]
        });

        let err = OpenAIModel::parse_openai_response(&response).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_parse_empty_choices_is_error() {
        let err = OpenAIModel::parse_openai_response(&json!({"choices": []})).unwrap_err();
        assert!(err.to_string().contains("No choices"));
    }
}
