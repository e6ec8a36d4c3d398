// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

use super::{http_client, send};
use crate::adk::error::{CheckError, ProviderError};
use crate::checker::config::WebConfig;
use crate::checker::provider::ResearchProvider;
use crate::checker::types::Document;

const PROVIDER: &str = "tavily";
const ENDPOINT: &str = "https://api.tavily.com/search";

/// Web search through the Tavily API
pub struct WebSearchProvider {
    client: Client,
    api_key: String,
    max_results: usize,
    exclude_domains: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    exclude_domains: &'a [String],
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

impl WebSearchProvider {
    /// Requires `TAVILY_API_KEY` environment variable to be set
    pub fn new(config: &WebConfig) -> Result<Self, CheckError> {
        let api_key = env::var("TAVILY_API_KEY")
            .map_err(|_| CheckError::config("TAVILY_API_KEY must be set"))?;
        Self::with_api_key(api_key, config)
    }

    pub fn with_api_key(
        api_key: impl Into<String>,
        config: &WebConfig,
    ) -> Result<Self, CheckError> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.into(),
            max_results: config.max_results,
            exclude_domains: config.exclude_domains.clone(),
        })
    }

    fn request_body<'a>(&'a self, query: &'a str) -> SearchRequest<'a> {
        SearchRequest {
            query,
            max_results: self.max_results,
            exclude_domains: &self.exclude_domains,
        }
    }

    fn into_documents(response: SearchResponse, limit: usize) -> Vec<Document> {
        response
            .results
            .into_iter()
            .take(limit)
            .map(|r| Document {
                title: r.title,
                source_url: r.url,
                content: r.content,
            })
            .collect()
    }
}

#[async_trait]
impl ResearchProvider for WebSearchProvider {
    async fn fetch(&self, query: &str) -> Result<Vec<Document>, CheckError> {
        let request = self
            .client
            .post(ENDPOINT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(query));

        let resp = send(PROVIDER, request)
            .await
            .map_err(|e| CheckError::from_provider(PROVIDER, e))?;

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| CheckError::from_provider(PROVIDER, ProviderError::Http(e)))?;

        Ok(Self::into_documents(body, self.max_results))
    }
}
