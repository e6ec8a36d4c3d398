// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{http_client, send, truncate_chars};
use crate::adk::error::{CheckError, ProviderError};
use crate::checker::config::WikipediaConfig;
use crate::checker::provider::ResearchProvider;
use crate::checker::types::Document;

const PROVIDER: &str = "wikipedia";

/// Searches Wikipedia and returns the lead section of each matching article
pub struct WikipediaProvider {
    client: Client,
    endpoint: Url,
    max_docs: usize,
    max_chars: usize,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<QueryBody>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    /// Search rank from the generator
    #[serde(default)]
    index: usize,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    fullurl: Option<String>,
}

impl WikipediaProvider {
    pub fn new(config: &WikipediaConfig) -> Result<Self, CheckError> {
        let endpoint = Url::parse(&format!("https://{}.wikipedia.org/w/api.php", config.language))
            .map_err(|e| {
                CheckError::config(format!(
                    "invalid wikipedia language '{}': {}",
                    config.language, e
                ))
            })?;

        Ok(Self {
            client: http_client()?,
            endpoint,
            max_docs: config.max_docs,
            max_chars: config.max_chars,
        })
    }

    fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("format", "json")
            .append_pair("formatversion", "2")
            .append_pair("generator", "search")
            .append_pair("gsrsearch", query)
            .append_pair("gsrlimit", &self.max_docs.to_string())
            .append_pair("prop", "extracts|info")
            .append_pair("exintro", "1")
            .append_pair("explaintext", "1")
            .append_pair("exlimit", "max")
            .append_pair("inprop", "url");
        url
    }

    fn parse_response(&self, body: ApiResponse) -> Result<Vec<Document>, ProviderError> {
        if let Some(error) = body.error {
            return Err(ProviderError::InvalidResponse(format!(
                "{}: {}",
                error.code, error.info
            )));
        }

        // MediaWiki omits `query` entirely when the search has no hits
        let mut pages = body.query.map(|q| q.pages).unwrap_or_default();
        pages.sort_by_key(|p| p.index);

        Ok(pages
            .into_iter()
            .take(self.max_docs)
            .map(|page| Document {
                source_url: page
                    .fullurl
                    .unwrap_or_else(|| self.article_url(&page.title)),
                content: truncate_chars(page.extract.trim(), self.max_chars),
                title: page.title,
            })
            .collect())
    }

    fn article_url(&self, title: &str) -> String {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.set_path(&format!("/wiki/{}", title.replace(' ', "_")));
        url.to_string()
    }
}

#[async_trait]
impl ResearchProvider for WikipediaProvider {
    async fn fetch(&self, query: &str) -> Result<Vec<Document>, CheckError> {
        let request = self.client.get(self.request_url(query));
        let resp = send(PROVIDER, request)
            .await
            .map_err(|e| CheckError::from_provider(PROVIDER, e))?;

        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| CheckError::from_provider(PROVIDER, ProviderError::Http(e)))?;

        self.parse_response(body)
            .map_err(|e| CheckError::from_provider(PROVIDER, e))
    }
}
