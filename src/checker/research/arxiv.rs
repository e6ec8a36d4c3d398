// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};

use super::{http_client, send};
use crate::adk::error::{CheckError, ProviderError};
use crate::checker::config::ArxivConfig;
use crate::checker::provider::ResearchProvider;
use crate::checker::types::Document;

const PROVIDER: &str = "arxiv";
const ENDPOINT: &str = "https://export.arxiv.org/api/query";

/// Searches arXiv and returns the abstract of each matching paper
pub struct ArxivProvider {
    client: Client,
    max_docs: usize,
    feed: AtomFeed,
}

/// Just enough of an Atom reader for the arXiv export API
struct AtomFeed {
    entry: Regex,
    title: Regex,
    summary: Regex,
    id: Regex,
    whitespace: Regex,
}

impl AtomFeed {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            entry: Regex::new(r"(?s)<entry>(.*?)</entry>")?,
            title: Regex::new(r"(?s)<title[^>]*>(.*?)</title>")?,
            summary: Regex::new(r"(?s)<summary[^>]*>(.*?)</summary>")?,
            id: Regex::new(r"(?s)<id>(.*?)</id>")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    fn documents(&self, xml: &str, limit: usize) -> Vec<Document> {
        self.entry
            .captures_iter(xml)
            .filter_map(|entry| {
                let body = entry.get(1)?.as_str();
                let source_url = self.field(&self.id, body)?;
                Some(Document {
                    title: self.field(&self.title, body).unwrap_or_default(),
                    content: self.field(&self.summary, body).unwrap_or_default(),
                    source_url,
                })
            })
            .take(limit)
            .collect()
    }

    fn field(&self, pattern: &Regex, body: &str) -> Option<String> {
        let raw = pattern.captures(body)?.get(1)?.as_str();
        let text = self.whitespace.replace_all(raw.trim(), " ");
        Some(unescape_xml(&text))
    }
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

impl ArxivProvider {
    pub fn new(config: &ArxivConfig) -> Result<Self, CheckError> {
        let feed = AtomFeed::new()
            .map_err(|e| CheckError::config(format!("invalid feed pattern: {}", e)))?;

        Ok(Self {
            client: http_client()?,
            max_docs: config.max_docs,
            feed,
        })
    }

    fn request_url(&self, query: &str) -> Result<Url, CheckError> {
        let mut url = Url::parse(ENDPOINT)
            .map_err(|e| CheckError::config(format!("invalid arxiv endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("search_query", &format!("all:{}", query))
            .append_pair("start", "0")
            .append_pair("max_results", &self.max_docs.to_string());
        Ok(url)
    }
}

#[async_trait]
impl ResearchProvider for ArxivProvider {
    async fn fetch(&self, query: &str) -> Result<Vec<Document>, CheckError> {
        let request = self.client.get(self.request_url(query)?);
        let resp = send(PROVIDER, request)
            .await
            .map_err(|e| CheckError::from_provider(PROVIDER, e))?;

        let xml = resp
            .text()
            .await
            .map_err(|e| CheckError::from_provider(PROVIDER, ProviderError::Http(e)))?;

        Ok(self.feed.documents(&xml, self.max_docs))
    }
}
