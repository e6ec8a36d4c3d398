// SPDX-License-Identifier: MIT

//! HTTP research backends
//!
//! - [`WikipediaProvider`] - MediaWiki search with plain-text extracts
//! - [`ArxivProvider`] - arXiv export API (Atom feed)
//! - [`WebSearchProvider`] - Tavily web search
//!
//! All three implement [`ResearchProvider`](crate::checker::provider::ResearchProvider).
//! No hits is an empty `Vec`, never an error.

mod arxiv;
mod web;
mod wikipedia;

pub use arxiv::ArxivProvider;
pub use web::WebSearchProvider;
pub use wikipedia::WikipediaProvider;

use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

use crate::adk::error::{CheckError, ProviderError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("factcheck-rs/", env!("CARGO_PKG_VERSION"));

fn http_client() -> Result<Client, CheckError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| CheckError::config(format!("failed to build HTTP client: {}", e)))
}

/// Send a request, turning transport failures and non-success statuses into [`ProviderError`]
async fn send(provider: &str, request: RequestBuilder) -> Result<Response, ProviderError> {
    let resp = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(e)
        }
    })?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(ProviderError::upstream(provider, status.as_u16(), text));
    }
    Ok(resp)
}

/// Cut `text` to at most `max_chars` characters
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("Zürich", 2), "Zü");
        assert_eq!(truncate_chars("", 5), "");
    }
}
