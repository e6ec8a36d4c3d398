// SPDX-License-Identifier: MIT

//! Typed error handling for factcheck-rs
//!
//! Two layers of errors live here:
//! - [`ProviderError`] is what a single external call (model, research backend)
//!   reports. It knows whether the failure is transient.
//! - [`CheckError`] is what the workflow engine returns to its caller. Node-local
//!   transient failures are retried and only surface here once the retry budget
//!   is spent.

use thiserror::Error;

/// Failure of a single call to an external provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The call did not complete in time
    #[error("request timed out")]
    Timeout,

    /// The provider asked us to slow down
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The provider answered with a non-success status
    #[error("API error from {provider} (status {status}): {message}")]
    Upstream {
        provider: String,
        status: u16,
        message: String,
    },

    /// Transport-level HTTP errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The provider answered, but not with something we can use
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Missing API key or similar setup problem
    #[error("configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Build an upstream error from an HTTP status and body
    pub fn upstream(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        if status == 429 {
            return Self::RateLimited {
                retry_after_secs: None,
            };
        }
        Self::Upstream {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Timeouts, rate limits, 5xx responses and connection failures are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout | ProviderError::RateLimited { .. } => true,
            ProviderError::Upstream { status, .. } => *status >= 500,
            ProviderError::Http(e) => e.is_timeout() || e.is_connect(),
            ProviderError::InvalidResponse(_) | ProviderError::Config(_) => false,
        }
    }
}

/// Top-level error type for a fact-check run
#[derive(Debug, Error)]
pub enum CheckError {
    /// Retryable provider failure (timeout, 5xx, rate limit)
    #[error("transient failure from {provider}: {message}")]
    TransientProvider { provider: String, message: String },

    /// Non-retryable provider failure
    #[error("provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    /// A decision named an action outside the allowed set, or carried malformed arguments
    #[error("invalid decision: {0}")]
    InvalidDecision(String),

    /// A verdict violated its invariants
    #[error("invalid verdict: {0}")]
    InvalidVerdict(String),

    /// The router was handed a key it has no edge for
    #[error("routing configuration error: {0}")]
    RoutingConfiguration(String),

    /// Run-level failures
    #[error("workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Configuration errors (invalid values, unreadable files)
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Run-level failures raised by the engine itself
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A node kept failing transiently until its attempts ran out
    #[error("node '{node}' failed after {attempts} attempts: {last_error}")]
    RetryExhausted {
        node: String,
        attempts: u32,
        last_error: String,
    },

    /// Defensive ceiling on node invocations per run
    #[error("max iterations reached: {limit}")]
    MaxIterations { limit: usize },

    /// The caller cancelled the run
    #[error("run cancelled")]
    Cancelled,

    /// The workflow terminated without a verdict on the blackboard
    #[error("workflow finished without a verdict")]
    MissingVerdict,
}

impl CheckError {
    /// Wrap a provider failure, preserving whether it may be retried
    pub fn from_provider(provider: impl Into<String>, err: ProviderError) -> Self {
        let provider = provider.into();
        if err.is_transient() {
            Self::TransientProvider {
                provider,
                message: err.to_string(),
            }
        } else {
            Self::Provider {
                provider,
                message: err.to_string(),
            }
        }
    }

    /// Create an invalid decision error
    pub fn invalid_decision(message: impl Into<String>) -> Self {
        Self::InvalidDecision(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Only transient provider failures are retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckError::TransientProvider { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Timeout.is_transient());
        assert!(ProviderError::RateLimited {
            retry_after_secs: Some(3)
        }
        .is_transient());
        assert!(ProviderError::upstream("openai", 503, "unavailable").is_transient());
        assert!(!ProviderError::upstream("openai", 400, "bad request").is_transient());
        assert!(!ProviderError::InvalidResponse("no choices".into()).is_transient());
        assert!(!ProviderError::Config("missing key".into()).is_transient());
    }

    #[test]
    fn test_429_maps_to_rate_limit() {
        let err = ProviderError::upstream("tavily", 429, "slow down");
        assert!(matches!(err, ProviderError::RateLimited { .. }));
    }

    #[test]
    fn test_from_provider_preserves_retryability() {
        let transient = CheckError::from_provider("wikipedia", ProviderError::Timeout);
        assert!(transient.is_retryable());

        let fatal = CheckError::from_provider(
            "wikipedia",
            ProviderError::InvalidResponse("garbage".into()),
        );
        assert!(!fatal.is_retryable());
        assert!(fatal.to_string().contains("wikipedia"));
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(!CheckError::invalid_decision("bogus").is_retryable());
        assert!(!CheckError::RoutingConfiguration("x".into()).is_retryable());
        assert!(!CheckError::Workflow(WorkflowError::Cancelled).is_retryable());
    }
}
