// SPDX-License-Identifier: MIT

//! Bounded retry around a single node invocation

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::adk::error::{CheckError, WorkflowError};

/// Retry policy applied to every node invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff_ms: 250,
            backoff_multiplier: 2.0,
            max_backoff_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// A policy with no delay between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            backoff_multiplier: 1.0,
            max_backoff_ms: 0,
        }
    }

    /// Delay before retry number `attempt` (1-based count of failed attempts)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let base = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis(base.min(self.max_backoff_ms as f64) as u64)
    }

    /// Run `operation` until it succeeds, fails non-transiently, or the attempts run out.
    ///
    /// Only [`CheckError::is_retryable`] errors are retried. Exhaustion becomes
    /// [`WorkflowError::RetryExhausted`]; anything else propagates unchanged.
    /// `on_retry` is told about each failed attempt that will be retried.
    pub async fn run<F, Fut, T, R>(
        &self,
        node: &str,
        mut on_retry: R,
        operation: F,
    ) -> Result<T, CheckError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, CheckError>>,
        R: FnMut(u32, &CheckError),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    log::error!(
                        "Node {} exhausted {} attempts: {}",
                        node,
                        max_attempts,
                        e
                    );
                    return Err(WorkflowError::RetryExhausted {
                        node: node.to_string(),
                        attempts: max_attempts,
                        last_error: e.to_string(),
                    }
                    .into());
                }
                Err(e) => {
                    let delay = self.backoff(attempt);
                    log::warn!(
                        "Node {} attempt {}/{} failed ({}), retrying in {:?}",
                        node,
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    on_retry(attempt, &e);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> CheckError {
        CheckError::TransientProvider {
            provider: "web".to_string(),
            message: "503".to_string(),
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 2);
    }

    #[test]
    fn test_backoff_exponential_and_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff_ms: 100,
            backoff_multiplier: 2.0,
            max_backoff_ms: 300,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(300));
        assert_eq!(policy.backoff(4), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let mut retries = Vec::new();

        let result = RetryPolicy::immediate(2)
            .run(
                "wikipedia",
                |attempt, _| retries.push(attempt),
                move || async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(transient())
                    } else {
                        Ok(42)
                    }
                },
            )
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(retries, vec![1]);
    }

    #[tokio::test]
    async fn test_exhaustion_becomes_workflow_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = RetryPolicy::immediate(2)
            .run("web", |_, _| {}, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match result.unwrap_err() {
            CheckError::Workflow(WorkflowError::RetryExhausted { node, attempts, .. }) => {
                assert_eq!(node, "web");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_transient_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = RetryPolicy::immediate(3)
            .run("supervisor", |_, _| {}, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CheckError::invalid_decision("search_reddit"))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(CheckError::InvalidDecision(_))));
    }
}
