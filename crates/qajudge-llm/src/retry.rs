//! Bounded retry around a [`ChatModel`] for transient upstream failures.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use qajudge_core::error::{ModelError, QaError, Result};
use qajudge_core::message::Message;
use qajudge_core::model::{CallOptions, ChatModel, ChatResult};

/// How many extra attempts to make, and how long to wait between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first. Zero disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32, error: &ModelError) -> Duration {
        let delay = match error {
            ModelError::RateLimited {
                retry_after_secs: Some(secs),
            } => Duration::from_secs(*secs),
            _ => self
                .base_delay
                .saturating_mul(1u32 << attempt.saturating_sub(1).min(16)),
        };
        delay.min(self.max_delay)
    }
}

/// Wraps a model and retries retryable [`ModelError`]s.
///
/// Errors outside the upstream taxonomy are returned immediately.
pub struct RetryingChatModel<M> {
    inner: M,
    policy: RetryPolicy,
}

impl<M: ChatModel> RetryingChatModel<M> {
    pub fn new(inner: M, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<M: ChatModel> ChatModel for RetryingChatModel<M> {
    async fn generate(&self, messages: &[Message], options: &CallOptions) -> Result<ChatResult> {
        let mut retries = 0;
        loop {
            match self.inner.generate(messages, options).await {
                Ok(result) => return Ok(result),
                Err(QaError::Model(e)) if e.is_retryable() && retries < self.policy.max_retries => {
                    retries += 1;
                    let backoff = self.policy.backoff(retries, &e);
                    warn!(
                        error = %e,
                        model = self.inner.model_name(),
                        retry = retries,
                        max_retries = self.policy.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying generation request"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
