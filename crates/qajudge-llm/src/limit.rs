//! A shared cap on in-flight calls to one model.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use qajudge_core::error::{QaError, Result};
use qajudge_core::message::Message;
use qajudge_core::model::{CallOptions, ChatModel, ChatResult};

/// Lets at most `limit` calls through to the inner model at once, however
/// many callers fan out above it.
pub struct ConcurrencyLimitedChatModel<M> {
    inner: M,
    permits: Arc<Semaphore>,
    limit: usize,
}

impl<M: ChatModel> ConcurrencyLimitedChatModel<M> {
    pub fn new(inner: M, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            inner,
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[async_trait]
impl<M: ChatModel> ChatModel for ConcurrencyLimitedChatModel<M> {
    async fn generate(&self, messages: &[Message], options: &CallOptions) -> Result<ChatResult> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| QaError::Other(format!("concurrency limiter closed: {e}")))?;
        self.inner.generate(messages, options).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
